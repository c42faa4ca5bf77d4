use std::process::Command;

use chrono::Utc;
use regex::Regex;
use serde::Serialize;

/// Immutable snapshot of the host machine taken at startup.
///
/// Optional fields are absent when the corresponding platform lookup fails.
/// A partial record is normal; probing never fails the run.
#[derive(Debug, Clone, Serialize)]
pub struct EnvironmentRecord {
    pub timestamp: String,
    pub platform: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform_version: Option<String>,
    pub architecture: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cpu_model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cpu_cores: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memory_gb: Option<f64>,
    pub harness_version: String,
}

/// Gather host information for benchmark context. Total function — every
/// lookup that fails just leaves its field unset.
pub fn probe() -> EnvironmentRecord {
    let strategy = platform_probe();
    EnvironmentRecord {
        timestamp: Utc::now().to_rfc3339(),
        platform: std::env::consts::OS.to_string(),
        platform_version: strategy.os_version(),
        architecture: std::env::consts::ARCH.to_string(),
        cpu_model: strategy.cpu_model(),
        cpu_cores: strategy.cpu_cores(),
        memory_gb: strategy.memory_gb(),
        harness_version: env!("CARGO_PKG_VERSION").to_string(),
    }
}

/// Per-platform lookup strategy. Each method is independently tolerant of
/// failure — a missing pseudo-file or failed subprocess yields `None`, never
/// an error for the whole record.
trait PlatformProbe {
    fn cpu_model(&self) -> Option<String>;
    fn cpu_cores(&self) -> Option<usize>;
    fn memory_gb(&self) -> Option<f64>;
    fn os_version(&self) -> Option<String>;
}

fn platform_probe() -> Box<dyn PlatformProbe> {
    if cfg!(target_os = "linux") {
        Box::new(LinuxProbe)
    } else if cfg!(target_os = "macos") {
        Box::new(DarwinProbe)
    } else if cfg!(target_os = "windows") {
        Box::new(WindowsProbe)
    } else {
        Box::new(GenericProbe)
    }
}

/// Reads `/proc/cpuinfo`, `/proc/meminfo`, and the kernel release
/// pseudo-file.
struct LinuxProbe;

impl PlatformProbe for LinuxProbe {
    fn cpu_model(&self) -> Option<String> {
        let cpuinfo = std::fs::read_to_string("/proc/cpuinfo").ok()?;
        parse_model_name(&cpuinfo)
    }

    fn cpu_cores(&self) -> Option<usize> {
        let cpuinfo = std::fs::read_to_string("/proc/cpuinfo").ok()?;
        count_processors(&cpuinfo)
    }

    fn memory_gb(&self) -> Option<f64> {
        let meminfo = std::fs::read_to_string("/proc/meminfo").ok()?;
        parse_mem_total_gb(&meminfo)
    }

    fn os_version(&self) -> Option<String> {
        let release = std::fs::read_to_string("/proc/sys/kernel/osrelease").ok()?;
        let trimmed = release.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    }
}

/// Shells out to `sysctl -n` for each value.
struct DarwinProbe;

impl PlatformProbe for DarwinProbe {
    fn cpu_model(&self) -> Option<String> {
        command_stdout("sysctl", &["-n", "machdep.cpu.brand_string"])
    }

    fn cpu_cores(&self) -> Option<usize> {
        command_stdout("sysctl", &["-n", "hw.ncpu"])?.parse().ok()
    }

    fn memory_gb(&self) -> Option<f64> {
        let bytes: u64 = command_stdout("sysctl", &["-n", "hw.memsize"])?.parse().ok()?;
        Some(round1(bytes as f64 / 1024.0 / 1024.0 / 1024.0))
    }

    fn os_version(&self) -> Option<String> {
        command_stdout("sysctl", &["-n", "kern.osrelease"])
    }
}

/// Registry query for the CPU name, `wmic` for physical memory. Core count
/// falls back to the generic OS-reported value.
struct WindowsProbe;

impl PlatformProbe for WindowsProbe {
    fn cpu_model(&self) -> Option<String> {
        let output = command_stdout(
            "reg",
            &[
                "query",
                r"HKLM\HARDWARE\DESCRIPTION\System\CentralProcessor\0",
                "/v",
                "ProcessorNameString",
            ],
        )?;
        parse_reg_sz(&output)
    }

    fn cpu_cores(&self) -> Option<usize> {
        std::thread::available_parallelism().ok().map(|n| n.get())
    }

    fn memory_gb(&self) -> Option<f64> {
        let output = command_stdout("wmic", &["computersystem", "get", "totalphysicalmemory"])?;
        parse_wmic_memory(&output)
    }

    fn os_version(&self) -> Option<String> {
        None
    }
}

/// Fallback for unrecognized platforms: only the core count is knowable.
struct GenericProbe;

impl PlatformProbe for GenericProbe {
    fn cpu_model(&self) -> Option<String> {
        None
    }

    fn cpu_cores(&self) -> Option<usize> {
        std::thread::available_parallelism().ok().map(|n| n.get())
    }

    fn memory_gb(&self) -> Option<f64> {
        None
    }

    fn os_version(&self) -> Option<String> {
        None
    }
}

/// Run a command and return trimmed stdout, or `None` on spawn failure or
/// non-zero exit.
fn command_stdout(program: &str, args: &[&str]) -> Option<String> {
    let output = Command::new(program).args(args).output().ok()?;
    if !output.status.success() {
        return None;
    }
    let text = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if text.is_empty() { None } else { Some(text) }
}

/// First `model name : ...` value in /proc/cpuinfo text.
fn parse_model_name(cpuinfo: &str) -> Option<String> {
    let re = Regex::new(r"model name\s*:\s*(.+)").ok()?;
    re.captures(cpuinfo)
        .map(|caps| caps[1].trim().to_string())
}

/// Number of `processor : N` marker lines in /proc/cpuinfo text.
fn count_processors(cpuinfo: &str) -> Option<usize> {
    let re = Regex::new(r"(?m)^processor\s*:").ok()?;
    let count = re.find_iter(cpuinfo).count();
    if count == 0 { None } else { Some(count) }
}

/// `MemTotal` kilobyte value from /proc/meminfo, converted to GiB rounded
/// to one decimal.
fn parse_mem_total_gb(meminfo: &str) -> Option<f64> {
    let re = Regex::new(r"MemTotal:\s*(\d+)").ok()?;
    let kb: u64 = re.captures(meminfo)?[1].parse().ok()?;
    Some(round1(kb as f64 / 1024.0 / 1024.0))
}

/// Value from a `reg query` REG_SZ result line.
fn parse_reg_sz(output: &str) -> Option<String> {
    for line in output.lines() {
        if let Some(idx) = line.find("REG_SZ") {
            let value = line[idx + "REG_SZ".len()..].trim();
            if !value.is_empty() {
                return Some(value.to_string());
            }
        }
    }
    None
}

/// Byte count from `wmic computersystem get totalphysicalmemory` output
/// (header line, then the value), converted to GiB rounded to one decimal.
fn parse_wmic_memory(output: &str) -> Option<f64> {
    let bytes: u64 = output
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty() && line.chars().all(|c| c.is_ascii_digit()))?
        .parse()
        .ok()?;
    Some(round1(bytes as f64 / 1024.0 / 1024.0 / 1024.0))
}

fn round1(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}
