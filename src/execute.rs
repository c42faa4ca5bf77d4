use std::io::Read;
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

use crate::types::{ExecutableRef, RunOutcome};

/// Machine-readable output flag passed to every benchmark executable.
pub const FORMAT_FLAG: &str = "--benchmark_format=json";

/// Hard wall-clock budget per benchmark.
pub const RUN_TIMEOUT: Duration = Duration::from_secs(600);

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Run one benchmark under the default timeout.
pub fn execute(exec: &ExecutableRef) -> RunOutcome {
    execute_with_timeout(exec, RUN_TIMEOUT)
}

/// Run one benchmark, capturing stdout and stderr separately, and classify
/// the outcome:
///
/// - launch failure → `success=false`, `error` = OS error text;
/// - timeout → `success=false`, fixed timeout message, child killed and
///   reaped before returning;
/// - non-zero exit → `success=false`, `error` = captured stderr;
/// - zero exit → `success=true`.
///
/// Never panics and never aborts the batch — a failed run is just a record.
pub fn execute_with_timeout(exec: &ExecutableRef, timeout: Duration) -> RunOutcome {
    let name = exec.file_name();

    let mut child = match Command::new(&exec.path)
        .arg(FORMAT_FLAG)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
    {
        Ok(child) => child,
        Err(err) => {
            return RunOutcome {
                name,
                success: false,
                stdout: String::new(),
                stderr: String::new(),
                error: Some(err.to_string()),
            };
        }
    };

    // Drain both pipes on background threads so a chatty child cannot
    // deadlock against a full pipe buffer while we poll for exit.
    let stdout_thread = spawn_reader(child.stdout.take());
    let stderr_thread = spawn_reader(child.stderr.take());

    let deadline = Instant::now() + timeout;
    let status = loop {
        match child.try_wait() {
            Ok(Some(status)) => break Ok(status),
            Ok(None) => {
                if Instant::now() >= deadline {
                    let _ = child.kill();
                    let _ = child.wait();
                    break Err(format!("Timeout after {} seconds", timeout.as_secs()));
                }
                std::thread::sleep(POLL_INTERVAL);
            }
            Err(err) => {
                let _ = child.kill();
                let _ = child.wait();
                break Err(format!("Wait failed: {}", err));
            }
        }
    };

    // The readers finish once the child's ends of the pipes close (normal
    // exit or kill), so these joins cannot hang.
    let stdout = stdout_thread.join().unwrap_or_default();
    let stderr = stderr_thread.join().unwrap_or_default();

    match status {
        Ok(status) if status.success() => RunOutcome {
            name,
            success: true,
            stdout,
            stderr,
            error: None,
        },
        Ok(_) => RunOutcome {
            name,
            success: false,
            error: Some(stderr.clone()),
            stdout,
            stderr,
        },
        Err(message) => RunOutcome {
            name,
            success: false,
            stdout,
            stderr,
            error: Some(message),
        },
    }
}

fn spawn_reader<R: Read + Send + 'static>(pipe: Option<R>) -> std::thread::JoinHandle<String> {
    std::thread::spawn(move || {
        let mut buf = String::new();
        if let Some(mut pipe) = pipe {
            let _ = pipe.read_to_string(&mut buf);
        }
        buf
    })
}
