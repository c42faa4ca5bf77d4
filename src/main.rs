use std::path::PathBuf;
use std::process;

use anyhow::Result;
use clap::Parser;
use owo_colors::{OwoColorize, Stream};

use benchrun::aggregate;
use benchrun::discover;
use benchrun::errors::HarnessError;
use benchrun::execute;
use benchrun::parse;
use benchrun::probe;
use benchrun::report;
use benchrun::types::{CompletedRun, RunReport};

#[derive(Parser)]
#[command(
    name = "benchrun",
    version,
    about = "Run benchmark executables and generate comparison reports"
)]
struct Cli {
    /// Directory containing benchmark executables
    #[arg(short = 'b', long, default_value = "build")]
    build_dir: PathBuf,

    /// Output directory for results and charts
    #[arg(short = 'o', long, default_value = "benchmark_results")]
    output_dir: PathBuf,

    /// Regex pattern to filter benchmarks by file name
    #[arg(short = 'B', long = "benchmarks")]
    pattern: Option<String>,

    /// Only write the raw JSON snapshot, skip chart and report generation
    #[arg(long)]
    json_only: bool,
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    let pattern = match &cli.pattern {
        Some(p) => Some(regex::Regex::new(p).map_err(|err| HarnessError::InvalidPattern {
            pattern: p.clone(),
            detail: err.to_string(),
        })?),
        None => None,
    };

    println!(
        "{}",
        "Gathering machine information..."
            .if_supports_color(Stream::Stdout, |s| s.dimmed())
    );
    let environment = probe::probe();
    println!(
        "  CPU: {}",
        environment.cpu_model.as_deref().unwrap_or("unknown")
    );
    println!(
        "  Cores: {}",
        environment
            .cpu_cores
            .map(|n| n.to_string())
            .unwrap_or_else(|| "unknown".to_string())
    );
    println!(
        "  Memory: {} GB",
        environment
            .memory_gb
            .map(|m| m.to_string())
            .unwrap_or_else(|| "unknown".to_string())
    );
    println!();

    let executables = discover::discover(&cli.build_dir, pattern.as_ref());
    if executables.is_empty() {
        return Err(HarnessError::NoBenchmarksFound { dir: cli.build_dir }.into());
    }

    println!("Found {} benchmark(s):", executables.len());
    for exec in &executables {
        println!("  - {}", exec.file_name());
    }
    println!();

    // Strictly sequential: running two benchmarks at once would contend for
    // the host and invalidate both measurements.
    let mut runs = Vec::new();
    for exec in &executables {
        println!("Running: {}...", exec.file_name());
        let outcome = execute::execute(exec);
        let parsed = parse::parse_outcome(exec, &outcome);

        if outcome.success {
            println!(
                "  {} {}",
                "✓".if_supports_color(Stream::Stdout, |s| s.green()),
                exec.file_name()
            );
        } else {
            let reason: String = outcome
                .error
                .as_deref()
                .unwrap_or("unknown error")
                .chars()
                .take(50)
                .collect();
            println!(
                "  {} {}: {}",
                "✗".if_supports_color(Stream::Stdout, |s| s.red()),
                exec.file_name(),
                reason
            );
        }

        runs.push(CompletedRun { outcome, parsed });
    }

    let dataset = aggregate::aggregate(&runs);
    let run_report = RunReport {
        environment,
        runs,
        dataset,
    };

    std::fs::create_dir_all(&cli.output_dir).map_err(|err| HarnessError::OutputDir {
        path: cli.output_dir.clone(),
        source: err,
    })?;

    let snapshot_path = report::write_snapshot(&run_report, &cli.output_dir)?;
    println!("\nSaved raw results to: {}", snapshot_path.display());

    if !cli.json_only {
        if run_report.dataset.is_empty() {
            eprintln!(
                "No benchmark data to plot (benchmarks may not emit the expected JSON format)"
            );
        } else if let Err(err) = generate_artifacts(&run_report, &cli.output_dir) {
            // The snapshot is already durable; losing a chart or the
            // markdown is a diagnostic, not a failed invocation.
            eprintln!("Skipping report artifacts: {}", err);
        }
    }

    Ok(())
}

fn generate_artifacts(run_report: &RunReport, output_dir: &std::path::Path) -> Result<()> {
    let charts = report::write_charts(&run_report.dataset, output_dir)?;
    for chart in &charts {
        println!("Generated: {}", chart.display());
    }
    let md = report::write_markdown(run_report, output_dir)?;
    println!("Generated report: {}", md.display());
    Ok(())
}

fn main() {
    if let Err(err) = run() {
        eprintln!("{}", err);
        process::exit(1);
    }
}
