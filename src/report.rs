use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::errors::HarnessError;
use crate::probe::EnvironmentRecord;
use crate::types::{AggregatedDataset, BenchmarkCaseRecord, RunOutcome, RunReport};

/// File names the sink produces in the output directory.
pub const SNAPSHOT_FILE: &str = "benchmark_results.json";
pub const MARKDOWN_FILE: &str = "benchmark_report.md";

/// Shape of the raw results file: the environment record plus every run
/// outcome in execution order, including failures.
#[derive(Serialize)]
struct Snapshot<'a> {
    machine_info: &'a EnvironmentRecord,
    results: Vec<&'a RunOutcome>,
}

/// Write the durable raw snapshot, pretty-printed for human inspection.
/// The write is atomic: a temp file in the same directory is renamed into
/// place, so a crash mid-write never leaves a truncated snapshot.
pub fn write_snapshot(report: &RunReport, out_dir: &Path) -> Result<PathBuf, HarnessError> {
    let path = out_dir.join(SNAPSHOT_FILE);
    let snapshot = Snapshot {
        machine_info: &report.environment,
        results: report.runs.iter().map(|r| &r.outcome).collect(),
    };
    let json = serde_json::to_string_pretty(&snapshot)
        .map_err(|err| HarnessError::ArtifactWrite {
            path: path.clone(),
            source: std::io::Error::other(err),
        })?;
    write_atomic(&path, &json).map_err(|err| HarnessError::ArtifactWrite {
        path: path.clone(),
        source: err,
    })?;
    Ok(path)
}

/// Write one SVG comparison chart per suite, named `{suite}_chart.svg`.
/// Returns the paths written; an empty dataset writes nothing.
pub fn write_charts(
    dataset: &AggregatedDataset,
    out_dir: &Path,
) -> Result<Vec<PathBuf>, HarnessError> {
    let mut written = Vec::new();
    for (suite, cases) in dataset.suite_view() {
        let path = out_dir.join(format!("{}_chart.svg", suite));
        let svg = render_chart(suite, &cases);
        fs::write(&path, svg).map_err(|err| HarnessError::ArtifactWrite {
            path: path.clone(),
            source: err,
        })?;
        written.push(path);
    }
    Ok(written)
}

/// Write the narrative markdown report: machine information, run counts,
/// one table per suite (ascending by real time) with its chart referenced
/// by relative name, and a failure appendix quoting each error verbatim.
pub fn write_markdown(report: &RunReport, out_dir: &Path) -> Result<PathBuf, HarnessError> {
    let path = out_dir.join(MARKDOWN_FILE);
    let contents = render_markdown(report);
    fs::write(&path, contents).map_err(|err| HarnessError::ArtifactWrite {
        path: path.clone(),
        source: err,
    })?;
    Ok(path)
}

fn write_atomic(path: &Path, contents: &str) -> std::io::Result<()> {
    let tmp = path.with_extension("tmp");
    fs::write(&tmp, contents)?;
    fs::rename(&tmp, path)
}

// ---------------------------------------------------------------------------
// Chart rendering
// ---------------------------------------------------------------------------

const CHART_WIDTH: usize = 800;
const ROW_HEIGHT: usize = 28;
const LABEL_WIDTH: usize = 280;
const TOP_MARGIN: usize = 48;
const VALUE_GUTTER: usize = 110;

/// Horizontal bar chart of a suite's cases, ascending by real time (the
/// view already delivers them sorted). Hand-formatted SVG keeps the sink
/// free of heavyweight rendering dependencies.
fn render_chart(suite: &str, cases: &[&BenchmarkCaseRecord]) -> String {
    let bar_area = CHART_WIDTH - LABEL_WIDTH - VALUE_GUTTER;
    let height = TOP_MARGIN + cases.len() * ROW_HEIGHT + 40;
    let max_time = cases
        .iter()
        .map(|c| c.real_time)
        .fold(f64::MIN, f64::max)
        .max(f64::MIN_POSITIVE);
    let unit = cases.first().map(|c| c.time_unit.as_str()).unwrap_or("ns");

    let mut svg = String::new();
    let _ = writeln!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{}" height="{}" font-family="sans-serif">"#,
        CHART_WIDTH, height
    );
    let _ = writeln!(
        svg,
        r#"  <rect width="{}" height="{}" fill="white"/>"#,
        CHART_WIDTH, height
    );
    let _ = writeln!(
        svg,
        r#"  <text x="{}" y="28" font-size="16" font-weight="bold" text-anchor="middle">{} Benchmark Results</text>"#,
        CHART_WIDTH / 2,
        xml_escape(suite)
    );

    for (i, case) in cases.iter().enumerate() {
        let y = TOP_MARGIN + i * ROW_HEIGHT;
        let bar_w = ((case.real_time / max_time) * bar_area as f64).max(1.0) as usize;
        let _ = writeln!(
            svg,
            r#"  <text x="{}" y="{}" font-size="12" text-anchor="end">{}</text>"#,
            LABEL_WIDTH - 8,
            y + ROW_HEIGHT / 2 + 4,
            xml_escape(&case.name)
        );
        let _ = writeln!(
            svg,
            r##"  <rect x="{}" y="{}" width="{}" height="{}" fill="#4c78a8"/>"##,
            LABEL_WIDTH,
            y + 4,
            bar_w,
            ROW_HEIGHT - 8
        );
        let _ = writeln!(
            svg,
            r#"  <text x="{}" y="{}" font-size="11">{:.2}</text>"#,
            LABEL_WIDTH + bar_w + 6,
            y + ROW_HEIGHT / 2 + 4,
            case.real_time
        );
    }

    let _ = writeln!(
        svg,
        r#"  <text x="{}" y="{}" font-size="12" text-anchor="middle">Time ({})</text>"#,
        LABEL_WIDTH + bar_area / 2,
        height - 12,
        xml_escape(unit)
    );
    svg.push_str("</svg>\n");
    svg
}

/// Minimal escaping for text nodes — case names may contain `<` and `&`
/// (template instantiations like `Insert<int>/64`).
fn xml_escape(s: &str) -> String {
    s.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

// ---------------------------------------------------------------------------
// Markdown rendering
// ---------------------------------------------------------------------------

fn render_markdown(report: &RunReport) -> String {
    let env = &report.environment;
    let mut md = String::new();

    md.push_str("# Benchmark Results\n\n");

    md.push_str("## Machine Information\n\n");
    let _ = writeln!(md, "- **Date**: {}", env.timestamp);
    let _ = writeln!(
        md,
        "- **Platform**: {} {}",
        env.platform,
        env.platform_version.as_deref().unwrap_or("")
    );
    let _ = writeln!(md, "- **CPU**: {}", env.cpu_model.as_deref().unwrap_or("unknown"));
    let _ = writeln!(
        md,
        "- **Cores**: {}",
        env.cpu_cores.map(|n| n.to_string()).unwrap_or_else(|| "unknown".to_string())
    );
    let _ = writeln!(
        md,
        "- **Memory**: {} GB",
        env.memory_gb.map(|m| m.to_string()).unwrap_or_else(|| "unknown".to_string())
    );
    md.push('\n');

    md.push_str("## Results Summary\n\n");
    let _ = writeln!(md, "- **Benchmarks run**: {}", report.runs.len());
    let _ = writeln!(md, "- **Successful**: {}", report.successes());
    let _ = writeln!(md, "- **Failed**: {}\n", report.failures());

    for (suite, cases) in report.dataset.suite_view() {
        let _ = writeln!(md, "### {}\n", suite);
        md.push_str("| Benchmark | Time | Unit | Iterations |\n");
        md.push_str("|-----------|------|------|------------|\n");
        for case in &cases {
            let _ = writeln!(
                md,
                "| {} | {:.2} | {} | {} |",
                case.name, case.real_time, case.time_unit, case.iterations
            );
        }
        md.push('\n');
        let _ = writeln!(md, "![{} results]({}_chart.svg)\n", suite, suite);
    }

    let failures: Vec<&RunOutcome> = report
        .runs
        .iter()
        .map(|r| &r.outcome)
        .filter(|o| !o.success)
        .collect();
    if !failures.is_empty() {
        md.push_str("## Failures\n\n");
        for fail in failures {
            let _ = writeln!(md, "### {}\n", fail.name);
            let _ = writeln!(
                md,
                "```\n{}\n```\n",
                fail.error.as_deref().unwrap_or("Unknown error")
            );
        }
    }

    md
}
