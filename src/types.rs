use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Serialize;

use crate::probe::EnvironmentRecord;

/// A benchmark executable found during discovery, before execution.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct ExecutableRef {
    pub path: PathBuf,
}

impl ExecutableRef {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// File name as shown in progress output and the raw snapshot.
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Suite name: the file stem with a trailing `_benchmark` stripped.
    /// `alpha_benchmark` → `alpha`; names without the suffix pass through.
    pub fn suite(&self) -> String {
        let stem = self
            .path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        stem.strip_suffix("_benchmark")
            .map(|s| s.to_string())
            .unwrap_or(stem)
    }
}

/// Classified result of executing one benchmark.
///
/// `error` is set on timeout, non-zero exit, or launch failure; stdout and
/// stderr are captured verbatim (empty when the process never ran).
#[derive(Debug, Clone, Serialize)]
pub struct RunOutcome {
    pub name: String,
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// One normalized row of benchmark data.
///
/// `counters` holds extra numeric fields carried through from the source
/// document verbatim. Duplicate suite+name pairs are allowed — each row is
/// one measured case.
#[derive(Debug, Clone, Serialize)]
pub struct BenchmarkCaseRecord {
    pub suite: String,
    pub name: String,
    pub real_time: f64,
    pub cpu_time: f64,
    pub time_unit: String,
    pub iterations: u64,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub counters: BTreeMap<String, f64>,
}

/// Parsed stdout of a successful run: structured cases, or the raw text
/// when the output is not the expected benchmark document. Callers match on
/// the variant; there is no error path here.
#[derive(Debug, Clone)]
pub enum ParsedOutput {
    Cases(Vec<BenchmarkCaseRecord>),
    RawText(String),
}

/// One executed benchmark paired with its parsed stdout, kept in execution
/// order. `parsed` is `None` for failed runs.
#[derive(Debug, Clone)]
pub struct CompletedRun {
    pub outcome: RunOutcome,
    pub parsed: Option<ParsedOutput>,
}

/// All case rows across the batch, in run order then run-internal order.
/// Grouping by suite is a presentation view — see
/// [`suite_view`](crate::aggregate).
#[derive(Debug, Clone, Default)]
pub struct AggregatedDataset {
    pub rows: Vec<BenchmarkCaseRecord>,
}

impl AggregatedDataset {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }
}

/// The full product of one invocation: environment snapshot, every run in
/// execution order, and the aggregated dataset. Built once by the
/// orchestrator and handed to the report sink read-only.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub environment: EnvironmentRecord,
    pub runs: Vec<CompletedRun>,
    pub dataset: AggregatedDataset,
}

impl RunReport {
    pub fn successes(&self) -> usize {
        self.runs.iter().filter(|r| r.outcome.success).count()
    }

    pub fn failures(&self) -> usize {
        self.runs.len() - self.successes()
    }
}
