use std::cmp::Ordering;

use crate::types::{AggregatedDataset, BenchmarkCaseRecord, CompletedRun, ParsedOutput};

/// Fold every parsed case row across the batch into one dataset,
/// preserving run order then run-internal order. No deduplication and no
/// statistical merging — each row is one measured case, even when two runs
/// report the same case name. Raw-text and failed runs contribute nothing.
pub fn aggregate(runs: &[CompletedRun]) -> AggregatedDataset {
    let mut rows = Vec::new();
    for run in runs {
        if let Some(ParsedOutput::Cases(cases)) = &run.parsed {
            rows.extend(cases.iter().cloned());
        }
    }
    AggregatedDataset { rows }
}

impl AggregatedDataset {
    /// Suite-keyed presentation view: suites in first-seen order, cases
    /// within a suite ascending by real time. A view only — the stored rows
    /// are never reordered.
    pub fn suite_view(&self) -> Vec<(&str, Vec<&BenchmarkCaseRecord>)> {
        let mut order: Vec<&str> = Vec::new();
        for row in &self.rows {
            if !order.contains(&row.suite.as_str()) {
                order.push(&row.suite);
            }
        }

        order
            .into_iter()
            .map(|suite| {
                let mut group: Vec<&BenchmarkCaseRecord> =
                    self.rows.iter().filter(|r| r.suite == suite).collect();
                // Stable sort: equal times keep their run order.
                group.sort_by(|a, b| {
                    a.real_time
                        .partial_cmp(&b.real_time)
                        .unwrap_or(Ordering::Equal)
                });
                (suite, group)
            })
            .collect()
    }
}
