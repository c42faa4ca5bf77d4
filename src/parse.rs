use std::collections::BTreeMap;

use crate::types::{BenchmarkCaseRecord, ExecutableRef, ParsedOutput, RunOutcome};

/// Fields that make up the fixed record schema. Everything else in a
/// benchmark entry is a candidate extra counter.
const FIXED_FIELDS: &[&str] = &["suite", "name", "real_time", "cpu_time", "time_unit", "iterations"];

/// Parse a successful run's stdout. Failed runs carry no parseable payload.
pub fn parse_outcome(exec: &ExecutableRef, outcome: &RunOutcome) -> Option<ParsedOutput> {
    if !outcome.success {
        return None;
    }
    Some(parse_stdout(&exec.suite(), &outcome.stdout))
}

/// Interpret stdout as a structured benchmark document when possible.
///
/// The expected shape is a JSON object whose `benchmarks` array holds one
/// object per measured case. An object without the key yields zero cases;
/// anything that is not a JSON object falls back to `RawText`, preserved
/// verbatim. This never fails — a nonconforming executable just contributes
/// no rows.
pub fn parse_stdout(suite: &str, stdout: &str) -> ParsedOutput {
    let doc: serde_json::Value = match serde_json::from_str(stdout) {
        Ok(doc) => doc,
        Err(_) => return ParsedOutput::RawText(stdout.to_string()),
    };

    if !doc.is_object() {
        return ParsedOutput::RawText(stdout.to_string());
    }

    let cases = doc
        .get("benchmarks")
        .and_then(|b| b.as_array())
        .map(|entries| {
            entries
                .iter()
                .filter_map(|entry| case_from_entry(suite, entry))
                .collect()
        })
        .unwrap_or_default();

    ParsedOutput::Cases(cases)
}

/// Normalize one `benchmarks` entry into a record. Non-object entries are
/// skipped; missing fields take schema defaults; extra numeric fields are
/// carried into `counters` and non-numeric extras are dropped.
fn case_from_entry(suite: &str, entry: &serde_json::Value) -> Option<BenchmarkCaseRecord> {
    let obj = entry.as_object()?;

    let mut counters = BTreeMap::new();
    for (key, value) in obj {
        if FIXED_FIELDS.contains(&key.as_str()) {
            continue;
        }
        if let Some(n) = value.as_f64() {
            counters.insert(key.clone(), n);
        }
    }

    Some(BenchmarkCaseRecord {
        suite: suite.to_string(),
        name: obj
            .get("name")
            .and_then(|v| v.as_str())
            .unwrap_or("unknown")
            .to_string(),
        real_time: obj.get("real_time").and_then(|v| v.as_f64()).unwrap_or(0.0),
        cpu_time: obj.get("cpu_time").and_then(|v| v.as_f64()).unwrap_or(0.0),
        time_unit: obj
            .get("time_unit")
            .and_then(|v| v.as_str())
            .unwrap_or("ns")
            .to_string(),
        iterations: obj.get("iterations").and_then(|v| v.as_u64()).unwrap_or(0),
        counters,
    })
}
