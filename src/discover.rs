use std::path::Path;

use regex::Regex;

use crate::types::ExecutableRef;

/// Discover benchmark executables beneath `root`.
///
/// Scans `root/bin`, `root/benchmarks`, and `root` itself for immediate
/// regular files whose name contains the case-insensitive substring
/// "benchmark", optionally filtered by `pattern` against the file name.
/// Missing candidate directories are skipped silently. The result is sorted
/// by path for reproducible ordering; an empty result is not an error
/// (the caller decides whether that is fatal).
pub fn discover(root: &Path, pattern: Option<&Regex>) -> Vec<ExecutableRef> {
    let candidates = [root.join("bin"), root.join("benchmarks"), root.to_path_buf()];

    let mut found = Vec::new();

    for dir in &candidates {
        let entries = match std::fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(_) => continue,
        };

        for entry in entries {
            let entry = match entry {
                Ok(e) => e,
                Err(_) => continue,
            };

            let path = entry.path();
            if !path.is_file() {
                continue;
            }

            let name = match path.file_name().and_then(|n| n.to_str()) {
                Some(n) => n.to_string(),
                None => continue,
            };

            if !name.to_lowercase().contains("benchmark") {
                continue;
            }

            if let Some(re) = pattern
                && !re.is_match(&name)
            {
                continue;
            }

            found.push(ExecutableRef::new(path));
        }
    }

    found.sort();
    found
}
