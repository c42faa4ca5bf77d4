use std::path::PathBuf;

#[derive(thiserror::Error, Debug)]
pub enum HarnessError {
    #[error("No benchmarks found in {dir}. Build the benchmark executables first?")]
    NoBenchmarksFound { dir: PathBuf },

    #[error("Invalid benchmark filter pattern '{pattern}': {detail}")]
    InvalidPattern { pattern: String, detail: String },

    #[error("Failed to create output directory {path}: {source}")]
    OutputDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to write {path}: {source}")]
    ArtifactWrite {
        path: PathBuf,
        source: std::io::Error,
    },
}
