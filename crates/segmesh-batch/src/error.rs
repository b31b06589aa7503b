use std::path::PathBuf;

use thiserror::Error;

/// Configuration problems that abort a run before any segment is processed.
#[derive(Debug, Error)]
pub enum BatchError {
    #[error("no mesh source configured")]
    MissingSource,

    #[error("worker count must be at least 1")]
    NoWorkers,

    #[error("output directory path is empty")]
    EmptyOutputDir,

    #[error("output path '{0}' exists and is not a directory")]
    OutputNotDirectory(PathBuf),

    #[error("failed to create output directory '{0}': {1}")]
    OutputDir(PathBuf, #[source] std::io::Error),

    #[error("failed to build worker pool: {0}")]
    ThreadPool(String),
}
