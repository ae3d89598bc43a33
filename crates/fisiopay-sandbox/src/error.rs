//! Error types for the text-extraction sandbox

use thiserror::Error;

/// Errors that can occur while extracting text through the sandbox
///
/// Transient and permanent failures are indistinguishable at this layer,
/// so there is no automatic retry; policy belongs to the caller.
#[derive(Error, Debug)]
pub enum ExtractionError {
    /// Failed to spawn or talk to the worker process
    #[error("Failed to run extraction worker: {0}")]
    Spawn(#[from] std::io::Error),

    /// The worker reported an extraction failure
    #[error("Extraction failed: {0}")]
    Worker(String),

    /// The worker produced no parseable protocol line
    #[error("malformed sandbox output")]
    MalformedOutput,

    /// The worker exceeded its wall-clock budget and was killed
    #[error("timeout")]
    Timeout,
}
