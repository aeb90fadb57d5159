//! Error types for the analysis pipeline.

use thiserror::Error;

use crate::oracle::OracleError;

/// Errors surfaced by a single analysis run.
///
/// Input errors are fatal to their run and reported as-is; oracle errors are
/// recovered locally by falling back to the comparator decision and only
/// appear here when a caller queries the oracle directly. Sentences that
/// match no dimension are not errors at all and are silently dropped.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// Missing or unreadable source text.
    #[error("failed to read source text from {path}: {source}")]
    Input {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Malformed configuration or lexicon override.
    #[error("invalid configuration: {0}")]
    Config(#[from] serde_yaml::Error),

    /// Failure from the external advisory oracle.
    #[error(transparent)]
    Oracle(#[from] OracleError),

    /// Failure writing a report to disk.
    #[error("failed to write report: {0}")]
    Report(#[from] std::io::Error),

    /// Failure serializing a report payload.
    #[error("failed to serialize report: {0}")]
    Serialize(#[from] serde_json::Error),
}
