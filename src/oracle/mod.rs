//! Advisory consistency oracle.
//!
//! The oracle is an optional external collaborator (a hosted language model)
//! asked to corroborate a consistency decision. It is treated strictly as a
//! bounded-latency, retryable, potentially-absent dependency: the pipeline
//! always holds a complete heuristic answer and substitutes it
//! deterministically when the oracle is missing or exhausted. Provider
//! selection is configuration, not core logic; one OpenAI-compatible
//! provider ships in [`openai`].

pub mod openai;

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use openai::{OpenAiOracle, OpenAiOracleConfig};

/// A consistency question put to the oracle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OracleRequest {
    /// The backstory claim under test.
    pub backstory: String,
    /// Narrative excerpts retrieved as evidence.
    pub evidence_passages: Vec<String>,
    /// Character name, when known.
    pub character_name: Option<String>,
}

/// The oracle's advisory verdict.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OracleVerdict {
    /// 1 = consistent, 0 = contradictory.
    pub prediction: u8,
    /// Self-reported confidence in `[0, 1]`.
    pub confidence: f64,
    /// Brief explanation.
    pub rationale: String,
    /// Dimension labels the oracle believes conflict.
    pub conflict_dimensions: Vec<String>,
}

/// Oracle failure modes. All of them are recoverable at the pipeline level
/// by falling back to the comparator's own decision.
#[derive(Debug, Error)]
pub enum OracleError {
    /// No credentials or endpoint configured.
    #[error("oracle unavailable: {0}")]
    Unavailable(String),

    /// Transport-level failure (connect, timeout).
    #[error("oracle transport error: {0}")]
    Transport(String),

    /// Retries exhausted after transient failures (rate limits, 5xx).
    #[error("oracle retries exhausted: {0}")]
    Exhausted(String),

    /// The oracle answered but the payload could not be interpreted.
    #[error("oracle returned a malformed response: {0}")]
    Malformed(String),

    /// The oracle rejected the request outright (4xx).
    #[error("oracle rejected request ({status}): {message}")]
    Rejected { status: u16, message: String },
}

/// Interface to the advisory oracle.
#[async_trait]
pub trait ConsistencyOracle: Send + Sync + fmt::Debug {
    /// Ask whether the backstory is consistent with the evidence passages.
    async fn assess(&self, request: &OracleRequest) -> Result<OracleVerdict, OracleError>;
}
