//! # consistory
//!
//! Narrative consistency engine: builds two independently-derived behavioral
//! profiles of a fictional character — one folded incrementally from a long
//! narrative, one parsed from a short declarative backstory — decides
//! whether they are mutually consistent, and produces an itemized evidence
//! dossier for any conflict.
//!
//! The core (extraction, profile folding, comparison, evidence linking) is
//! synchronous and pure-functional; the only asynchronous, fallible step is
//! the optional advisory oracle, which the pipeline always backs with a
//! deterministic heuristic fallback.

pub mod chunker;
pub mod compare;
pub mod config;
pub mod dossier;
pub mod error;
pub mod evidence;
pub mod extract;
pub mod lexicon;
pub mod oracle;
pub mod pipeline;
pub mod polarity;
pub mod profile;
pub mod report;
pub mod retriever;

pub use compare::{compare, ConflictRecord, Decision, Severity, Verdict};
pub use config::AnalyzerConfig;
pub use dossier::Dossier;
pub use error::AnalysisError;
pub use evidence::{link_evidence, EvidenceLink, Relationship};
pub use extract::{Extractor, TaggedUnit};
pub use lexicon::{Dimension, Lexicon};
pub use oracle::{ConsistencyOracle, OracleVerdict};
pub use pipeline::{AnalysisOutcome, Analyzer, BatchItem, BatchRecord};
pub use polarity::{Polarity, PolarityClassifier};
pub use profile::{Constraint, Profile, ProfileUpdater};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
