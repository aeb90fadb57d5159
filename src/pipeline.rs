//! End-to-end analysis orchestration.
//!
//! The [`Analyzer`] threads one (novel, backstory) pair through the whole
//! pipeline: chunk → extract experiences → fold story profile → extract
//! claims → fold backstory profile → compare → link evidence → dossier →
//! final prediction. The core of that chain is synchronous and pure; the
//! only asynchronous, fallible step is the optional oracle corroboration,
//! which always falls back to the heuristic decision.
//!
//! Batch runs fan out across pairs with no shared mutable state; a single
//! pair's failure degrades to the safe default (consistent) with the reason
//! recorded, and never aborts the batch.

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;

use futures::future::join_all;
use serde::{Deserialize, Serialize};

use crate::chunker::chunk_novel;
use crate::compare::{compare, Decision, Severity};
use crate::config::AnalyzerConfig;
use crate::dossier::{build_dossier, Dossier};
use crate::error::AnalysisError;
use crate::evidence::{aggregate_links, link_evidence, DimensionReport};
use crate::extract::{Extractor, TaggedUnit};
use crate::lexicon::{Dimension, Lexicon};
use crate::oracle::{ConsistencyOracle, OracleRequest};
use crate::profile::ProfileUpdater;
use crate::retriever::retrieve_snippets;

/// How the final prediction was reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisMethod {
    /// Heuristic constraint comparison only.
    ConstraintOnly,
    /// Oracle verdict corroborated (and overrode) the heuristic.
    HybridOracle,
}

/// Result of analyzing one (novel, backstory) pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisOutcome {
    /// 1 = consistent, 0 = inconsistent.
    pub prediction: u8,
    pub rationale: String,
    pub method: AnalysisMethod,
    /// Dimensions whose conflicts survived the dominance rule.
    pub escalated_dimensions: Vec<Dimension>,
    pub decision: Decision,
    pub dossier: Dossier,
}

/// One entry of a batch run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchItem {
    pub id: String,
    pub novel_path: PathBuf,
    pub backstory: String,
    pub character_name: Option<String>,
}

/// Per-pair batch output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchRecord {
    pub id: String,
    pub prediction: u8,
    pub rationale: String,
}

/// Orchestrates the full consistency analysis.
#[derive(Debug, Clone)]
pub struct Analyzer {
    config: AnalyzerConfig,
    lexicon: Lexicon,
    oracle: Option<Arc<dyn ConsistencyOracle>>,
}

impl Analyzer {
    pub fn new(config: AnalyzerConfig) -> Self {
        Analyzer {
            config,
            lexicon: Lexicon::default(),
            oracle: None,
        }
    }

    /// Replace the keyword lexicon.
    pub fn with_lexicon(mut self, lexicon: Lexicon) -> Self {
        self.lexicon = lexicon;
        self
    }

    /// Attach an advisory oracle. The pipeline stays fully functional
    /// without one.
    pub fn with_oracle(mut self, oracle: Arc<dyn ConsistencyOracle>) -> Self {
        self.oracle = Some(oracle);
        self
    }

    fn extractor(&self) -> Extractor {
        Extractor::new(self.lexicon.clone(), self.config.classifier.build())
            .with_min_sentence_len(self.config.min_sentence_len)
    }

    /// Run the deterministic heuristic pipeline on one pair.
    pub fn analyze_heuristic(&self, novel_text: &str, backstory_text: &str) -> AnalysisOutcome {
        let chunks = chunk_novel(novel_text);
        let extractor = self.extractor();

        let experiences = extractor.detect_experiences(&chunks);
        let story = ProfileUpdater::new(
            self.config.story_start_strength,
            self.config.strength_increment,
        )
        .fold(&experiences);

        let claims = extractor.extract_claims(backstory_text);
        let backstory = ProfileUpdater::new(
            self.config.backstory_start_strength,
            self.config.strength_increment,
        )
        .fold(&claims);

        let decision = compare(&story, &backstory);
        let links = link_evidence(&extractor, &experiences, &claims);
        let reports = aggregate_links(&links, &story, &backstory);

        tracing::debug!(
            experiences = experiences.len(),
            claims = claims.len(),
            links = links.len(),
            conflicts = decision.conflicts.len(),
            "pipeline stages complete"
        );

        let escalated_dimensions = self.escalate_conflicts(&decision, &reports);
        let (prediction, rationale) = if escalated_dimensions.is_empty() {
            let has_significant = decision
                .conflicts
                .iter()
                .any(|c| c.severity >= Severity::Medium);
            if has_significant {
                (
                    1,
                    "Minor conflicts below evidence threshold. Constraints align.".to_string(),
                )
            } else {
                (
                    1,
                    "No meaningful conflicts. All constraint polarities align.".to_string(),
                )
            }
        } else {
            let dims: Vec<&str> = escalated_dimensions.iter().map(|d| d.label()).collect();
            (
                0,
                format!(
                    "Polarity mismatch in [{}]. Conflict severity backed by evidence dominance.",
                    dims.join(", ")
                ),
            )
        };

        let dossier = build_dossier(&experiences, &claims, &links, reports, &decision);
        AnalysisOutcome {
            prediction,
            rationale,
            method: AnalysisMethod::ConstraintOnly,
            escalated_dimensions,
            decision,
            dossier,
        }
    }

    /// Apply the dominance rule: a Medium/High conflict escalates only when
    /// its contradicting links reach `dominance_ratio` of the supporting
    /// count. Below that ratio a statistically weak conflict is downgraded
    /// and does not flip the final outcome.
    fn escalate_conflicts(
        &self,
        decision: &Decision,
        reports: &[DimensionReport],
    ) -> Vec<Dimension> {
        let mut escalated = Vec::new();
        for conflict in &decision.conflicts {
            if conflict.severity < Severity::Medium {
                continue;
            }
            let Some(dimension) = conflict.dimension else {
                continue;
            };
            let (contradicting, supporting) = reports
                .iter()
                .find(|r| r.dimension == dimension)
                .map(|r| (r.contradicting_count, r.supporting_count))
                .unwrap_or((0, 0));
            if contradicting as f64 >= supporting as f64 * self.config.dominance_ratio {
                escalated.push(dimension);
            }
        }
        escalated
    }

    /// Full analysis: heuristic pipeline, then optional oracle
    /// corroboration.
    ///
    /// The heuristic outcome is always computed first and substituted
    /// deterministically whenever the oracle is absent, has no evidence to
    /// look at, or fails after its bounded retries.
    pub async fn analyze(
        &self,
        novel_text: &str,
        backstory_text: &str,
        character_name: Option<&str>,
    ) -> AnalysisOutcome {
        let mut outcome = self.analyze_heuristic(novel_text, backstory_text);

        let Some(oracle) = &self.oracle else {
            return outcome;
        };
        let chunks = chunk_novel(novel_text);
        let passages = self.collect_evidence_passages(&chunks, &outcome.dossier.backstory_claims);
        if passages.is_empty() {
            return outcome;
        }

        let request = OracleRequest {
            backstory: backstory_text.to_string(),
            evidence_passages: passages,
            character_name: character_name.map(str::to_string),
        };
        match oracle.assess(&request).await {
            Ok(verdict) => {
                outcome.prediction = verdict.prediction;
                outcome.method = AnalysisMethod::HybridOracle;
                outcome.rationale = if verdict.prediction == 0 {
                    if verdict.conflict_dimensions.is_empty() {
                        format!("Contradiction detected. {}", verdict.rationale)
                    } else {
                        format!(
                            "Oracle detected contradictions in [{}]. {}",
                            verdict.conflict_dimensions.join(", "),
                            verdict.rationale
                        )
                    }
                } else {
                    format!("Consistent. {}", verdict.rationale)
                };
                outcome
            }
            Err(e) => {
                tracing::warn!("oracle unavailable, using heuristic decision: {}", e);
                outcome
            }
        }
    }

    /// Retrieve narrative passages touching the claims' dimensions, capped
    /// at `oracle_passages` and deduplicated in document order.
    fn collect_evidence_passages(
        &self,
        chunks: &[String],
        claims: &[TaggedUnit],
    ) -> Vec<String> {
        let dimensions: HashSet<Dimension> = claims.iter().map(|c| c.dimension).collect();
        let mut seen = HashSet::new();
        let mut passages = Vec::new();
        for dimension in Dimension::ALL.into_iter().filter(|d| dimensions.contains(d)) {
            let Some(keywords) = self.lexicon.keywords(dimension) else {
                continue;
            };
            for keyword in keywords {
                for snippet in retrieve_snippets(keyword, chunks, self.config.oracle_passages) {
                    if passages.len() >= self.config.oracle_passages {
                        return passages;
                    }
                    if seen.insert(snippet.clone()) {
                        passages.push(snippet);
                    }
                }
            }
        }
        passages
    }

    /// Analyze many pairs concurrently.
    ///
    /// Pairs share no state, so the fan-out is a plain `join_all`. A pair
    /// whose novel cannot be read degrades to the safe default prediction
    /// (consistent) with the failure reason recorded.
    pub async fn analyze_batch(&self, items: &[BatchItem]) -> Vec<BatchRecord> {
        join_all(items.iter().map(|item| self.process_item(item))).await
    }

    async fn process_item(&self, item: &BatchItem) -> BatchRecord {
        match self.try_process_item(item).await {
            Ok(outcome) => {
                tracing::info!(id = %item.id, prediction = outcome.prediction, "pair analyzed");
                BatchRecord {
                    id: item.id.clone(),
                    prediction: outcome.prediction,
                    rationale: outcome.rationale,
                }
            }
            Err(e) => {
                tracing::error!(id = %item.id, "pair failed, defaulting to consistent: {}", e);
                BatchRecord {
                    id: item.id.clone(),
                    prediction: 1,
                    rationale: format!("Error during processing: {}", e),
                }
            }
        }
    }

    async fn try_process_item(&self, item: &BatchItem) -> Result<AnalysisOutcome, AnalysisError> {
        let novel_text = tokio::fs::read_to_string(&item.novel_path)
            .await
            .map_err(|source| AnalysisError::Input {
                path: item.novel_path.display().to_string(),
                source,
            })?;
        Ok(self
            .analyze(&novel_text, &item.backstory, item.character_name.as_deref())
            .await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compare::Verdict;
    use crate::oracle::{OracleError, OracleVerdict};
    use async_trait::async_trait;
    use std::io::Write;

    const HOSTILE_BACKSTORY: &str = "He attacked anyone who challenged him to a fight.";

    fn analyzer() -> Analyzer {
        Analyzer::new(AnalyzerConfig::default())
    }

    #[test]
    fn test_inconsistent_pair_escalates() {
        let novel = "He refused to fight the soldiers.\n\nHe walked away from the battle.";
        let outcome = analyzer().analyze_heuristic(novel, HOSTILE_BACKSTORY);
        assert_eq!(outcome.prediction, 0);
        assert_eq!(outcome.decision.verdict, Verdict::Inconsistent);
        assert_eq!(outcome.escalated_dimensions, vec![Dimension::Violence]);
        assert!(outcome.rationale.contains("violence"));
        assert_eq!(outcome.method, AnalysisMethod::ConstraintOnly);
    }

    #[test]
    fn test_consistent_pair() {
        let novel = "He trusted his friends completely.";
        let backstory = "He trusted the people closest to him.";
        let outcome = analyzer().analyze_heuristic(novel, backstory);
        assert_eq!(outcome.prediction, 1);
        assert_eq!(outcome.decision.verdict, Verdict::Consistent);
        assert!(outcome.escalated_dimensions.is_empty());
        assert!(outcome.rationale.contains("No meaningful conflicts"));
    }

    #[test]
    fn test_weak_conflict_is_downgraded() {
        // Three supporting excerpts against one contradicting one: the
        // profile-level conflict exists (last write flips polarity) but the
        // evidence ratio stays below the dominance threshold.
        let novel = "He attacked the enemy line. He fought willingly in the battle. \
                     He enjoyed the battle at the fortress. He refused to fight.";
        let outcome = analyzer().analyze_heuristic(novel, HOSTILE_BACKSTORY);
        assert_eq!(outcome.decision.verdict, Verdict::Inconsistent);
        assert!(outcome.escalated_dimensions.is_empty());
        assert_eq!(outcome.prediction, 1);
        assert!(outcome.rationale.contains("below evidence threshold"));
    }

    #[test]
    fn test_analyze_without_oracle_matches_heuristic() {
        let novel = "He refused to fight the soldiers.";
        let heuristic = analyzer().analyze_heuristic(novel, HOSTILE_BACKSTORY);
        let full = tokio_test::block_on(analyzer().analyze(novel, HOSTILE_BACKSTORY, None));
        assert_eq!(full.prediction, heuristic.prediction);
        assert_eq!(full.method, AnalysisMethod::ConstraintOnly);
    }

    #[derive(Debug)]
    struct ScriptedOracle(OracleVerdict);

    #[async_trait]
    impl ConsistencyOracle for ScriptedOracle {
        async fn assess(&self, _request: &OracleRequest) -> Result<OracleVerdict, OracleError> {
            Ok(self.0.clone())
        }
    }

    #[derive(Debug)]
    struct DownOracle;

    #[async_trait]
    impl ConsistencyOracle for DownOracle {
        async fn assess(&self, _request: &OracleRequest) -> Result<OracleVerdict, OracleError> {
            Err(OracleError::Exhausted("rate limited (429)".into()))
        }
    }

    #[tokio::test]
    async fn test_oracle_verdict_overrides_heuristic() {
        let oracle = ScriptedOracle(OracleVerdict {
            prediction: 0,
            confidence: 0.9,
            rationale: "The narrative shows sustained pacifism.".to_string(),
            conflict_dimensions: vec!["violence".to_string()],
        });
        // Heuristically consistent pair; the oracle disagrees.
        let novel = "He trusted his friends completely.";
        let backstory = "He trusted the people closest to him.";
        let outcome = analyzer()
            .with_oracle(Arc::new(oracle))
            .analyze(novel, backstory, Some("Edmond"))
            .await;
        assert_eq!(outcome.prediction, 0);
        assert_eq!(outcome.method, AnalysisMethod::HybridOracle);
        assert!(outcome.rationale.contains("violence"));
        // The heuristic decision is still carried for reporting.
        assert_eq!(outcome.decision.verdict, Verdict::Consistent);
    }

    #[tokio::test]
    async fn test_oracle_failure_falls_back_to_heuristic() {
        let novel = "He refused to fight the soldiers.";
        let outcome = analyzer()
            .with_oracle(Arc::new(DownOracle))
            .analyze(novel, HOSTILE_BACKSTORY, None)
            .await;
        assert_eq!(outcome.prediction, 0);
        assert_eq!(outcome.method, AnalysisMethod::ConstraintOnly);
    }

    #[tokio::test]
    async fn test_batch_degrades_failed_pair_without_aborting() {
        let mut novel_file = tempfile::NamedTempFile::new().unwrap();
        write!(novel_file, "He refused to fight the soldiers.").unwrap();

        let items = vec![
            BatchItem {
                id: "ok".to_string(),
                novel_path: novel_file.path().to_path_buf(),
                backstory: HOSTILE_BACKSTORY.to_string(),
                character_name: None,
            },
            BatchItem {
                id: "missing".to_string(),
                novel_path: PathBuf::from("/nonexistent/novel.txt"),
                backstory: HOSTILE_BACKSTORY.to_string(),
                character_name: None,
            },
        ];
        let records = analyzer().analyze_batch(&items).await;
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, "ok");
        assert_eq!(records[0].prediction, 0);
        assert_eq!(records[1].id, "missing");
        // Failed pair degrades to the safe default with the reason recorded.
        assert_eq!(records[1].prediction, 1);
        assert!(records[1].rationale.contains("Error during processing"));
    }
}
