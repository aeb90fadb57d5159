//! OpenAI-compatible oracle provider.
//!
//! Calls a Chat Completions endpoint with a JSON-object response format and
//! parses the model's verdict. Transient failures (429, 5xx, transport
//! errors) are retried with bounded exponential backoff; client errors and
//! malformed payloads fail fast. Callers are expected to treat any error
//! here as "oracle unavailable" and fall back to the heuristic decision.

use async_trait::async_trait;
use serde_json::{json, Value};

use super::{ConsistencyOracle, OracleError, OracleRequest, OracleVerdict};

/// Default model when none is configured.
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Default Chat Completions base URL.
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// At most this many evidence passages are sent (token budget).
const MAX_EVIDENCE_PASSAGES: usize = 20;

/// Configuration for [`OpenAiOracle`].
#[derive(Debug, Clone)]
pub struct OpenAiOracleConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
    pub timeout_secs: f64,
    /// Additional attempts after the first (so `3` means up to 4 calls).
    pub max_retries: u32,
    pub temperature: f64,
}

impl Default for OpenAiOracleConfig {
    fn default() -> Self {
        OpenAiOracleConfig {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: 60.0,
            max_retries: 3,
            temperature: 0.3,
        }
    }
}

impl OpenAiOracleConfig {
    /// Build a config from `OPENAI_API_KEY` / `OPENAI_MODEL` / `OPENAI_BASE_URL`.
    pub fn from_env() -> Self {
        let mut config = OpenAiOracleConfig::default();
        config.api_key = std::env::var("OPENAI_API_KEY").ok();
        if let Ok(model) = std::env::var("OPENAI_MODEL") {
            config.model = model;
        }
        if let Ok(base_url) = std::env::var("OPENAI_BASE_URL") {
            config.base_url = base_url;
        }
        config
    }
}

/// OpenAI-compatible [`ConsistencyOracle`] implementation.
#[derive(Debug, Clone)]
pub struct OpenAiOracle {
    config: OpenAiOracleConfig,
}

impl OpenAiOracle {
    pub fn new(config: OpenAiOracleConfig) -> Self {
        OpenAiOracle { config }
    }

    fn build_prompt(request: &OracleRequest) -> String {
        let evidence_text = request
            .evidence_passages
            .iter()
            .take(MAX_EVIDENCE_PASSAGES)
            .cloned()
            .collect::<Vec<_>>()
            .join("\n\n---\n\n");
        let character = request
            .character_name
            .as_deref()
            .unwrap_or("Unknown");
        format!(
            "You are analyzing narrative consistency for a character in a novel.\n\n\
             BACKSTORY CLAIM:\n{backstory}\n\n\
             CHARACTER: {character}\n\n\
             EVIDENCE FROM NOVEL (excerpts):\n{evidence}\n\n\
             TASK:\n\
             Determine if the backstory claim is CONSISTENT or CONTRADICTORY with the \
             character's behavior/traits shown in the novel excerpts.\n\n\
             Consider:\n\
             1. Direct contradictions (backstory says X, novel shows opposite)\n\
             2. Behavioral patterns that conflict with claimed history\n\
             3. Character traits inconsistent with backstory\n\
             4. Context and nuance (not just keywords)\n\n\
             RESPOND IN JSON FORMAT:\n\
             {{\n\
             \"prediction\": 0 or 1,\n\
             \"confidence\": 0.0-1.0,\n\
             \"rationale\": \"Brief explanation (2-3 sentences)\",\n\
             \"conflict_dimensions\": [\"violence\", \"trust\", ...] or []\n\
             }}\n\n\
             Be strict: if there is clear contradiction, mark as 0. If uncertain or \
             aligned, mark as 1.",
            backstory = request.backstory,
            character = character,
            evidence = evidence_text,
        )
    }

    fn parse_verdict(content: &str) -> Result<OracleVerdict, OracleError> {
        let value: Value = serde_json::from_str(content)
            .map_err(|e| OracleError::Malformed(format!("{}: {}", e, content)))?;
        let prediction = match value.get("prediction").and_then(Value::as_i64) {
            Some(0) => 0,
            Some(1) => 1,
            other => {
                return Err(OracleError::Malformed(format!(
                    "prediction must be 0 or 1, got {:?}",
                    other
                )))
            }
        };
        let confidence = value
            .get("confidence")
            .and_then(Value::as_f64)
            .unwrap_or(0.5)
            .clamp(0.0, 1.0);
        let rationale = value
            .get("rationale")
            .and_then(Value::as_str)
            .unwrap_or("Oracle analysis completed")
            .to_string();
        let conflict_dimensions = value
            .get("conflict_dimensions")
            .and_then(Value::as_array)
            .map(|dims| {
                dims.iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();
        Ok(OracleVerdict {
            prediction,
            confidence,
            rationale,
            conflict_dimensions,
        })
    }
}

#[async_trait]
impl ConsistencyOracle for OpenAiOracle {
    async fn assess(&self, request: &OracleRequest) -> Result<OracleVerdict, OracleError> {
        let api_key = self.config.api_key.as_ref().ok_or_else(|| {
            OracleError::Unavailable(
                "API key not set; set OPENAI_API_KEY or pass api_key in the config".into(),
            )
        })?;

        let body = json!({
            "model": self.config.model,
            "messages": [
                {
                    "role": "system",
                    "content": "You are an expert literary analyst specializing in character consistency."
                },
                { "role": "user", "content": Self::build_prompt(request) }
            ],
            "temperature": self.config.temperature,
            "response_format": { "type": "json_object" }
        });

        let endpoint = format!("{}/chat/completions", self.config.base_url);
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs_f64(self.config.timeout_secs))
            .build()
            .map_err(|e| OracleError::Transport(e.to_string()))?;

        // Retry loop with exponential backoff
        let mut last_error: Option<String> = None;
        let mut retry_delay = std::time::Duration::from_secs(1);

        for attempt in 0..=self.config.max_retries {
            if attempt > 0 {
                log::warn!("oracle retry attempt {} after {:?}", attempt, retry_delay);
                tokio::time::sleep(retry_delay).await;
                retry_delay *= 2; // Exponential backoff
            }

            let response = match client
                .post(&endpoint)
                .header("Content-Type", "application/json")
                .header("Authorization", format!("Bearer {}", api_key))
                .json(&body)
                .send()
                .await
            {
                Ok(resp) => resp,
                Err(e) => {
                    last_error = Some(e.to_string());
                    continue;
                }
            };

            let status = response.status();

            // Transient: rate limiting and server errors
            if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                last_error = Some("rate limited (429)".into());
                continue;
            }
            if status.is_server_error() {
                last_error = Some(format!("server error: {}", status));
                continue;
            }

            let response_text = match response.text().await {
                Ok(text) => text,
                Err(e) => {
                    last_error = Some(e.to_string());
                    continue;
                }
            };

            // Client errors fail fast; retrying the same request cannot help.
            if status.is_client_error() {
                return Err(OracleError::Rejected {
                    status: status.as_u16(),
                    message: response_text,
                });
            }

            let response_json: Value = serde_json::from_str(&response_text).map_err(|e| {
                OracleError::Malformed(format!(
                    "{} - body: {}",
                    e,
                    &response_text[..response_text.len().min(500)]
                ))
            })?;
            let content = response_json["choices"][0]["message"]["content"]
                .as_str()
                .ok_or_else(|| {
                    OracleError::Malformed("response has no message content".into())
                })?;

            log::debug!("oracle verdict content: {}", content);
            return Self::parse_verdict(content);
        }

        Err(OracleError::Exhausted(
            last_error.unwrap_or_else(|| "oracle call failed after all retries".into()),
        ))
    }
}
