//! Best-effort structured-field extraction via a generative text provider.
//!
//! The extractor consumes a size-bounded excerpt of redacted text plus a
//! fixed target schema and returns a record matching that schema. On
//! provider failure or malformed output it returns an all-null record of the
//! same shape rather than raising, so downstream consumers never branch on
//! errors for this path. Raw text never reaches this boundary; only redacted
//! text is ever sent.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::MetadataConfig;

const API_KEY_ENV: &str = "CLAUSEVAULT_METADATA_API_KEY";

/// The fixed target schema for contract metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContractMetadata {
    pub parties: Vec<String>,
    pub monetary_value: Option<f64>,
    pub currency: Option<String>,
    pub effective_date: Option<String>,
    pub expiration_date: Option<String>,
    pub clauses: Vec<String>,
    pub summary: Option<String>,
    pub risk_score: Option<f64>,
}

/// Generative-provider boundary for metadata extraction.
pub struct MetadataExtractor {
    config: MetadataConfig,
}

impl MetadataExtractor {
    pub fn new(config: &MetadataConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }

    pub fn is_available(&self) -> bool {
        self.config.is_enabled()
            && self.config.model.is_some()
            && std::env::var(API_KEY_ENV).is_ok()
    }

    /// Extract structured fields from redacted text. Never fails: any
    /// provider or parse problem degrades to the empty record.
    pub async fn extract(&self, redacted_text: &str) -> ContractMetadata {
        if !self.is_available() {
            return ContractMetadata::default();
        }

        let excerpt: String = redacted_text
            .chars()
            .take(self.config.excerpt_chars)
            .collect();

        match self.call_provider(&excerpt).await {
            Ok(content) => parse_metadata(&content),
            Err(e) => {
                tracing::warn!(error = %e, "metadata extraction failed, returning empty record");
                ContractMetadata::default()
            }
        }
    }

    async fn call_provider(&self, excerpt: &str) -> anyhow::Result<String> {
        let api_key = std::env::var(API_KEY_ENV)?;
        let model = self
            .config
            .model
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("metadata.model not set"))?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(self.config.timeout_secs))
            .build()?;

        let url = format!(
            "{}/chat/completions",
            self.config.base_url.trim_end_matches('/')
        );
        let prompt = format!(
            "Extract contract metadata from the following text. Respond with a \
             single JSON object with exactly these keys: parties (array of \
             strings), monetary_value (number or null), currency (string or \
             null), effective_date (ISO date or null), expiration_date (ISO \
             date or null), clauses (array of strings), summary (string or \
             null), risk_score (number 0-1 or null).\n\n{}",
            excerpt
        );
        let body = serde_json::json!({
            "model": model,
            "messages": [{ "role": "user", "content": prompt }],
        });

        let response = client
            .post(&url)
            .header("Authorization", format!("Bearer {}", api_key))
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            anyhow::bail!("metadata provider error {}", response.status());
        }

        let json: serde_json::Value = response.json().await?;
        let content = json
            .pointer("/choices/0/message/content")
            .and_then(|c| c.as_str())
            .ok_or_else(|| anyhow::anyhow!("missing completion content"))?;

        Ok(content.to_string())
    }
}

/// Defensively parse provider output into the fixed schema.
///
/// Strips Markdown code fences, parses what remains as JSON, and backfills
/// any missing or mistyped key with null/empty. Never panics on malformed
/// output.
pub fn parse_metadata(content: &str) -> ContractMetadata {
    let stripped = strip_code_fence(content);

    let value: serde_json::Value = match serde_json::from_str(stripped.trim()) {
        Ok(v) => v,
        Err(_) => return ContractMetadata::default(),
    };

    ContractMetadata {
        parties: string_array(&value, "parties"),
        monetary_value: value.get("monetary_value").and_then(|v| v.as_f64()),
        currency: string_field(&value, "currency"),
        effective_date: string_field(&value, "effective_date"),
        expiration_date: string_field(&value, "expiration_date"),
        clauses: string_array(&value, "clauses"),
        summary: string_field(&value, "summary"),
        risk_score: value.get("risk_score").and_then(|v| v.as_f64()),
    }
}

fn string_field(value: &serde_json::Value, key: &str) -> Option<String> {
    value
        .get(key)
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
}

fn string_array(value: &serde_json::Value, key: &str) -> Vec<String> {
    value
        .get(key)
        .and_then(|v| v.as_array())
        .map(|items| {
            items
                .iter()
                .filter_map(|i| i.as_str())
                .map(|s| s.to_string())
                .collect()
        })
        .unwrap_or_default()
}

/// Remove a surrounding ```json ... ``` (or plain ```) wrapper if present.
fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    let without_open = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .unwrap_or(trimmed);
    without_open
        .strip_suffix("```")
        .unwrap_or(without_open)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_record() {
        let content = r#"{
            "parties": ["Acme Corp", "Widget LLC"],
            "monetary_value": 125000.0,
            "currency": "USD",
            "effective_date": "2024-01-01",
            "expiration_date": "2025-01-01",
            "clauses": ["termination", "indemnification"],
            "summary": "Supply agreement.",
            "risk_score": 0.35
        }"#;
        let meta = parse_metadata(content);
        assert_eq!(meta.parties, vec!["Acme Corp", "Widget LLC"]);
        assert_eq!(meta.monetary_value, Some(125000.0));
        assert_eq!(meta.currency.as_deref(), Some("USD"));
        assert_eq!(meta.clauses.len(), 2);
        assert_eq!(meta.risk_score, Some(0.35));
    }

    #[test]
    fn test_parse_strips_code_fence() {
        let content = "```json\n{\"parties\": [\"Acme\"], \"summary\": \"ok\"}\n```";
        let meta = parse_metadata(content);
        assert_eq!(meta.parties, vec!["Acme"]);
        assert_eq!(meta.summary.as_deref(), Some("ok"));
    }

    #[test]
    fn test_missing_keys_backfilled_null() {
        let meta = parse_metadata(r#"{"parties": ["Acme"]}"#);
        assert_eq!(meta.parties, vec!["Acme"]);
        assert!(meta.monetary_value.is_none());
        assert!(meta.currency.is_none());
        assert!(meta.clauses.is_empty());
        assert!(meta.risk_score.is_none());
    }

    #[test]
    fn test_malformed_output_yields_empty_record() {
        assert_eq!(parse_metadata("not json at all"), ContractMetadata::default());
        assert_eq!(parse_metadata(""), ContractMetadata::default());
    }

    #[test]
    fn test_mistyped_fields_dropped_not_crashed() {
        let meta = parse_metadata(r#"{"parties": "Acme", "monetary_value": "lots"}"#);
        assert!(meta.parties.is_empty());
        assert!(meta.monetary_value.is_none());
    }

    #[tokio::test]
    async fn test_disabled_extractor_returns_empty_record() {
        let extractor = MetadataExtractor::new(&MetadataConfig::default());
        let meta = extractor.extract("Some redacted agreement text.").await;
        assert_eq!(meta, ContractMetadata::default());
    }
}
