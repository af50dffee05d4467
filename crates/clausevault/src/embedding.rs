//! Embedding orchestration over an external vector-embedding provider.
//!
//! [`EmbeddingOrchestrator`] batches calls to an OpenAI-compatible
//! embeddings endpoint, tolerating per-item failure: one bad input never
//! aborts the rest of the batch. Every returned vector is validated against
//! the provider's declared dimension before it can reach the store.
//!
//! # Retry Strategy
//!
//! - HTTP 429 (rate limited) and 5xx (server error) → retry
//! - HTTP 4xx (client error, not 429) → fail immediately
//! - Network errors → retry
//! - Backoff: 1s, 2s, 4s, 8s, 16s, 32s (capped at 2^5)
//!
//! Credentials are resolved through the explicitly passed configuration at
//! call time; there is no process-wide token cache.

use std::time::Duration;

use clausevault_core::embedding::{Embedding, EmbeddingProvider};
use clausevault_core::error::CoreError;

use crate::config::EmbeddingConfig;

const API_KEY_ENV: &str = "CLAUSEVAULT_EMBED_API_KEY";

/// Batches, retries, and validates calls to the embedding provider.
pub struct EmbeddingOrchestrator {
    config: EmbeddingConfig,
}

impl EmbeddingProvider for EmbeddingOrchestrator {
    fn model_name(&self) -> &str {
        self.config.model.as_deref().unwrap_or("disabled")
    }

    fn dims(&self) -> usize {
        self.config.dims.unwrap_or(0)
    }
}

impl EmbeddingOrchestrator {
    pub fn new(config: &EmbeddingConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }

    /// Whether semantic work is worth attempting at all. Callers use this
    /// as a cost/latency short-circuit instead of attempting and failing.
    pub fn is_available(&self) -> bool {
        self.config.is_enabled()
            && self.config.model.is_some()
            && self.config.dims.unwrap_or(0) > 0
            && std::env::var(API_KEY_ENV).is_ok()
    }

    /// Embed one document-mode text.
    pub async fn embed_text(&self, text: &str) -> Result<Embedding, CoreError> {
        let model = self.document_model()?;
        self.embed_one(text, &model).await
    }

    /// Embed one query-mode text. Query mode may use a distinct model at
    /// the provider; it falls back to the document model when none is
    /// configured.
    pub async fn embed_query(&self, text: &str) -> Result<Embedding, CoreError> {
        let model = self
            .config
            .query_model
            .clone()
            .map_or_else(|| self.document_model(), Ok)?;
        self.embed_one(text, &model).await
    }

    /// Embed a batch of texts, returning one slot per input in input order.
    ///
    /// A failed item yields `None` in its slot. The whole-batch call is
    /// tried first; if it fails or returns an unusable payload, each input
    /// is retried alone so a single poisoned text cannot take down its
    /// neighbors.
    pub async fn embed_batch(&self, texts: &[String]) -> Vec<Option<Embedding>> {
        if texts.is_empty() {
            return Vec::new();
        }
        if !self.is_available() {
            tracing::warn!("embedding provider unavailable, skipping batch");
            return vec![None; texts.len()];
        }

        let model = match self.document_model() {
            Ok(m) => m,
            Err(_) => return vec![None; texts.len()],
        };

        match self.call_provider(texts, &model).await {
            Ok(vectors) if vectors.len() == texts.len() => vectors
                .into_iter()
                .map(|v| self.validate(v))
                .collect(),
            Ok(vectors) => {
                tracing::warn!(
                    expected = texts.len(),
                    actual = vectors.len(),
                    "provider returned wrong batch length, retrying per item"
                );
                self.embed_each(texts, &model).await
            }
            Err(e) => {
                tracing::warn!(error = %e, "batch embedding failed, retrying per item");
                self.embed_each(texts, &model).await
            }
        }
    }

    fn document_model(&self) -> Result<String, CoreError> {
        self.config
            .model
            .clone()
            .ok_or_else(|| CoreError::ProviderUnavailable("embedding.model not set".to_string()))
    }

    async fn embed_one(&self, text: &str, model: &str) -> Result<Embedding, CoreError> {
        if text.trim().is_empty() {
            return Err(CoreError::InputError("empty text".to_string()));
        }
        if !self.is_available() {
            return Err(CoreError::ProviderUnavailable(
                "embedding provider disabled or not configured".to_string(),
            ));
        }
        let vectors = self.call_provider(&[text.to_string()], model).await?;
        let vector = vectors.into_iter().next().ok_or_else(|| {
            CoreError::ProviderMalformedResponse("empty embedding response".to_string())
        })?;
        Embedding::new(vector, self.dims())
    }

    /// Per-item fallback after a failed batch: one attempt each, failures
    /// isolated to their slot.
    async fn embed_each(&self, texts: &[String], model: &str) -> Vec<Option<Embedding>> {
        let mut out = Vec::with_capacity(texts.len());
        for text in texts {
            let slot = match self.call_provider(std::slice::from_ref(text), model).await {
                Ok(vectors) => vectors.into_iter().next().and_then(|v| self.validate(v)),
                Err(e) => {
                    tracing::warn!(error = %e, "embedding failed for one item");
                    None
                }
            };
            out.push(slot);
        }
        out
    }

    /// Validate a raw provider vector against the declared dimension.
    /// A wrong-dimension vector is a failure, not a usable result.
    fn validate(&self, vector: Vec<f32>) -> Option<Embedding> {
        match Embedding::new(vector, self.dims()) {
            Ok(e) => Some(e),
            Err(err) => {
                tracing::warn!(error = %err, "discarding embedding with wrong dimension");
                None
            }
        }
    }

    /// Call the embeddings endpoint with retry/backoff, returning raw
    /// vectors in input order.
    async fn call_provider(
        &self,
        texts: &[String],
        model: &str,
    ) -> Result<Vec<Vec<f32>>, CoreError> {
        let api_key = std::env::var(API_KEY_ENV)
            .map_err(|_| CoreError::ProviderUnavailable(format!("{} not set", API_KEY_ENV)))?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(self.config.timeout_secs))
            .build()
            .map_err(|e| CoreError::ProviderUnavailable(e.to_string()))?;

        let url = format!("{}/embeddings", self.config.base_url.trim_end_matches('/'));
        let body = serde_json::json!({
            "model": model,
            "input": texts,
        });

        let mut last_err: Option<CoreError> = None;

        for attempt in 0..=self.config.max_retries {
            if attempt > 0 {
                // Exponential backoff: 1s, 2s, 4s, 8s, ...
                let delay = Duration::from_secs(1 << (attempt - 1).min(5));
                tokio::time::sleep(delay).await;
            }

            let resp = client
                .post(&url)
                .header("Authorization", format!("Bearer {}", api_key))
                .header("Content-Type", "application/json")
                .json(&body)
                .send()
                .await;

            match resp {
                Ok(response) => {
                    let status = response.status();

                    if status.is_success() {
                        let json: serde_json::Value = response.json().await.map_err(|e| {
                            CoreError::ProviderMalformedResponse(e.to_string())
                        })?;
                        return parse_embeddings_response(&json);
                    }

                    // Rate limited or server error: retry
                    if status.as_u16() == 429 || status.is_server_error() {
                        let body_text = response.text().await.unwrap_or_default();
                        last_err = Some(CoreError::ProviderUnavailable(format!(
                            "provider error {}: {}",
                            status, body_text
                        )));
                        continue;
                    }

                    // Client error (not 429): don't retry
                    let body_text = response.text().await.unwrap_or_default();
                    return Err(CoreError::ProviderMalformedResponse(format!(
                        "provider error {}: {}",
                        status, body_text
                    )));
                }
                Err(e) => {
                    last_err = Some(CoreError::ProviderUnavailable(e.to_string()));
                    continue;
                }
            }
        }

        Err(last_err.unwrap_or_else(|| {
            CoreError::ProviderUnavailable("embedding failed after retries".to_string())
        }))
    }
}

/// Parse the embeddings API response JSON.
///
/// Extracts the `data[].embedding` arrays and returns them ordered by the
/// `data[].index` field so output order always matches input order.
fn parse_embeddings_response(json: &serde_json::Value) -> Result<Vec<Vec<f32>>, CoreError> {
    let data = json
        .get("data")
        .and_then(|d| d.as_array())
        .ok_or_else(|| {
            CoreError::ProviderMalformedResponse("missing data array".to_string())
        })?;

    let mut indexed: Vec<(usize, Vec<f32>)> = Vec::with_capacity(data.len());

    for (position, item) in data.iter().enumerate() {
        let embedding = item
            .get("embedding")
            .and_then(|e| e.as_array())
            .ok_or_else(|| {
                CoreError::ProviderMalformedResponse("missing embedding field".to_string())
            })?;

        let vector: Vec<f32> = embedding
            .iter()
            .map(|v| v.as_f64().unwrap_or(0.0) as f32)
            .collect();

        let index = item
            .get("index")
            .and_then(|i| i.as_u64())
            .map(|i| i as usize)
            .unwrap_or(position);

        indexed.push((index, vector));
    }

    indexed.sort_by_key(|(i, _)| *i);
    Ok(indexed.into_iter().map(|(_, v)| v).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn disabled_config() -> EmbeddingConfig {
        EmbeddingConfig::default()
    }

    #[test]
    fn test_disabled_provider_is_unavailable() {
        let orch = EmbeddingOrchestrator::new(&disabled_config());
        assert!(!orch.is_available());
    }

    #[tokio::test]
    async fn test_batch_against_disabled_provider_yields_all_none() {
        let orch = EmbeddingOrchestrator::new(&disabled_config());
        let out = orch
            .embed_batch(&["a".to_string(), "b".to_string()])
            .await;
        assert_eq!(out.len(), 2);
        assert!(out.iter().all(|o| o.is_none()));
    }

    #[tokio::test]
    async fn test_empty_batch() {
        let orch = EmbeddingOrchestrator::new(&disabled_config());
        assert!(orch.embed_batch(&[]).await.is_empty());
    }

    #[tokio::test]
    async fn test_embed_query_unavailable_is_error_not_panic() {
        let orch = EmbeddingOrchestrator::new(&disabled_config());
        let err = orch.embed_query("sample query").await.unwrap_err();
        assert!(matches!(err, CoreError::ProviderUnavailable(_)));
    }

    #[test]
    fn test_parse_response_reorders_by_index() {
        let json = serde_json::json!({
            "data": [
                { "index": 1, "embedding": [0.5, 0.5] },
                { "index": 0, "embedding": [1.0, 0.0] }
            ]
        });
        let vectors = parse_embeddings_response(&json).unwrap();
        assert_eq!(vectors[0], vec![1.0, 0.0]);
        assert_eq!(vectors[1], vec![0.5, 0.5]);
    }

    #[test]
    fn test_parse_response_missing_data_is_malformed() {
        let json = serde_json::json!({ "unexpected": true });
        assert!(matches!(
            parse_embeddings_response(&json),
            Err(CoreError::ProviderMalformedResponse(_))
        ));
    }
}
