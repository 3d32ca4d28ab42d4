//! Google Gemini embedding provider.
//!
//! Uses the Generative Language REST API batch endpoint
//! (`models/<model>:batchEmbedContents`) with automatic retry and
//! exponential backoff.

use crate::embeddings::provider::EmbeddingProvider;
use async_trait::async_trait;
use docqa_core::{AppError, AppResult};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Maximum retry attempts for failed requests
const MAX_RETRIES: u32 = 3;

/// Initial backoff duration in milliseconds
const INITIAL_BACKOFF_MS: u64 = 200;

/// Request timeout in seconds
const REQUEST_TIMEOUT_SECS: u64 = 60;

/// Maximum texts per batch request, per the API limit
const MAX_BATCH_SIZE: usize = 100;

#[derive(Debug, Serialize)]
struct BatchEmbedRequest {
    requests: Vec<EmbedRequest>,
}

#[derive(Debug, Serialize)]
struct EmbedRequest {
    model: String,
    content: Content,
}

#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
struct Part {
    text: String,
}

#[derive(Debug, Deserialize)]
struct BatchEmbedResponse {
    #[serde(default)]
    embeddings: Vec<Embedding>,
}

#[derive(Debug, Deserialize)]
struct Embedding {
    values: Vec<f32>,
}

/// Gemini embedding provider.
#[derive(Debug)]
pub struct GeminiEmbeddings {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
    dimensions: usize,
}

impl GeminiEmbeddings {
    /// Create a new Gemini embedding provider.
    pub fn new(model: &str, dimensions: usize, api_key: impl Into<String>) -> AppResult<Self> {
        Self::with_base_url(DEFAULT_BASE_URL, model, dimensions, api_key)
    }

    /// Create a provider against a custom base URL.
    pub fn with_base_url(
        base_url: impl Into<String>,
        model: &str,
        dimensions: usize,
        api_key: impl Into<String>,
    ) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| AppError::Embedding(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.into(),
            api_key: api_key.into(),
            model: model.to_string(),
            dimensions,
        })
    }

    async fn embed_batch_with_retries(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        let mut attempt = 0;
        loop {
            match self.embed_batch_once(texts).await {
                Ok(embeddings) => return Ok(embeddings),
                Err(e) => {
                    attempt += 1;
                    if attempt >= MAX_RETRIES {
                        return Err(e);
                    }
                    let backoff_ms = INITIAL_BACKOFF_MS * 2_u64.pow(attempt);
                    warn!(
                        "Embedding request failed (attempt {}/{}), retrying in {}ms: {}",
                        attempt, MAX_RETRIES, backoff_ms, e
                    );
                    tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
                }
            }
        }
    }

    async fn embed_batch_once(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        let url = format!(
            "{}/models/{}:batchEmbedContents?key={}",
            self.base_url, self.model, self.api_key
        );

        let request = BatchEmbedRequest {
            requests: texts
                .iter()
                .map(|text| EmbedRequest {
                    model: format!("models/{}", self.model),
                    content: Content {
                        parts: vec![Part { text: text.clone() }],
                    },
                })
                .collect(),
        };

        debug!("Embedding batch of {} texts via Gemini", texts.len());

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| AppError::Embedding(format!("Failed to reach Gemini API: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::Embedding(format!(
                "Gemini API error ({}): {}",
                status, error_text
            )));
        }

        let body: BatchEmbedResponse = response
            .json()
            .await
            .map_err(|e| AppError::Embedding(format!("Failed to parse Gemini response: {}", e)))?;

        if body.embeddings.len() != texts.len() {
            return Err(AppError::Embedding(format!(
                "Gemini returned {} embeddings for {} texts",
                body.embeddings.len(),
                texts.len()
            )));
        }

        let mut embeddings = Vec::with_capacity(body.embeddings.len());
        for embedding in body.embeddings {
            if embedding.values.len() != self.dimensions {
                return Err(AppError::EmbeddingDimensionMismatch {
                    expected: self.dimensions,
                    actual: embedding.values.len(),
                });
            }
            embeddings.push(embedding.values);
        }

        Ok(embeddings)
    }
}

#[async_trait]
impl EmbeddingProvider for GeminiEmbeddings {
    fn provider_name(&self) -> &str {
        "gemini"
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(vec![]);
        }

        let mut embeddings = Vec::with_capacity(texts.len());
        for batch in texts.chunks(MAX_BATCH_SIZE) {
            let mut batch_embeddings = self.embed_batch_with_retries(batch).await?;
            embeddings.append(&mut batch_embeddings);
        }

        Ok(embeddings)
    }
}
