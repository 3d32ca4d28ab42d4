//! LLM provider factory.
//!
//! Creates LLM clients from a provider name, resolving endpoints and
//! credentials supplied by the caller.

use crate::client::LlmClient;
use crate::providers::{GeminiClient, OllamaClient};
use docqa_core::{AppError, AppResult};
use std::sync::Arc;

/// Create an LLM client based on the provider name.
///
/// # Arguments
/// * `provider` - Provider identifier ("gemini", "ollama")
/// * `endpoint` - Optional custom endpoint URL
/// * `api_key` - Optional API key (required for hosted providers)
///
/// # Errors
/// Returns `AppError::Config` if the provider is unknown or a required
/// API key is missing.
pub fn create_client(
    provider: &str,
    endpoint: Option<&str>,
    api_key: Option<&str>,
) -> AppResult<Arc<dyn LlmClient>> {
    match provider.to_lowercase().as_str() {
        "gemini" => {
            let api_key = api_key.ok_or_else(|| {
                AppError::Config("Gemini provider requires an API key".to_string())
            })?;
            let client = match endpoint {
                Some(url) => GeminiClient::with_base_url(url, api_key)?,
                None => GeminiClient::new(api_key)?,
            };
            Ok(Arc::new(client))
        }
        "ollama" => {
            let client = match endpoint {
                Some(url) => OllamaClient::with_base_url(url)?,
                None => OllamaClient::new()?,
            };
            Ok(Arc::new(client))
        }
        _ => Err(AppError::Config(format!(
            "Unknown provider: {}. Supported: gemini, ollama",
            provider
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_gemini_client() {
        let client = create_client("gemini", None, Some("test-key"));
        assert!(client.is_ok());
        assert_eq!(client.unwrap().provider_name(), "gemini");
    }

    #[test]
    fn test_gemini_requires_api_key() {
        let err = create_client("gemini", None, None).unwrap_err();
        assert!(err.to_string().contains("API key"));
    }

    #[test]
    fn test_create_ollama_client() {
        let client = create_client("ollama", Some("http://localhost:8080"), None);
        assert!(client.is_ok());
    }

    #[test]
    fn test_unknown_provider() {
        let err = create_client("unknown", None, None).unwrap_err();
        assert!(err.to_string().contains("Unknown provider"));
    }
}
