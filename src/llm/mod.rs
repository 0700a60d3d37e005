pub mod providers;

use crate::config::LlmConfig;
use async_trait::async_trait;
use tracing::{info, warn};

#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("LLM connection error: {0}")]
    ConnectionError(String),
    #[error("LLM response error: {0}")]
    ResponseError(String),
    #[error("LLM configuration error: {0}")]
    ConfigError(String),
    #[error("LLM returned an empty response")]
    EmptyResponse,
}

/// Prompt sent by the default health check.
pub const HEALTH_PROMPT: &str = "Respond 'OK' if the service works correctly";

/// A language model completion endpoint: prompt in, text out.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, LlmError>;

    fn name(&self) -> &str;

    /// Reachable iff the model answers the probe with something containing "ok".
    async fn health_check(&self) -> bool {
        match self.generate(HEALTH_PROMPT).await {
            Ok(text) if text.to_lowercase().contains("ok") => {
                info!("{} connection verified", self.name());
                true
            }
            Ok(_) => {
                warn!("{} responds but the response is unexpected", self.name());
                false
            }
            Err(e) => {
                warn!("{} health check failed: {}", self.name(), e);
                false
            }
        }
    }
}

/// Rejects blank completions so callers never see an empty answer.
pub(crate) fn non_empty(text: String) -> Result<String, LlmError> {
    if text.trim().is_empty() {
        Err(LlmError::EmptyResponse)
    } else {
        Ok(text)
    }
}

pub struct LlmManager {
    generator: Box<dyn TextGenerator>,
}

impl LlmManager {
    pub fn new(config: &LlmConfig) -> Result<Self, LlmError> {
        let generator: Box<dyn TextGenerator> = match config.backend.as_str() {
            "gemini" => Box::new(providers::gemini::GeminiProvider::new(config)?),
            "remote" => Box::new(providers::remote::RemoteLlmProvider::new(config)?),
            "ollama" => Box::new(providers::ollama::OllamaProvider::new(config)?),
            _ => {
                return Err(LlmError::ConfigError(format!(
                    "Unsupported LLM backend: {}",
                    config.backend
                )))
            }
        };

        info!(
            "LLM client initialized (backend: {}, model: {})",
            config.backend, config.model
        );
        Ok(Self { generator })
    }
}

#[async_trait]
impl TextGenerator for LlmManager {
    async fn generate(&self, prompt: &str) -> Result<String, LlmError> {
        self.generator.generate(prompt).await
    }

    fn name(&self) -> &str {
        self.generator.name()
    }

    async fn health_check(&self) -> bool {
        self.generator.health_check().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn llm_config(backend: &str, api_key: Option<&str>) -> LlmConfig {
        LlmConfig {
            backend: backend.to_string(),
            model: "test-model".to_string(),
            api_key: api_key.map(str::to_string),
            api_url: None,
            temperature: 0.1,
            timeout_secs: 5,
        }
    }

    struct Canned(&'static str);

    #[async_trait]
    impl TextGenerator for Canned {
        async fn generate(&self, _prompt: &str) -> Result<String, LlmError> {
            Ok(self.0.to_string())
        }

        fn name(&self) -> &str {
            "canned"
        }
    }

    #[test]
    fn test_unknown_backend_rejected() {
        let result = LlmManager::new(&llm_config("carrier-pigeon", None));
        assert!(matches!(result, Err(LlmError::ConfigError(_))));
    }

    #[test]
    fn test_gemini_requires_api_key() {
        assert!(matches!(
            LlmManager::new(&llm_config("gemini", None)),
            Err(LlmError::ConfigError(_))
        ));
        assert!(LlmManager::new(&llm_config("gemini", Some("key-123"))).is_ok());
    }

    #[test]
    fn test_ollama_needs_no_credentials() {
        let manager = LlmManager::new(&llm_config("ollama", None)).unwrap();
        assert_eq!(manager.name(), "ollama");
    }

    #[tokio::test]
    async fn test_default_health_check() {
        assert!(Canned("OK").health_check().await);
        assert!(Canned("ok, all good").health_check().await);
        assert!(!Canned("nope").health_check().await);
    }

    #[test]
    fn test_non_empty() {
        assert!(matches!(non_empty("  \n".to_string()), Err(LlmError::EmptyResponse)));
        assert_eq!(non_empty("hi".to_string()).unwrap(), "hi");
    }
}
