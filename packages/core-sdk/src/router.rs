use crate::config::ProviderConfig;
use crate::error::{AnalyzeError, Result};
use crate::llm::{
    GeminiProvider, HostedInferenceProvider, OpenAiCompatProvider, Provider, ProviderKind,
};
use crate::models::Message;
use crate::telemetry;

/**
 * \brief Routes an analysis request to the configured providers in fixed priority order.
 * \details Priority: hosted inference, then OpenAI-compatible, then Gemini. By default only the
 *          first configured provider is called and its error is returned as is; with
 *          `fallback_on_error` the next provider is tried after a failure.
 */
pub struct RequestRouter {
    providers: Vec<Box<dyn Provider>>,
    fallback_on_error: bool,
}

impl RequestRouter {
    pub fn from_config(cfg: &ProviderConfig) -> Self {
        let mut providers: Vec<Box<dyn Provider>> = Vec::new();
        if cfg.hf_enabled() {
            providers.push(Box::new(HostedInferenceProvider::from_config(cfg)));
        }
        if cfg.openai_enabled() {
            providers.push(Box::new(OpenAiCompatProvider::from_config(cfg)));
        }
        if cfg.gemini_enabled() {
            providers.push(Box::new(GeminiProvider::from_config(cfg)));
        }
        Self::with_providers(providers, cfg.fallback_on_error)
    }

    /**
     * \brief Build from an explicit priority list, highest first.
     */
    pub fn with_providers(providers: Vec<Box<dyn Provider>>, fallback_on_error: bool) -> Self {
        Self {
            providers,
            fallback_on_error,
        }
    }

    pub fn providers(&self) -> Vec<ProviderKind> {
        self.providers.iter().map(|p| p.kind()).collect()
    }

    pub fn fallback_on_error(&self) -> bool {
        self.fallback_on_error
    }

    pub fn is_configured(&self) -> bool {
        !self.providers.is_empty()
    }

    pub async fn analyze(
        &self,
        conversation: &[Message],
        instruction: &str,
        language: &str,
    ) -> Result<String> {
        let mut last_err = None;
        for provider in &self.providers {
            telemetry::log_event(
                "router",
                &format!(
                    "provider={} msgs={} language={}",
                    provider.kind(),
                    conversation.len(),
                    language
                ),
            );
            match provider.translate(conversation, instruction, language).await {
                Ok(text) => return Ok(text),
                Err(err) => {
                    telemetry::log_error(
                        "router",
                        &format!("provider={} failed: {}", provider.kind(), err),
                    );
                    if !self.fallback_on_error {
                        return Err(err);
                    }
                    last_err = Some(err);
                }
            }
        }
        Err(last_err.unwrap_or(AnalyzeError::NotConfigured))
    }
}
