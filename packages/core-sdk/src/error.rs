use thiserror::Error;

use crate::llm::ProviderKind;

#[derive(Error, Debug)]
pub enum AnalyzeError {
    #[error(
        "no inference provider configured: required configuration missing, set HF_TOKEN, \
         OPENAI_API_KEY or OPENAI_BASE_URL, or GEMINI_API_KEY"
    )]
    NotConfigured,

    #[error("{0} API key is missing")]
    MissingCredential(ProviderKind),

    #[error("{kind} request failed: {message}")]
    Provider { kind: ProviderKind, message: String },

    #[error("{0} returned an empty response")]
    EmptyResponse(ProviderKind),

    #[error("HTTP error: {0}")]
    Http(reqwest::Error),
}

/** \brief Request URLs can carry credentials, so they never reach the error text. */
impl From<reqwest::Error> for AnalyzeError {
    fn from(err: reqwest::Error) -> Self {
        Self::Http(err.without_url())
    }
}

impl AnalyzeError {
    pub fn provider(kind: ProviderKind, message: impl Into<String>) -> Self {
        Self::Provider {
            kind,
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, AnalyzeError>;
