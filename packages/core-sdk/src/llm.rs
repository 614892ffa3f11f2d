use std::fmt;

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use serde::Serialize;
use serde_json::Value;

use crate::error::{AnalyzeError, Result};
use crate::models::Message;
use crate::telemetry;

pub mod gemini;
pub mod hosted_inference;
pub mod openai_compat;

pub use gemini::GeminiProvider;
pub use hosted_inference::HostedInferenceProvider;
pub use openai_compat::OpenAiCompatProvider;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProviderKind {
    HostedInference,
    OpenAiCompat,
    Gemini,
}

impl ProviderKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::HostedInference => "Hugging Face inference",
            Self::OpenAiCompat => "OpenAI-compatible",
            Self::Gemini => "Gemini",
        }
    }

    fn category(&self) -> &'static str {
        match self {
            Self::HostedInference => "llm.hosted-inference",
            Self::OpenAiCompat => "llm.openai-compat",
            Self::Gemini => "llm.gemini",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/**
 * \brief Translate a conversation into one provider's wire format, call it and return plain text.
 */
#[async_trait]
pub trait Provider: Send + Sync {
    fn kind(&self) -> ProviderKind;

    async fn translate(
        &self,
        conversation: &[Message],
        instruction: &str,
        language: &str,
    ) -> Result<String>;
}

/**
 * \brief System prompt sent to every provider: the instruction plus the target language.
 */
pub fn system_prompt(instruction: &str, language: &str) -> String {
    let instruction = instruction.trim_end();
    if instruction.is_empty() {
        format!("Respond in {}.", language)
    } else {
        format!("{}\n\nRespond in {}.", instruction, language)
    }
}

/**
 * \brief `{base}/v1/chat/completions`, tolerating a base that already ends in `/v1`.
 */
pub(crate) fn chat_completions_url(base: &str) -> String {
    let trimmed = base.trim_end_matches('/');
    if trimmed.ends_with("/v1") {
        format!("{}/chat/completions", trimmed)
    } else {
        format!("{}/v1/chat/completions", trimmed)
    }
}

/**
 * \brief POST an OpenAI-style chat body and extract the first choice's text.
 */
pub(crate) async fn post_chat_completion(
    client: &reqwest::Client,
    kind: ProviderKind,
    url: &str,
    api_key: Option<&str>,
    body: &Value,
) -> Result<String> {
    let mut req = client
        .post(url)
        .header(CONTENT_TYPE, "application/json")
        .json(body);
    if let Some(key) = api_key {
        req = req.header(AUTHORIZATION, format!("Bearer {}", key));
    }
    let resp = req.send().await?;
    let v = read_json(kind, resp).await?;
    non_empty(kind, extract_openai_content(&v))
}

pub(crate) async fn read_json(kind: ProviderKind, resp: reqwest::Response) -> Result<Value> {
    if !resp.status().is_success() {
        let status = resp.status();
        let text = resp.text().await.unwrap_or_default();
        telemetry::log_error(kind.category(), &format!("{} -> {}", status, text));
        return Err(AnalyzeError::provider(kind, format!("{} -> {}", status, text)));
    }
    resp.json()
        .await
        .map_err(|e| {
            AnalyzeError::provider(kind, format!("malformed response: {}", e.without_url()))
        })
}

pub(crate) fn non_empty(kind: ProviderKind, text: String) -> Result<String> {
    if text.trim().is_empty() {
        Err(AnalyzeError::EmptyResponse(kind))
    } else {
        Ok(text)
    }
}

/**
 * \brief `choices[0].message.content`, either a string or an array of text blocks.
 */
pub(crate) fn extract_openai_content(v: &Value) -> String {
    let content = v
        .get("choices")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("message"))
        .and_then(|m| m.get("content"));
    match content {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Array(blocks)) => blocks
            .iter()
            .filter_map(|b| b.get("text").and_then(|t| t.as_str()))
            .collect::<Vec<_>>()
            .join(""),
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_system_prompt_appends_language() {
        assert_eq!(
            system_prompt("Describe.", "French"),
            "Describe.\n\nRespond in French."
        );
        assert!(system_prompt("Describe.", "French").ends_with("French."));
    }

    #[test]
    fn test_system_prompt_with_blank_instruction() {
        assert_eq!(system_prompt("  ", "Klingon"), "Respond in Klingon.");
    }

    #[test]
    fn test_chat_completions_url_variants() {
        assert_eq!(
            chat_completions_url("http://localhost:11434"),
            "http://localhost:11434/v1/chat/completions"
        );
        assert_eq!(
            chat_completions_url("http://localhost:11434/v1/"),
            "http://localhost:11434/v1/chat/completions"
        );
    }

    #[test]
    fn test_extract_openai_content_shapes() {
        let plain = json!({"choices": [{"message": {"content": "hello"}}]});
        assert_eq!(extract_openai_content(&plain), "hello");

        let blocks = json!({"choices": [{"message": {"content": [
            {"type": "text", "text": "a"},
            {"type": "text", "text": "b"}
        ]}}]});
        assert_eq!(extract_openai_content(&blocks), "ab");

        assert_eq!(extract_openai_content(&json!({"choices": []})), "");
    }

    #[test]
    fn test_non_empty_rejects_whitespace() {
        assert!(matches!(
            non_empty(ProviderKind::Gemini, " \n".into()),
            Err(AnalyzeError::EmptyResponse(ProviderKind::Gemini))
        ));
    }
}
