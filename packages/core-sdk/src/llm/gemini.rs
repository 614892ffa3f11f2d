use async_trait::async_trait;
use serde_json::{json, Value};

use super::{non_empty, read_json, system_prompt, Provider, ProviderKind};
use crate::config::{ProviderConfig, DEFAULT_GEMINI_BASE, DEFAULT_GEMINI_MODEL};
use crate::error::{AnalyzeError, Result};
use crate::models::{Message, Role};
use crate::telemetry;

const TEMPERATURE: f64 = 0.4;

/**
 * \brief Gemini `generateContent`, single non-streaming call.
 */
#[derive(Debug, Clone)]
pub struct GeminiProvider {
    client: reqwest::Client,
    api_base: String,
    api_key: Option<String>,
    model: String,
}

impl GeminiProvider {
    pub fn from_config(cfg: &ProviderConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_base: cfg
                .gemini_base_url
                .clone()
                .unwrap_or_else(|| DEFAULT_GEMINI_BASE.to_string()),
            api_key: cfg.gemini_api_key.clone(),
            model: cfg
                .gemini_model
                .clone()
                .unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string()),
        }
    }

    fn url(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            normalize_gemini_base(&self.api_base),
            self.model
        )
    }

    pub(crate) fn build_body(
        &self,
        conversation: &[Message],
        instruction: &str,
        language: &str,
    ) -> Value {
        let contents: Vec<Value> = conversation
            .iter()
            .filter_map(|msg| {
                let parts = gemini_parts(msg);
                if parts.is_empty() {
                    return None;
                }
                let role = match msg.role {
                    Role::User => "user",
                    Role::Assistant => "model",
                };
                Some(json!({"role": role, "parts": parts}))
            })
            .collect();
        json!({
            "contents": contents,
            "system_instruction": {
                "parts": [{"text": system_prompt(instruction, language)}]
            },
            "generationConfig": {"temperature": TEMPERATURE},
        })
    }
}

#[async_trait]
impl Provider for GeminiProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Gemini
    }

    async fn translate(
        &self,
        conversation: &[Message],
        instruction: &str,
        language: &str,
    ) -> Result<String> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(AnalyzeError::MissingCredential(self.kind()))?;
        let body = self.build_body(conversation, instruction, language);
        telemetry::log_event(
            "llm.gemini",
            &format!("model={} msgs={}", self.model, conversation.len()),
        );
        let resp = self
            .client
            .post(self.url())
            .header("x-goog-api-key", api_key)
            .json(&body)
            .send()
            .await?;
        let v = read_json(self.kind(), resp).await?;
        non_empty(self.kind(), extract_gemini_content(&v))
    }
}

fn gemini_parts(msg: &Message) -> Vec<Value> {
    let mut parts = Vec::new();
    for part in &msg.parts {
        if let Some(image) = &part.image {
            parts.push(json!({
                "inline_data": {"mime_type": image.mime_type, "data": image.data}
            }));
        }
        if let Some(text) = part.text.as_deref().filter(|t| !t.is_empty()) {
            parts.push(json!({"text": text}));
        }
    }
    parts
}

fn normalize_gemini_base(api_base: &str) -> String {
    let trimmed = api_base.trim_end_matches('/');
    if trimmed.ends_with("/v1") || trimmed.ends_with("/v1beta") {
        trimmed.to_string()
    } else {
        format!("{}/v1beta", trimmed)
    }
}

/**
 * \brief Concatenated text of the first candidate.
 */
fn extract_gemini_content(v: &Value) -> String {
    v.get("candidates")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("content"))
        .and_then(|c| c.get("parts"))
        .and_then(|p| p.as_array())
        .map(|parts| {
            parts
                .iter()
                .filter_map(|p| p.get("text").and_then(|t| t.as_str()))
                .collect::<Vec<_>>()
                .join("")
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ImagePayload, Part};
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider(base: &str) -> GeminiProvider {
        GeminiProvider::from_config(&ProviderConfig {
            gemini_api_key: Some("g-key".into()),
            gemini_base_url: Some(base.to_string()),
            ..Default::default()
        })
    }

    #[test]
    fn test_body_maps_roles_and_inline_data() {
        let p = provider("http://unused");
        let conv = vec![
            Message::user(vec![
                Part::image(ImagePayload {
                    data: "AAA".into(),
                    mime_type: "image/png".into(),
                }),
                Part::text("What is this?"),
            ]),
            Message::assistant("A lighthouse."),
            Message::user(vec![Part::text("Any people?")]),
        ];
        let body = p.build_body(&conv, "Describe.", "Spanish");
        let contents = body["contents"].as_array().unwrap();
        assert_eq!(contents.len(), 3);
        assert_eq!(contents[0]["parts"][0]["inline_data"]["mime_type"], "image/png");
        assert_eq!(contents[0]["parts"][0]["inline_data"]["data"], "AAA");
        assert_eq!(contents[0]["parts"][1]["text"], "What is this?");
        assert_eq!(contents[1]["role"], "model");
        assert_eq!(body["generationConfig"]["temperature"], TEMPERATURE);
        assert!(body["system_instruction"]["parts"][0]["text"]
            .as_str()
            .unwrap()
            .ends_with("Spanish."));
    }

    #[test]
    fn test_normalize_base() {
        assert_eq!(
            normalize_gemini_base("https://generativelanguage.googleapis.com/"),
            "https://generativelanguage.googleapis.com/v1beta"
        );
        assert_eq!(normalize_gemini_base("http://proxy/v1"), "http://proxy/v1");
    }

    #[test]
    fn test_extract_first_candidate_only() {
        let v = json!({"candidates": [
            {"content": {"parts": [{"text": "one "}, {"text": "two"}]}},
            {"content": {"parts": [{"text": "ignored"}]}}
        ]});
        assert_eq!(extract_gemini_content(&v), "one two");
        assert_eq!(extract_gemini_content(&json!({})), "");
    }

    #[tokio::test]
    async fn test_translate_calls_generate_content() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(format!("/v1beta/models/{}:generateContent", DEFAULT_GEMINI_MODEL)))
            .and(header("x-goog-api-key", "g-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{"content": {"role": "model", "parts": [{"text": "Un faro."}]}}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let text = provider(&server.uri())
            .translate(&[Message::user(vec![Part::text("hi")])], "Describe.", "Spanish")
            .await
            .expect("translate");
        assert_eq!(text, "Un faro.");

        let requests = server.received_requests().await.expect("recorded requests");
        assert!(requests[0].url.query().is_none());
    }

    #[tokio::test]
    async fn test_transport_error_does_not_reveal_key() {
        let p = GeminiProvider::from_config(&ProviderConfig {
            gemini_api_key: Some("SECRET-KEY-123".into()),
            gemini_base_url: Some("http://127.0.0.1:1".into()),
            ..Default::default()
        });
        let err = p
            .translate(&[Message::user(vec![Part::text("hi")])], "x", "English")
            .await
            .unwrap_err();
        assert!(matches!(err, AnalyzeError::Http(_)));
        let text = err.to_string();
        assert!(!text.contains("SECRET-KEY-123"));
        assert!(!text.contains("127.0.0.1"));
    }

    #[tokio::test]
    async fn test_no_candidates_is_empty_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"candidates": []})))
            .mount(&server)
            .await;

        let err = provider(&server.uri())
            .translate(&[Message::user(vec![Part::text("hi")])], "x", "English")
            .await
            .unwrap_err();
        assert!(matches!(err, AnalyzeError::EmptyResponse(ProviderKind::Gemini)));
    }
}
