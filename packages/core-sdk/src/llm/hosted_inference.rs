use async_trait::async_trait;
use serde_json::{json, Value};

use super::{chat_completions_url, post_chat_completion, system_prompt, Provider, ProviderKind};
use crate::config::{
    ProviderConfig, DEFAULT_HF_BASE, DEFAULT_HF_TEXT_MODEL, DEFAULT_HF_VISION_MODEL,
};
use crate::error::{AnalyzeError, Result};
use crate::models::{latest_user_index, Message, Role};
use crate::telemetry;

const TEXT_MAX_TOKENS: u32 = 512;
const VISION_MAX_TOKENS: u32 = 1024;

/**
 * \brief Hugging Face inference router (OpenAI-style chat completions).
 * \details Only the most recent user message may carry images; everything else is flattened to text.
 */
#[derive(Debug, Clone)]
pub struct HostedInferenceProvider {
    client: reqwest::Client,
    api_base: String,
    api_key: Option<String>,
    text_model: String,
    vision_model: String,
}

impl HostedInferenceProvider {
    pub fn from_config(cfg: &ProviderConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_base: cfg
                .hf_base_url
                .clone()
                .unwrap_or_else(|| DEFAULT_HF_BASE.to_string()),
            api_key: cfg.hf_token.clone(),
            text_model: cfg
                .hf_text_model
                .clone()
                .unwrap_or_else(|| DEFAULT_HF_TEXT_MODEL.to_string()),
            vision_model: cfg
                .hf_vision_model
                .clone()
                .unwrap_or_else(|| DEFAULT_HF_VISION_MODEL.to_string()),
        }
    }

    pub(crate) fn build_body(
        &self,
        conversation: &[Message],
        instruction: &str,
        language: &str,
    ) -> Value {
        let latest = latest_user_index(conversation);
        let vision_idx = latest.filter(|&i| conversation[i].has_image());

        let mut messages = vec![json!({
            "role": "system",
            "content": system_prompt(instruction, language),
        })];
        for (idx, msg) in conversation.iter().enumerate() {
            if Some(idx) == vision_idx {
                messages.push(json!({
                    "role": "user",
                    "content": vision_content(msg),
                }));
                continue;
            }
            let text = msg.text();
            if text.is_empty() {
                continue;
            }
            messages.push(json!({
                "role": role_name(msg.role),
                "content": text,
            }));
        }

        let (model, max_tokens) = if vision_idx.is_some() {
            (&self.vision_model, VISION_MAX_TOKENS)
        } else {
            (&self.text_model, TEXT_MAX_TOKENS)
        };
        json!({
            "model": model,
            "messages": messages,
            "max_tokens": max_tokens,
            "stream": false,
        })
    }
}

#[async_trait]
impl Provider for HostedInferenceProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::HostedInference
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
            "llm.hosted-inference",
            &format!(
                "model={} msgs={}",
                body["model"].as_str().unwrap_or_default(),
                conversation.len()
            ),
        );
        post_chat_completion(
            &self.client,
            self.kind(),
            &chat_completions_url(&self.api_base),
            Some(api_key),
            &body,
        )
        .await
    }
}

fn role_name(role: Role) -> &'static str {
    match role {
        Role::User => "user",
        Role::Assistant => "assistant",
    }
}

/**
 * \brief Content array for the analyzed turn, in part order.
 */
fn vision_content(msg: &Message) -> Vec<Value> {
    let mut content = Vec::new();
    for part in &msg.parts {
        if let Some(image) = &part.image {
            content.push(json!({
                "type": "image_url",
                "image_url": {"url": image.data_uri()},
            }));
        }
        if let Some(text) = part.text.as_deref().filter(|t| !t.is_empty()) {
            content.push(json!({"type": "text", "text": text}));
        }
    }
    content
}
