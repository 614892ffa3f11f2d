use async_trait::async_trait;
use serde_json::{json, Value};

use super::{chat_completions_url, post_chat_completion, system_prompt, Provider, ProviderKind};
use crate::config::{
    ProviderConfig, DEFAULT_OPENAI_BASE, DEFAULT_OPENAI_LOCAL_MODEL, DEFAULT_OPENAI_MODEL,
};
use crate::error::Result;
use crate::models::{Message, Role};
use crate::telemetry;

const MAX_TOKENS: u32 = 1024;

/**
 * \brief OpenAI chat completions, hosted or local (Ollama, LM Studio, vLLM ...).
 */
#[derive(Debug, Clone)]
pub struct OpenAiCompatProvider {
    client: reqwest::Client,
    api_base: String,
    api_key: Option<String>,
    model: String,
}

impl OpenAiCompatProvider {
    pub fn from_config(cfg: &ProviderConfig) -> Self {
        let model = match &cfg.openai_base_url {
            Some(_) => cfg
                .openai_local_model
                .clone()
                .unwrap_or_else(|| DEFAULT_OPENAI_LOCAL_MODEL.to_string()),
            None => cfg
                .openai_model
                .clone()
                .unwrap_or_else(|| DEFAULT_OPENAI_MODEL.to_string()),
        };
        Self {
            client: reqwest::Client::new(),
            api_base: cfg
                .openai_base_url
                .clone()
                .unwrap_or_else(|| DEFAULT_OPENAI_BASE.to_string()),
            api_key: cfg.openai_api_key.clone(),
            model,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub(crate) fn build_body(
        &self,
        conversation: &[Message],
        instruction: &str,
        language: &str,
    ) -> Value {
        let mut messages = vec![json!({
            "role": "system",
            "content": system_prompt(instruction, language),
        })];
        messages.extend(conversation.iter().filter_map(chat_message));
        json!({
            "model": self.model,
            "messages": messages,
            "max_tokens": MAX_TOKENS,
            "stream": false,
        })
    }
}

#[async_trait]
impl Provider for OpenAiCompatProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::OpenAiCompat
    }

    async fn translate(
        &self,
        conversation: &[Message],
        instruction: &str,
        language: &str,
    ) -> Result<String> {
        let body = self.build_body(conversation, instruction, language);
        telemetry::log_event(
            "llm.openai-compat",
            &format!(
                "base={} model={} msgs={}",
                self.api_base,
                self.model,
                conversation.len()
            ),
        );
        post_chat_completion(
            &self.client,
            self.kind(),
            &chat_completions_url(&self.api_base),
            self.api_key.as_deref(),
            &body,
        )
        .await
    }
}

/**
 * \brief None when the message has nothing to send (no images, no non-empty text).
 */
fn chat_message(msg: &Message) -> Option<Value> {
    match msg.role {
        Role::Assistant => {
            let text = msg.text();
            (!text.is_empty()).then(|| json!({"role": "assistant", "content": text}))
        }
        Role::User => {
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
            (!content.is_empty()).then(|| json!({"role": "user", "content": content}))
        }
    }
}
