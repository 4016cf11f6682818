use async_openai::{config::OpenAIConfig, Client};
use async_trait::async_trait;
use secrecy::ExposeSecret;
use serde_json::{json, Value};

use crate::{config::Config, errors::GenerationError};

/// A chat model that turns one prompt into raw text.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str, temperature: f32) -> Result<String, GenerationError>;
}

/// OpenAI-compatible chat completions client (DeepSeek by default).
pub struct OpenAiModelService {
    client: Client<OpenAIConfig>,
    model: String,
    max_tokens: u32,
}

impl OpenAiModelService {
    pub fn new(config: &Config) -> Self {
        let openai_config = OpenAIConfig::new()
            .with_api_base(config.ai_api_base.clone())
            .with_api_key(config.ai_api_key.expose_secret().to_string());

        Self {
            client: Client::with_config(openai_config),
            model: config.ai_model.clone(),
            max_tokens: config.ai_max_tokens,
        }
    }
}

fn message_content(response: &Value) -> Result<String, GenerationError> {
    response
        .pointer("/choices/0/message/content")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| {
            GenerationError::MalformedOutput("completion has no message content".to_string())
        })
}

#[async_trait]
impl TextGenerator for OpenAiModelService {
    async fn generate(&self, prompt: &str, temperature: f32) -> Result<String, GenerationError> {
        let request = json!({
            "model": self.model,
            "messages": [{ "role": "user", "content": prompt }],
            "stream": false,
            "temperature": temperature,
            "max_tokens": self.max_tokens,
        });

        let response: Value = self.client.chat().create_byot(request).await?;
        let content = message_content(&response)?;

        log::debug!("Model returned {} characters", content.len());
        Ok(content)
    }
}
