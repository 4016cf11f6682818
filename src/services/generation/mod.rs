pub mod letter;
pub mod payload;

use std::{sync::Arc, time::Duration};

use crate::{
    config::Config,
    constants::quiz_prompt::build_quiz_prompt,
    errors::GenerationError,
    models::dto::quiz_dto::GeneratedQuizItem,
    services::model_service::TextGenerator,
};

#[derive(Clone, Debug, PartialEq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
    pub base_temperature: f32,
    pub temperature_step: f32,
}

impl RetryPolicy {
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_attempts: config.generation_max_attempts.max(1),
            delay: config.generation_retry_delay(),
            base_temperature: config.generation_base_temperature,
            temperature_step: config.generation_temperature_step,
        }
    }

    /// Attempts are 1-based; each retry samples slightly hotter.
    pub fn temperature_for(&self, attempt: u32) -> f32 {
        self.base_temperature + self.temperature_step * attempt.saturating_sub(1) as f32
    }
}

/// Lecture text in, one validated batch of questions out.
pub struct QuizGenerator {
    model: Arc<dyn TextGenerator>,
    policy: RetryPolicy,
    batch_size: usize,
    language: String,
    timeout: Duration,
}

impl QuizGenerator {
    pub fn new(model: Arc<dyn TextGenerator>, config: &Config) -> Self {
        Self {
            model,
            policy: RetryPolicy::from_config(config),
            batch_size: config.quiz_batch_size,
            language: config.quiz_language.clone(),
            timeout: config.generation_timeout(),
        }
    }

    /// Runs the retry loop under the overall timeout. Dropping the future abandons it.
    pub async fn generate(&self, content: &str) -> Result<Vec<GeneratedQuizItem>, GenerationError> {
        match tokio::time::timeout(self.timeout, self.generate_with_retries(content)).await {
            Ok(result) => result,
            Err(_) => {
                log::warn!("Quiz generation timed out after {:?}", self.timeout);
                Err(GenerationError::TimedOut(self.timeout.as_secs()))
            }
        }
    }

    async fn generate_with_retries(
        &self,
        content: &str,
    ) -> Result<Vec<GeneratedQuizItem>, GenerationError> {
        let prompt = build_quiz_prompt(content, self.batch_size, &self.language);
        let mut attempt = 1;

        loop {
            let temperature = self.policy.temperature_for(attempt);
            log::info!(
                "Generating quizzes (attempt {}/{}, temperature {:.2})",
                attempt,
                self.policy.max_attempts,
                temperature
            );

            let result = match self.model.generate(&prompt, temperature).await {
                Ok(raw) => payload::parse_quiz_batch(&raw, self.batch_size),
                Err(err) => Err(err),
            };

            let err = match result {
                Ok(items) => {
                    log::info!("Generated {} quizzes on attempt {}", items.len(), attempt);
                    return Ok(items);
                }
                Err(err) => err,
            };

            if !err.is_retryable() {
                log::error!("Quiz generation failed without retry: {}", err);
                return Err(err);
            }

            if attempt >= self.policy.max_attempts {
                log::error!("Quiz generation failed after {} attempts: {}", attempt, err);
                return Err(GenerationError::RetriesExhausted {
                    attempts: attempt,
                    last: Box::new(err),
                });
            }

            log::warn!("Attempt {} produced an unusable batch, retrying: {}", attempt, err);
            if !self.policy.delay.is_zero() {
                tokio::time::sleep(self.policy.delay).await;
            }
            attempt += 1;
        }
    }
}
