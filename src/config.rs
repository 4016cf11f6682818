use std::{env, time::Duration};

use secrecy::SecretString;

use crate::models::domain::OptionLetter;

const DEV_JWT_SECRET: &str = "dev_secret_key_change_in_production";

/// What to do with a submitted answer that matches neither an option text nor a letter.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnresolvedAnswerPolicy {
    Reject,
    DefaultTo(OptionLetter),
}

impl UnresolvedAnswerPolicy {
    fn from_env_value(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "default" => UnresolvedAnswerPolicy::DefaultTo(OptionLetter::A),
            _ => UnresolvedAnswerPolicy::Reject,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Config {
    pub app_env: String,
    pub mongo_conn_string: String,
    pub mongo_db_name: String,
    pub mongo_max_pool_size: u32,
    pub web_server_host: String,
    pub web_server_port: u16,
    pub jwt_secret: SecretString,
    pub ai_api_base: String,
    pub ai_api_key: SecretString,
    pub ai_model: String,
    pub ai_max_tokens: u32,
    pub quiz_language: String,
    pub quiz_batch_size: usize,
    pub generation_max_attempts: u32,
    pub generation_retry_delay_ms: u64,
    pub generation_base_temperature: f32,
    pub generation_temperature_step: f32,
    pub generation_timeout_secs: u64,
    pub stats_views_enabled: bool,
    pub upload_root: String,
    pub unresolved_answer_policy: UnresolvedAnswerPolicy,
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            app_env: env_or("APP_ENV", "development"),
            mongo_conn_string: env_or("MONGO_CONN_STRING", "mongodb://localhost:27017"),
            mongo_db_name: env_or("MONGO_DB_NAME", "popquiz-local"),
            mongo_max_pool_size: env_parse("MONGO_MAX_POOL_SIZE", 10),
            web_server_host: env_or("WEB_SERVER_HOST", "localhost"),
            web_server_port: env_parse("WEB_SERVER_PORT", 3001),
            jwt_secret: SecretString::from(env_or("JWT_SECRET", DEV_JWT_SECRET)),
            ai_api_base: env_or("AI_API_BASE", "https://api.deepseek.com/v1"),
            ai_api_key: SecretString::from(env_or("AI_API_KEY", "")),
            ai_model: env_or("AI_MODEL", "deepseek-chat"),
            ai_max_tokens: env_parse("AI_MAX_TOKENS", 4000),
            quiz_language: env_or("QUIZ_LANGUAGE", "Chinese"),
            quiz_batch_size: env_parse("QUIZ_BATCH_SIZE", 5),
            generation_max_attempts: env_parse::<u32>("GENERATION_MAX_ATTEMPTS", 4).max(1),
            generation_retry_delay_ms: env_parse("GENERATION_RETRY_DELAY_MS", 1000),
            generation_base_temperature: env_parse("GENERATION_BASE_TEMPERATURE", 0.6),
            generation_temperature_step: env_parse("GENERATION_TEMPERATURE_STEP", 0.1),
            generation_timeout_secs: env_parse("GENERATION_TIMEOUT_SECS", 180),
            stats_views_enabled: env_parse("STATS_VIEWS_ENABLED", true),
            upload_root: env_or("UPLOAD_ROOT", "uploads"),
            unresolved_answer_policy: UnresolvedAnswerPolicy::from_env_value(&env_or(
                "UNRESOLVED_ANSWER_POLICY",
                "reject",
            )),
        }
    }

    pub fn is_production(&self) -> bool {
        self.app_env.eq_ignore_ascii_case("production")
    }

    pub fn generation_retry_delay(&self) -> Duration {
        Duration::from_millis(self.generation_retry_delay_ms)
    }

    pub fn generation_timeout(&self) -> Duration {
        Duration::from_secs(self.generation_timeout_secs)
    }

    /// Validate that production-critical configuration is set
    /// Panics if required secrets are using default values
    pub fn validate_for_production(&self) {
        use secrecy::ExposeSecret;

        let jwt_secret = self.jwt_secret.expose_secret();

        if jwt_secret == DEV_JWT_SECRET {
            panic!(
                "FATAL: JWT_SECRET is using default value! Set JWT_SECRET environment variable to a secure random string."
            );
        }

        if jwt_secret.len() < 32 {
            panic!(
                "FATAL: JWT_SECRET is too short ({}). Must be at least 32 characters for security.",
                jwt_secret.len()
            );
        }

        if self.ai_api_key.expose_secret().is_empty() {
            panic!("FATAL: AI_API_KEY is not set! Quiz generation cannot reach the model service.");
        }
    }

    #[cfg(test)]
    pub fn test_config() -> Self {
        Self {
            app_env: "test".to_string(),
            mongo_conn_string: "mongodb://localhost:27017".to_string(),
            mongo_db_name: "popquiz-test".to_string(),
            mongo_max_pool_size: 2,
            web_server_host: "127.0.0.1".to_string(),
            web_server_port: 3001,
            jwt_secret: SecretString::from("test_jwt_secret_key".to_string()),
            ai_api_base: "http://localhost:9999/v1".to_string(),
            ai_api_key: SecretString::from("test-key".to_string()),
            ai_model: "deepseek-chat".to_string(),
            ai_max_tokens: 4000,
            quiz_language: "Chinese".to_string(),
            quiz_batch_size: 5,
            generation_max_attempts: 4,
            generation_retry_delay_ms: 0,
            generation_base_temperature: 0.6,
            generation_temperature_step: 0.1,
            generation_timeout_secs: 5,
            stats_views_enabled: false,
            upload_root: "uploads".to_string(),
            unresolved_answer_policy: UnresolvedAnswerPolicy::Reject,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_from_env_with_defaults() {
        let config = Config::from_env();

        assert!(!config.mongo_conn_string.is_empty());
        assert!(!config.mongo_db_name.is_empty());
        assert!(config.generation_max_attempts >= 1);
    }

    #[test]
    fn test_test_config() {
        let config = Config::test_config();

        assert_eq!(config.mongo_db_name, "popquiz-test");
        assert_eq!(config.quiz_batch_size, 5);
        assert_eq!(config.generation_max_attempts, 4);
        assert!(!config.is_production());
    }

    #[test]
    fn unresolved_answer_policy_defaults_to_reject() {
        assert_eq!(
            UnresolvedAnswerPolicy::from_env_value("reject"),
            UnresolvedAnswerPolicy::Reject
        );
        assert_eq!(
            UnresolvedAnswerPolicy::from_env_value("anything-else"),
            UnresolvedAnswerPolicy::Reject
        );
        assert_eq!(
            UnresolvedAnswerPolicy::from_env_value(" Default "),
            UnresolvedAnswerPolicy::DefaultTo(OptionLetter::A)
        );
    }

    #[test]
    #[should_panic(expected = "JWT_SECRET is using default value")]
    fn production_validation_rejects_dev_secret() {
        let mut config = Config::test_config();
        config.jwt_secret = SecretString::from(DEV_JWT_SECRET.to_string());
        config.validate_for_production();
    }
}
