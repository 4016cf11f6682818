use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde::Serialize;
use thiserror::Error;

/// Failures of the quiz generation pipeline.
#[derive(Debug, Clone, Error)]
pub enum GenerationError {
    #[error("model output is not a valid JSON quiz array: {0}")]
    MalformedOutput(String),

    #[error("invalid quiz item: {0}")]
    InvalidItem(String),

    #[error("invalid answer format: {0}")]
    InvalidAnswer(String),

    #[error("model service call failed: {0}")]
    Upstream(String),

    #[error("generation timed out after {0} seconds")]
    TimedOut(u64),

    #[error("failed after {attempts} attempts: {last}")]
    RetriesExhausted {
        attempts: u32,
        last: Box<GenerationError>,
    },
}

impl GenerationError {
    /// Parse and validation failures are worth another attempt, transport failures are not.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            GenerationError::MalformedOutput(_)
                | GenerationError::InvalidItem(_)
                | GenerationError::InvalidAnswer(_)
        )
    }

    pub fn user_message(&self) -> &'static str {
        match self {
            GenerationError::RetriesExhausted { .. } => {
                "Quiz generation failed after multiple attempts"
            }
            GenerationError::MalformedOutput(_) => "The AI service returned malformed output",
            GenerationError::InvalidItem(_) | GenerationError::InvalidAnswer(_) => {
                "The AI service produced an invalid answer format"
            }
            GenerationError::Upstream(_) => "The AI service is unavailable",
            GenerationError::TimedOut(_) => "Quiz generation timed out",
        }
    }
}

impl From<async_openai::error::OpenAIError> for GenerationError {
    fn from(err: async_openai::error::OpenAIError) -> Self {
        GenerationError::Upstream(err.to_string())
    }
}

#[derive(Debug, Clone, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Quiz generation error: {0}")]
    Generation(#[from] GenerationError),

    #[error("Internal server error: {0}")]
    InternalError(String),
}

impl AppError {
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Conflict(_) => "CONFLICT",
            AppError::ValidationError(_) => "VALIDATION_ERROR",
            AppError::DatabaseError(_) => "DATABASE_ERROR",
            AppError::Unauthorized(_) => "UNAUTHORIZED",
            AppError::Forbidden(_) => "FORBIDDEN",
            AppError::Generation(_) => "GENERATION_ERROR",
            AppError::InternalError(_) => "INTERNAL_ERROR",
        }
    }

    fn body(&self) -> ErrorResponse {
        let code = self.status_code().as_u16();
        match self {
            AppError::Generation(err) => ErrorResponse {
                error: err.user_message().to_string(),
                code,
                detail: Some(err.to_string()),
            },
            AppError::DatabaseError(msg) | AppError::InternalError(msg) => ErrorResponse {
                error: "Internal server error".to_string(),
                code,
                detail: Some(msg.clone()),
            },
            _ => ErrorResponse {
                error: self.to_string(),
                code,
                detail: None,
            },
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AppError::DatabaseError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::Generation(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        if self.status_code().is_server_error() {
            log::error!("{} ({})", self, self.error_code());
        }
        HttpResponse::build(self.status_code()).json(self.body())
    }
}

impl From<mongodb::error::Error> for AppError {
    fn from(err: mongodb::error::Error) -> Self {
        AppError::DatabaseError(err.to_string())
    }
}

impl From<mongodb::bson::ser::Error> for AppError {
    fn from(err: mongodb::bson::ser::Error) -> Self {
        AppError::InternalError(format!("BSON serialization error: {}", err))
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::ValidationError(err.to_string())
    }
}

pub type AppResult<T> = Result<T, AppError>;
