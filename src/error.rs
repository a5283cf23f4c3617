//! Error types shared across the recommendation service.

use actix_web::{HttpResponse, ResponseError};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, RecsError>;

#[derive(Error, Debug)]
pub enum RecsError {
    #[error("Failed to load store catalog: {0}")]
    CatalogLoad(String),

    #[error("Store not found: {0}")]
    StoreNotFound(String),

    #[error("Not enough visit data to train the model")]
    InsufficientTrainingData,

    #[error("Visit history unavailable: {0}")]
    DatabaseUnavailable(String),

    #[error("Scoring failed: {0}")]
    Scoring(String),

    #[error("Invalid configuration: {message}")]
    Configuration {
        message: String,
        key: Option<String>,
    },

    #[error("Invalid location: {0}")]
    InvalidLocation(String),
}

impl From<anyhow::Error> for RecsError {
    fn from(err: anyhow::Error) -> Self {
        RecsError::Scoring(err.to_string())
    }
}

impl From<sqlx::Error> for RecsError {
    fn from(err: sqlx::Error) -> Self {
        RecsError::DatabaseUnavailable(err.to_string())
    }
}

impl ResponseError for RecsError {
    fn error_response(&self) -> HttpResponse {
        match self {
            RecsError::InvalidLocation(msg) => HttpResponse::BadRequest().json(serde_json::json!({
                "error": "invalid_location",
                "message": msg
            })),
            RecsError::Configuration { message, key } => {
                HttpResponse::BadRequest().json(serde_json::json!({
                    "error": "invalid_configuration",
                    "message": message,
                    "key": key
                }))
            }
            _ => HttpResponse::InternalServerError().json(serde_json::json!({
                "error": "internal_error",
                "message": "An unexpected error occurred"
            })),
        }
    }
}
