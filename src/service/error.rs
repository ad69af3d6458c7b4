use axum::http::StatusCode;
use thiserror::Error;

use crate::{error::HttpError, models::projectstate::LifecycleError};

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    InvalidState(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Validation(String),

    #[error("Payment gateway error: {0}")]
    Gateway(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl ServiceError {
    pub fn not_found(entity: &str) -> Self {
        ServiceError::NotFound(entity.to_string())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        ServiceError::Forbidden(message.into())
    }

    pub fn invalid_state(message: impl Into<String>) -> Self {
        ServiceError::InvalidState(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        ServiceError::Conflict(message.into())
    }

    pub fn validation(message: impl Into<String>) -> Self {
        ServiceError::Validation(message.into())
    }

    pub fn concurrent_update() -> Self {
        ServiceError::Conflict("Project was modified concurrently, please retry".to_string())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
            ServiceError::Forbidden(_) => StatusCode::FORBIDDEN,
            ServiceError::InvalidState(_)
            | ServiceError::Conflict(_)
            | ServiceError::Validation(_) => StatusCode::BAD_REQUEST,
            ServiceError::Gateway(_) | ServiceError::Database(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<LifecycleError> for ServiceError {
    fn from(error: LifecycleError) -> Self {
        match error {
            LifecycleError::InvalidTransition(message) => ServiceError::InvalidState(message),
            LifecycleError::Invalid(message) => ServiceError::Validation(message),
            LifecycleError::Corrupt(_) => {
                tracing::error!("{}", error);
                ServiceError::InvalidState(error.to_string())
            }
        }
    }
}

impl From<ServiceError> for HttpError {
    fn from(error: ServiceError) -> Self {
        if let ServiceError::Database(ref e) = error {
            tracing::error!("Database error: {}", e);
        }
        HttpError::new(error.to_string(), error.status_code())
    }
}
