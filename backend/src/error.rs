//! Error handling for the Cantina POS backend
//!
//! Every service error is recovered at the request boundary and turned into
//! a structured JSON response.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Authentication errors
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    // Validation errors
    #[error("Validation error: {message}")]
    Validation { field: String, message: String },

    #[error("Validation error: {0}")]
    ValidationError(String),

    // Conflicts
    #[error("Duplicate entry: {0}")]
    DuplicateEntry(String),

    #[error("Conflict: {message}")]
    Conflict { resource: String, message: String },

    #[error("Resource not found: {0}")]
    NotFound(String),

    // Business logic errors
    #[error("Invalid state transition: {0}")]
    InvalidStateTransition(String),

    #[error("Insufficient stock of {ingredient}: available {available}, required {required}")]
    InsufficientStock {
        ingredient: String,
        available: Decimal,
        required: Decimal,
        unit_measure: String,
    },

    // Database errors
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    // Internal errors
    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Internal server error")]
    InternalError(#[from] anyhow::Error),
}

/// Error response body
///
/// Flat shape so clients can read the shortage fields without digging:
/// `{error, message, field?, ingredient?, available?, required?, unit_measure?}`.
#[derive(Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ingredient: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub available: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit_measure: Option<String>,
}

impl ErrorBody {
    fn new(code: &str, message: String) -> Self {
        Self {
            error: code.to_string(),
            message,
            field: None,
            ingredient: None,
            available: None,
            required: None,
            unit_measure: None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            AppError::Unauthorized(message) => (
                StatusCode::UNAUTHORIZED,
                ErrorBody::new("UNAUTHORIZED", message.clone()),
            ),
            AppError::Validation { field, message } => {
                let mut body = ErrorBody::new("VALIDATION_ERROR", message.clone());
                body.field = Some(field.clone());
                (StatusCode::BAD_REQUEST, body)
            }
            AppError::ValidationError(message) => (
                StatusCode::BAD_REQUEST,
                ErrorBody::new("VALIDATION_ERROR", message.clone()),
            ),
            AppError::DuplicateEntry(entity) => (
                StatusCode::CONFLICT,
                ErrorBody::new(
                    "DUPLICATE_ENTRY",
                    format!("A record with this {} already exists", entity),
                ),
            ),
            AppError::Conflict { resource, message } => {
                let mut body = ErrorBody::new("CONFLICT", message.clone());
                body.field = Some(resource.clone());
                (StatusCode::CONFLICT, body)
            }
            AppError::NotFound(resource) => (
                StatusCode::NOT_FOUND,
                ErrorBody::new("NOT_FOUND", format!("{} not found", resource)),
            ),
            AppError::InvalidStateTransition(message) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorBody::new("INVALID_STATE_TRANSITION", message.clone()),
            ),
            AppError::InsufficientStock {
                ingredient,
                available,
                required,
                unit_measure,
            } => {
                let mut body = ErrorBody::new(
                    "INSUFFICIENT_STOCK",
                    format!(
                        "Not enough \"{}\". Available: {}, required: {}",
                        ingredient, available, required
                    ),
                );
                body.ingredient = Some(ingredient.clone());
                body.available = Some(*available);
                body.required = Some(*required);
                body.unit_measure = Some(unit_measure.clone());
                (StatusCode::BAD_REQUEST, body)
            }
            AppError::Database(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorBody::new("DATABASE_ERROR", "A database error occurred".to_string()),
            ),
            AppError::Internal(message) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorBody::new("INTERNAL_ERROR", message.clone()),
            ),
            AppError::InternalError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorBody::new(
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                ),
            ),
        };

        tracing::error!("Error: {:?}", self);

        (status, Json(body)).into_response()
    }
}

/// True when `err` is a Postgres unique violation on the named constraint
pub fn is_unique_violation(err: &sqlx::Error, constraint: &str) -> bool {
    match err {
        sqlx::Error::Database(db) => db.constraint() == Some(constraint),
        _ => false,
    }
}

/// Result type alias for handlers and services
pub type AppResult<T> = Result<T, AppError>;
