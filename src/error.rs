use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::{json, Value};
use std::collections::HashMap;
use thiserror::Error;

use crate::database::manager::DatabaseError;
use crate::filter::error::FilterError;
use crate::types::EntityKind;

/// Domain errors raised by the lifecycle, tagging and query layers
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("{0} not found")]
    NotFound(EntityKind),

    #[error("nickname already in use: {0}")]
    DuplicateNickname(String),

    #[error("requester does not own this {0}")]
    AccessDenied(EntityKind),

    #[error("invalid {field}: {message}")]
    Validation { field: &'static str, message: String },

    #[error("nickname or password does not match")]
    InvalidCredentials,

    #[error("internal error: {0}")]
    Internal(String),
}

impl CoreError {
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        CoreError::Validation {
            field,
            message: message.into(),
        }
    }
}

impl From<DatabaseError> for CoreError {
    fn from(err: DatabaseError) -> Self {
        tracing::error!("Storage failure: {}", err);
        CoreError::Internal(err.to_string())
    }
}

impl From<sqlx::Error> for CoreError {
    fn from(err: sqlx::Error) -> Self {
        CoreError::from(DatabaseError::from(err))
    }
}

impl From<FilterError> for CoreError {
    fn from(err: FilterError) -> Self {
        match err {
            FilterError::InvalidPage(msg) => CoreError::validation("page", msg),
            FilterError::InvalidSize(msg) => CoreError::validation("size", msg),
            FilterError::InvalidColumn(msg) => CoreError::Internal(msg),
        }
    }
}

/// HTTP API error with appropriate status codes and client-friendly messages
#[derive(Debug)]
pub enum ApiError {
    // 400 Bad Request
    ValidationError {
        message: String,
        field_errors: Option<HashMap<String, String>>,
    },

    // 401 Unauthorized
    Unauthorized(String),

    // 403 Forbidden
    Forbidden { message: String, code: &'static str },

    // 404 Not Found
    NotFound { message: String, code: &'static str },

    // 409 Conflict
    Conflict { message: String, code: &'static str },

    // 500 Internal Server Error
    InternalServerError(String),
}

impl ApiError {
    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::ValidationError { .. } => 400,
            ApiError::Unauthorized(_) => 401,
            ApiError::Forbidden { .. } => 403,
            ApiError::NotFound { .. } => 404,
            ApiError::Conflict { .. } => 409,
            ApiError::InternalServerError(_) => 500,
        }
    }

    /// Client-safe error message
    pub fn message(&self) -> &str {
        match self {
            ApiError::ValidationError { message, .. } => message,
            ApiError::Unauthorized(msg) => msg,
            ApiError::Forbidden { message, .. } => message,
            ApiError::NotFound { message, .. } => message,
            ApiError::Conflict { message, .. } => message,
            ApiError::InternalServerError(msg) => msg,
        }
    }

    /// Error code for client handling
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::ValidationError { .. } => "VALIDATION_ERROR",
            ApiError::Unauthorized(_) => "UNAUTHORIZED",
            ApiError::Forbidden { code, .. } => code,
            ApiError::NotFound { code, .. } => code,
            ApiError::Conflict { code, .. } => code,
            ApiError::InternalServerError(_) => "INTERNAL_SERVER_ERROR",
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            ApiError::ValidationError { message, field_errors } => {
                let mut response = json!({
                    "success": false,
                    "message": message,
                    "code": "VALIDATION_ERROR"
                });

                if let Some(field_errors) = field_errors {
                    response["field_errors"] = json!(field_errors);
                }

                response
            }
            _ => json!({
                "success": false,
                "message": self.message(),
                "code": self.error_code()
            }),
        }
    }
}

impl ApiError {
    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::Unauthorized(message.into())
    }

    pub fn internal_server_error(message: impl Into<String>) -> Self {
        ApiError::InternalServerError(message.into())
    }

    /// Malformed body, query string or path segment
    pub fn malformed(message: impl Into<String>) -> Self {
        ApiError::ValidationError {
            message: message.into(),
            field_errors: None,
        }
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::NotFound(kind) => ApiError::NotFound {
                message: format!("{} not found", kind),
                code: match kind {
                    EntityKind::Member => "M001",
                    EntityKind::Post => "P001",
                    EntityKind::Comment => "C001",
                    EntityKind::Tag => "T001",
                },
            },
            CoreError::DuplicateNickname(nickname) => ApiError::Conflict {
                message: format!("Nickname '{}' is already in use", nickname),
                code: "M002",
            },
            CoreError::AccessDenied(kind) => ApiError::Forbidden {
                message: format!("Only the author may modify this {}", kind),
                code: match kind {
                    EntityKind::Comment => "C002",
                    _ => "P002",
                },
            },
            CoreError::Validation { field, message } => {
                let mut field_errors = HashMap::new();
                field_errors.insert(field.to_string(), message);
                ApiError::ValidationError {
                    message: "Request validation failed".to_string(),
                    field_errors: Some(field_errors),
                }
            }
            CoreError::InvalidCredentials => ApiError::unauthorized("Nickname or password does not match"),
            CoreError::Internal(msg) => {
                // Don't expose internal details to clients
                tracing::error!("Internal error: {}", msg);
                ApiError::internal_server_error("An error occurred while processing your request")
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::malformed(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::malformed(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::malformed(rejection.body_text())
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self.to_json())).into_response()
    }
}
