// HTTP API error type. Carries a status class, a stable code string and a
// client-safe message; storage detail is logged here and never exposed.
use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};

use crate::services::error::ServiceError;

#[derive(Debug)]
pub enum ApiError {
    BadRequest { code: &'static str, message: String },
    Unauthorized { code: &'static str, message: String },
    Forbidden { code: &'static str, message: String },
    NotFound { code: &'static str, message: String },
    Internal { code: &'static str, message: String },
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest {
            code: "BAD_REQUEST",
            message: message.into(),
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::Unauthorized {
            code: "UNAUTHORIZED",
            message: message.into(),
        }
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        ApiError::Forbidden {
            code: "FORBIDDEN",
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound {
            code: "NOT_FOUND",
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::Internal {
            code: "INTERNAL_ERROR",
            message: message.into(),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden { .. } => StatusCode::FORBIDDEN,
            ApiError::NotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::BadRequest { code, .. }
            | ApiError::Unauthorized { code, .. }
            | ApiError::Forbidden { code, .. }
            | ApiError::NotFound { code, .. }
            | ApiError::Internal { code, .. } => code,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            ApiError::BadRequest { message, .. }
            | ApiError::Unauthorized { message, .. }
            | ApiError::Forbidden { message, .. }
            | ApiError::NotFound { message, .. }
            | ApiError::Internal { message, .. } => message,
        }
    }

    pub fn to_json(&self) -> Value {
        json!({
            "error": true,
            "message": self.message(),
            "code": self.error_code()
        })
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        let code = err.code();
        match &err {
            ServiceError::MissingRequired(_)
            | ServiceError::DuplicateEnrollment
            | ServiceError::CreditLimitExceeded => ApiError::BadRequest {
                code,
                message: err.to_string(),
            },
            ServiceError::TermNotFound
            | ServiceError::CourseNotFound(_)
            | ServiceError::StudentNotFound(_) => ApiError::BadRequest {
                code,
                message: err.to_string(),
            },
            ServiceError::Forbidden(_) | ServiceError::StudentNotBound => ApiError::Forbidden {
                code,
                message: err.to_string(),
            },
            ServiceError::NotFound(_) => ApiError::NotFound {
                code,
                message: err.to_string(),
            },
            ServiceError::InvalidCredentials => ApiError::Unauthorized {
                code,
                message: err.to_string(),
            },
            ServiceError::TokenSign(inner) => {
                tracing::error!("token signing error: {}", inner);
                ApiError::Internal {
                    code,
                    message: "An error occurred while processing your request".to_string(),
                }
            }
            ServiceError::Store(inner) => {
                // Keep the storage detail for logs, return an opaque error.
                tracing::error!("storage error: {}", inner);
                ApiError::Internal {
                    code,
                    message: "An error occurred while processing your request".to_string(),
                }
            }
        }
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
        (self.status_code(), Json(self.to_json())).into_response()
    }
}
