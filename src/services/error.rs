use thiserror::Error;

use crate::store::StoreError;

/// Domain errors surfaced by the service layer. Each kind is tagged at the
/// point of detection and propagated unchanged to the HTTP boundary, which
/// maps it to a status class and a stable code string.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("missing required field: {0}")]
    MissingRequired(&'static str),

    #[error("term not found")]
    TermNotFound,

    #[error("{0}")]
    CourseNotFound(String),

    #[error("{0}")]
    StudentNotFound(String),

    #[error("student not bound")]
    StudentNotBound,

    #[error("duplicate enrollment")]
    DuplicateEnrollment,

    #[error("credit limit exceeded")]
    CreditLimitExceeded,

    #[error("{0}")]
    Forbidden(&'static str),

    #[error("{0}")]
    NotFound(&'static str),

    #[error("invalid username or password")]
    InvalidCredentials,

    #[error("sign token failed")]
    TokenSign(#[source] crate::auth::JwtError),

    #[error("database error")]
    Store(#[from] StoreError),
}

impl ServiceError {
    /// Stable externally-visible code for client handling.
    pub fn code(&self) -> &'static str {
        match self {
            ServiceError::MissingRequired(_) => "MISSING_REQUIRED",
            ServiceError::TermNotFound => "TERM_NOT_FOUND",
            ServiceError::CourseNotFound(_) => "COURSE_NOT_FOUND",
            ServiceError::StudentNotFound(_) => "STUDENT_NOT_FOUND",
            ServiceError::StudentNotBound => "STUDENT_NOT_BOUND",
            ServiceError::DuplicateEnrollment => "DUPLICATE_ENROLLMENT",
            ServiceError::CreditLimitExceeded => "CREDIT_LIMIT_EXCEEDED",
            ServiceError::Forbidden(_) => "FORBIDDEN",
            ServiceError::NotFound(_) => "NOT_FOUND",
            ServiceError::InvalidCredentials => "INVALID_CREDENTIALS",
            ServiceError::TokenSign(_) => "SIGN_TOKEN_FAILED",
            ServiceError::Store(_) => "DB_ERROR",
        }
    }
}
