use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

/// Error surface shared by every scoutd service.
///
/// Each variant carries a stable machine-readable `code` so consuming
/// services can branch on failures without parsing free-text messages.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("Password rejected: {}", .0.join("; "))]
    WeakPassword(Vec<String>),

    #[error("Unknown role: {0}")]
    InvalidRole(String),

    #[error("Bad request: {0}")]
    BadRequest(anyhow::Error),

    #[error("Not found: {0}")]
    NotFound(anyhow::Error),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Account is deactivated")]
    AccountDeactivated,

    #[error("Email address is not verified")]
    EmailNotVerified,

    #[error("Missing bearer token")]
    TokenMissing,

    #[error("Malformed token")]
    TokenMalformed,

    #[error("Token has expired")]
    TokenExpired,

    #[error("Token signature verification failed")]
    SignatureInvalid,

    #[error("Role '{have}' lacks capability '{required}'")]
    InsufficientPermissions { required: String, have: String },

    #[error("Forbidden: {0}")]
    Forbidden(anyhow::Error),

    #[error("Email already registered")]
    DuplicateEmail,

    #[error("Too many requests: {0}")]
    TooManyRequests(String, Option<u64>),

    #[error("Storage error: {0}")]
    StorageError(anyhow::Error),

    #[error("Email error: {0}")]
    EmailError(String),

    #[error("Configuration error: {0}")]
    ConfigError(anyhow::Error),

    #[error("Internal server error: {0}")]
    InternalError(#[from] anyhow::Error),
}

impl AppError {
    /// Stable code for the response body and for metrics labels.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::ValidationError(_) => "validation_failed",
            AppError::WeakPassword(_) => "weak_password",
            AppError::InvalidRole(_) => "invalid_role",
            AppError::BadRequest(_) => "bad_request",
            AppError::NotFound(_) => "not_found",
            AppError::InvalidCredentials => "invalid_credentials",
            AppError::AccountDeactivated => "account_deactivated",
            AppError::EmailNotVerified => "email_not_verified",
            AppError::TokenMissing => "token_missing",
            AppError::TokenMalformed => "token_malformed",
            AppError::TokenExpired => "token_expired",
            AppError::SignatureInvalid => "signature_invalid",
            AppError::InsufficientPermissions { .. } => "insufficient_permissions",
            AppError::Forbidden(_) => "forbidden",
            AppError::DuplicateEmail => "duplicate_email",
            AppError::TooManyRequests(..) => "rate_limited",
            AppError::StorageError(_) => "storage_error",
            AppError::EmailError(_) => "email_error",
            AppError::ConfigError(_) => "configuration_error",
            AppError::InternalError(_) => "internal_error",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_)
            | AppError::WeakPassword(_)
            | AppError::InvalidRole(_)
            | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::InvalidCredentials
            | AppError::TokenMissing
            | AppError::TokenMalformed
            | AppError::TokenExpired
            | AppError::SignatureInvalid => StatusCode::UNAUTHORIZED,
            AppError::AccountDeactivated
            | AppError::EmailNotVerified
            | AppError::InsufficientPermissions { .. }
            | AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::DuplicateEmail => StatusCode::CONFLICT,
            AppError::TooManyRequests(..) => StatusCode::TOO_MANY_REQUESTS,
            AppError::StorageError(_)
            | AppError::EmailError(_)
            | AppError::ConfigError(_)
            | AppError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::ConfigError(anyhow::Error::new(err))
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::InternalError(anyhow::Error::new(err))
    }
}

impl From<jsonwebtoken::errors::Error> for AppError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;
        match err.kind() {
            ErrorKind::ExpiredSignature => AppError::TokenExpired,
            ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm | ErrorKind::Crypto(_) => {
                AppError::SignatureInvalid
            }
            _ => AppError::TokenMalformed,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        #[derive(Serialize)]
        struct ErrorResponse {
            code: &'static str,
            error: String,
            #[serde(skip_serializing_if = "Option::is_none")]
            details: Option<serde_json::Value>,
        }

        let status = self.status();
        let code = self.code();

        let (error_message, details, retry_after) = match self {
            AppError::ValidationError(err) => (
                "Validation error".to_string(),
                serde_json::to_value(&err).ok(),
                None,
            ),
            AppError::WeakPassword(violations) => (
                "Password does not meet the policy".to_string(),
                Some(serde_json::json!({ "violations": violations })),
                None,
            ),
            AppError::InsufficientPermissions { required, have } => (
                "Insufficient permissions".to_string(),
                Some(serde_json::json!({ "required": required, "role": have })),
                None,
            ),
            AppError::TooManyRequests(msg, retry) => (msg, None, retry),
            AppError::StorageError(err) => {
                tracing::error!(error = %err, "storage failure");
                ("Storage error".to_string(), None, None)
            }
            AppError::EmailError(msg) => {
                tracing::error!(error = %msg, "email delivery failure");
                ("Email error".to_string(), None, None)
            }
            AppError::ConfigError(err) => {
                tracing::error!(error = %err, "configuration failure");
                ("Configuration error".to_string(), None, None)
            }
            AppError::InternalError(err) => {
                tracing::error!(error = %err, "unhandled internal error");
                ("Internal server error".to_string(), None, None)
            }
            other => (other.to_string(), None, None),
        };

        let mut res = (
            status,
            Json(ErrorResponse {
                code,
                error: error_message,
                details,
            }),
        )
            .into_response();

        if let Some(retry) = retry_after {
            res.headers_mut()
                .insert(axum::http::header::RETRY_AFTER, retry.into());
        }

        res
    }
}
