//! Service-layer failures and their HTTP mapping.

use thiserror::Error;

use service_core::error::AppError;

use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Password rejected: {}", .0.join("; "))]
    WeakPassword(Vec<String>),

    #[error("Unknown role: {0}")]
    InvalidRole(String),

    #[error("Email already registered")]
    DuplicateEmail,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Account is deactivated")]
    AccountDeactivated,

    #[error("Email address is not verified")]
    EmailNotVerified,

    #[error("Verification token is invalid or already used")]
    InvalidVerificationToken,

    #[error("Verification token has expired")]
    VerificationTokenExpired,

    #[error("Identity not found")]
    IdentityNotFound,

    #[error("Identity is {current}; cannot move to {requested}")]
    InvalidStateTransition { current: String, requested: String },

    #[error("Email delivery failed: {0}")]
    Email(String),

    #[error(transparent)]
    Store(anyhow::Error),
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateEmail => ServiceError::DuplicateEmail,
            StoreError::NotFound => ServiceError::IdentityNotFound,
            StoreError::Backend(e) => ServiceError::Store(e),
        }
    }
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::WeakPassword(violations) => AppError::WeakPassword(violations),
            ServiceError::InvalidRole(role) => AppError::InvalidRole(role),
            ServiceError::DuplicateEmail => AppError::DuplicateEmail,
            ServiceError::InvalidCredentials => AppError::InvalidCredentials,
            ServiceError::AccountDeactivated => AppError::AccountDeactivated,
            ServiceError::EmailNotVerified => AppError::EmailNotVerified,
            ServiceError::InvalidVerificationToken => AppError::BadRequest(anyhow::anyhow!(
                "Verification token is invalid or already used"
            )),
            ServiceError::VerificationTokenExpired => {
                AppError::BadRequest(anyhow::anyhow!("Verification token has expired"))
            }
            ServiceError::IdentityNotFound => {
                AppError::NotFound(anyhow::anyhow!("Identity not found"))
            }
            ServiceError::InvalidStateTransition { current, requested } => AppError::BadRequest(
                anyhow::anyhow!("Identity is {}; cannot move to {}", current, requested),
            ),
            ServiceError::Email(msg) => AppError::EmailError(msg),
            ServiceError::Store(e) => AppError::StorageError(e),
        }
    }
}
