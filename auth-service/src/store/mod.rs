//! Identity persistence behind a trait so flows and handlers can run
//! against Postgres in production and an in-memory fake in tests.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use service_core::error::AppError;

use crate::models::{Identity, IdentityState, TokenPurpose, VerificationToken};

pub use memory::MemoryIdentityStore;
pub use postgres::PostgresIdentityStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Email already registered")]
    DuplicateEmail,

    #[error("Identity not found")]
    NotFound,

    #[error(transparent)]
    Backend(anyhow::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db) = &err {
            if db.kind() == sqlx::error::ErrorKind::UniqueViolation {
                return StoreError::DuplicateEmail;
            }
        }
        StoreError::Backend(anyhow::Error::new(err))
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateEmail => AppError::DuplicateEmail,
            StoreError::NotFound => AppError::NotFound(anyhow::anyhow!("Identity not found")),
            StoreError::Backend(e) => AppError::StorageError(e),
        }
    }
}

/// Persistence operations for identities and verification tokens.
///
/// Email lookup is case-insensitive. Mutations that target a missing
/// identity return [`StoreError::NotFound`] rather than succeeding
/// vacuously.
#[async_trait]
pub trait IdentityStore: Send + Sync {
    /// Insert a new identity. Fails with [`StoreError::DuplicateEmail`]
    /// when the email is already taken, case-insensitively.
    async fn insert_identity(&self, identity: &Identity) -> Result<(), StoreError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<Identity>, StoreError>;

    async fn find_by_id(&self, identity_id: Uuid) -> Result<Option<Identity>, StoreError>;

    async fn record_login(
        &self,
        identity_id: Uuid,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError>;

    async fn update_role(&self, identity_id: Uuid, role: &str) -> Result<Identity, StoreError>;

    async fn update_state(
        &self,
        identity_id: Uuid,
        state: IdentityState,
    ) -> Result<Identity, StoreError>;

    async fn update_password_hash(
        &self,
        identity_id: Uuid,
        password_hash: &str,
    ) -> Result<(), StoreError>;

    /// Flag the email as verified and promote `unverified` to `active`.
    /// A deactivated identity keeps its state; only the flag changes.
    async fn mark_email_verified(&self, identity_id: Uuid) -> Result<Identity, StoreError>;

    async fn insert_verification_token(
        &self,
        token: &VerificationToken,
    ) -> Result<(), StoreError>;

    /// Atomically remove and return the token matching `digest` and
    /// `purpose`. At most one caller can ever receive a given token.
    async fn consume_verification_token(
        &self,
        digest: &str,
        purpose: TokenPurpose,
    ) -> Result<Option<VerificationToken>, StoreError>;

    /// Backing-store liveness probe for the health endpoint.
    async fn ping(&self) -> Result<(), StoreError>;
}
