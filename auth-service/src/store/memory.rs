//! In-memory identity store for tests and local development.
//!
//! Mirrors the Postgres semantics that matter to callers: the
//! case-insensitive email uniqueness the database index enforces, and
//! single-consumption of verification tokens.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::{Identity, IdentityState, TokenPurpose, VerificationToken};
use crate::store::{IdentityStore, StoreError};

#[derive(Default)]
struct MemoryInner {
    identities: HashMap<Uuid, Identity>,
    tokens: HashMap<String, VerificationToken>,
}

#[derive(Clone, Default)]
pub struct MemoryIdentityStore {
    inner: Arc<Mutex<MemoryInner>>,
}

impl MemoryIdentityStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemoryInner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl IdentityStore for MemoryIdentityStore {
    async fn insert_identity(&self, identity: &Identity) -> Result<(), StoreError> {
        let mut inner = self.lock();
        let email_lower = identity.email.to_lowercase();
        if inner
            .identities
            .values()
            .any(|i| i.email.to_lowercase() == email_lower)
        {
            return Err(StoreError::DuplicateEmail);
        }
        inner.identities.insert(identity.identity_id, identity.clone());
        Ok(())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Identity>, StoreError> {
        let inner = self.lock();
        let email_lower = email.to_lowercase();
        Ok(inner
            .identities
            .values()
            .find(|i| i.email.to_lowercase() == email_lower)
            .cloned())
    }

    async fn find_by_id(&self, identity_id: Uuid) -> Result<Option<Identity>, StoreError> {
        Ok(self.lock().identities.get(&identity_id).cloned())
    }

    async fn record_login(
        &self,
        identity_id: Uuid,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let mut inner = self.lock();
        let identity = inner
            .identities
            .get_mut(&identity_id)
            .ok_or(StoreError::NotFound)?;
        identity.last_login_utc = Some(at);
        Ok(())
    }

    async fn update_role(&self, identity_id: Uuid, role: &str) -> Result<Identity, StoreError> {
        let mut inner = self.lock();
        let identity = inner
            .identities
            .get_mut(&identity_id)
            .ok_or(StoreError::NotFound)?;
        identity.role = role.to_string();
        Ok(identity.clone())
    }

    async fn update_state(
        &self,
        identity_id: Uuid,
        state: IdentityState,
    ) -> Result<Identity, StoreError> {
        let mut inner = self.lock();
        let identity = inner
            .identities
            .get_mut(&identity_id)
            .ok_or(StoreError::NotFound)?;
        identity.state_code = state.as_str().to_string();
        Ok(identity.clone())
    }

    async fn update_password_hash(
        &self,
        identity_id: Uuid,
        password_hash: &str,
    ) -> Result<(), StoreError> {
        let mut inner = self.lock();
        let identity = inner
            .identities
            .get_mut(&identity_id)
            .ok_or(StoreError::NotFound)?;
        identity.password_hash = password_hash.to_string();
        Ok(())
    }

    async fn mark_email_verified(&self, identity_id: Uuid) -> Result<Identity, StoreError> {
        let mut inner = self.lock();
        let identity = inner
            .identities
            .get_mut(&identity_id)
            .ok_or(StoreError::NotFound)?;
        identity.email_verified = true;
        if identity.state() == IdentityState::Unverified {
            identity.state_code = IdentityState::Active.as_str().to_string();
        }
        Ok(identity.clone())
    }

    async fn insert_verification_token(
        &self,
        token: &VerificationToken,
    ) -> Result<(), StoreError> {
        self.lock()
            .tokens
            .insert(token.token_digest.clone(), token.clone());
        Ok(())
    }

    async fn consume_verification_token(
        &self,
        digest: &str,
        purpose: TokenPurpose,
    ) -> Result<Option<VerificationToken>, StoreError> {
        let mut inner = self.lock();
        let purpose_matches = inner
            .tokens
            .get(digest)
            .is_some_and(|token| token.purpose == purpose.as_str());
        if purpose_matches {
            Ok(inner.tokens.remove(digest))
        } else {
            Ok(None)
        }
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
