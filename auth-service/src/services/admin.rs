//! Privileged identity administration: role changes and state
//! transitions. Capability guards live in the handlers; this layer
//! enforces the state machine itself.

use std::sync::Arc;
use uuid::Uuid;

use service_core::auth::PermissionMatrix;

use crate::models::{IdentityResponse, IdentityState};
use crate::services::error::ServiceError;
use crate::services::metrics;
use crate::store::IdentityStore;

#[derive(Clone)]
pub struct AdminService {
    store: Arc<dyn IdentityStore>,
    matrix: Arc<PermissionMatrix>,
}

impl AdminService {
    pub fn new(store: Arc<dyn IdentityStore>, matrix: Arc<PermissionMatrix>) -> Self {
        Self { store, matrix }
    }

    /// Assign a new role. The target keeps its current session tokens;
    /// capability checks resolve the new role on the next request that
    /// presents a fresh token.
    pub async fn update_role(
        &self,
        identity_id: Uuid,
        role: &str,
    ) -> Result<IdentityResponse, ServiceError> {
        if !self.matrix.is_known_role(role) {
            return Err(ServiceError::InvalidRole(role.to_string()));
        }

        let identity = self.store.update_role(identity_id, role).await?;
        metrics::record_auth_outcome("update_role", "success");
        tracing::info!(identity_id = %identity_id, role = %role, "role updated");
        Ok(identity.sanitized())
    }

    pub async fn deactivate(&self, identity_id: Uuid) -> Result<IdentityResponse, ServiceError> {
        let identity = self
            .store
            .find_by_id(identity_id)
            .await?
            .ok_or(ServiceError::IdentityNotFound)?;

        if identity.is_deactivated() {
            return Err(ServiceError::InvalidStateTransition {
                current: identity.state_code.clone(),
                requested: IdentityState::Deactivated.as_str().to_string(),
            });
        }

        let identity = self
            .store
            .update_state(identity_id, IdentityState::Deactivated)
            .await?;
        metrics::record_auth_outcome("deactivate", "success");
        tracing::info!(identity_id = %identity_id, "identity deactivated");
        Ok(identity.sanitized())
    }

    /// Reactivation always lands on `active`, even for an identity that
    /// was deactivated before ever verifying its email; the verified
    /// flag is tracked separately and still gates login when enforced.
    pub async fn reactivate(&self, identity_id: Uuid) -> Result<IdentityResponse, ServiceError> {
        let identity = self
            .store
            .find_by_id(identity_id)
            .await?
            .ok_or(ServiceError::IdentityNotFound)?;

        if !identity.is_deactivated() {
            return Err(ServiceError::InvalidStateTransition {
                current: identity.state_code.clone(),
                requested: IdentityState::Active.as_str().to_string(),
            });
        }

        let identity = self
            .store
            .update_state(identity_id, IdentityState::Active)
            .await?;
        metrics::record_auth_outcome("reactivate", "success");
        tracing::info!(identity_id = %identity_id, "identity reactivated");
        Ok(identity.sanitized())
    }
}
