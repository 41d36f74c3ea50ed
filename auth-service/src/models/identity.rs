//! Identity records and their lifecycle states.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

/// Lifecycle state of an identity.
///
/// `unverified -> active` happens only through email verification;
/// `active <-> deactivated` only through admin action. Deactivation
/// wins over verification: verifying the email of a deactivated
/// identity never resurrects it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum IdentityState {
    Unverified,
    Active,
    Deactivated,
}

impl IdentityState {
    pub fn as_str(&self) -> &'static str {
        match self {
            IdentityState::Unverified => "unverified",
            IdentityState::Active => "active",
            IdentityState::Deactivated => "deactivated",
        }
    }

    pub fn parse(code: &str) -> Option<Self> {
        match code {
            "unverified" => Some(IdentityState::Unverified),
            "active" => Some(IdentityState::Active),
            "deactivated" => Some(IdentityState::Deactivated),
            _ => None,
        }
    }
}

/// A stored identity. `password_hash` never leaves the service; use
/// [`Identity::sanitized`] for anything that goes over the wire.
#[derive(Debug, Clone, FromRow)]
pub struct Identity {
    pub identity_id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub role: String,
    pub federation_id: Option<Uuid>,
    pub state_code: String,
    pub email_verified: bool,
    pub created_utc: DateTime<Utc>,
    pub last_login_utc: Option<DateTime<Utc>>,
}

impl Identity {
    pub fn new(
        email: &str,
        password_hash: String,
        role: &str,
        federation_id: Option<Uuid>,
        state: IdentityState,
    ) -> Self {
        Self {
            identity_id: Uuid::new_v4(),
            email: email.to_string(),
            password_hash,
            role: role.to_string(),
            federation_id,
            state_code: state.as_str().to_string(),
            email_verified: false,
            created_utc: Utc::now(),
            last_login_utc: None,
        }
    }

    /// A `state_code` the parser does not recognize means the row was
    /// written by something newer than this binary; treat it as
    /// deactivated rather than guessing it active.
    pub fn state(&self) -> IdentityState {
        IdentityState::parse(&self.state_code).unwrap_or(IdentityState::Deactivated)
    }

    pub fn is_active(&self) -> bool {
        self.state() == IdentityState::Active
    }

    pub fn is_deactivated(&self) -> bool {
        self.state() == IdentityState::Deactivated
    }

    pub fn sanitized(&self) -> IdentityResponse {
        IdentityResponse {
            identity_id: self.identity_id,
            email: self.email.clone(),
            role: self.role.clone(),
            federation_id: self.federation_id,
            state: self.state(),
            email_verified: self.email_verified,
            created_utc: self.created_utc,
            last_login_utc: self.last_login_utc,
        }
    }
}

/// Wire representation of an identity, with the credential stripped.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct IdentityResponse {
    pub identity_id: Uuid,
    pub email: String,
    pub role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub federation_id: Option<Uuid>,
    pub state: IdentityState,
    pub email_verified: bool,
    pub created_utc: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_login_utc: Option<DateTime<Utc>>,
}
