//! Registration, login, email verification, and password reset flows.

use chrono::Utc;
use rand::RngCore;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use uuid::Uuid;

use service_core::auth::{PermissionMatrix, TokenService};

use crate::dtos::{AuthResponse, LoginRequest, RegisterRequest, TokenResponse};
use crate::models::{Identity, IdentityResponse, IdentityState, TokenPurpose, VerificationToken};
use crate::services::email::EmailProvider;
use crate::services::error::ServiceError;
use crate::services::metrics;
use crate::services::policy::PasswordPolicy;
use crate::store::IdentityStore;
use crate::utils::password::{hash_password, verify_password, Password};

/// Generate a raw one-shot token and the digest that gets persisted.
/// Only the digest touches storage; the raw value goes into the email.
fn generate_verification_token() -> (String, String) {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    let raw = hex::encode(bytes);
    (digest_token(&raw), raw)
}

fn digest_token(raw: &str) -> String {
    hex::encode(Sha256::digest(raw.as_bytes()))
}

#[derive(Clone)]
pub struct AuthFlows {
    store: Arc<dyn IdentityStore>,
    email: Arc<dyn EmailProvider>,
    tokens: TokenService,
    matrix: Arc<PermissionMatrix>,
    policy: PasswordPolicy,
    require_verified_email: bool,
    public_base_url: String,
}

impl AuthFlows {
    pub fn new(
        store: Arc<dyn IdentityStore>,
        email: Arc<dyn EmailProvider>,
        tokens: TokenService,
        matrix: Arc<PermissionMatrix>,
        policy: PasswordPolicy,
        require_verified_email: bool,
        public_base_url: String,
    ) -> Self {
        Self {
            store,
            email,
            tokens,
            matrix,
            policy,
            require_verified_email,
            public_base_url,
        }
    }

    fn token_response(&self, identity: &Identity) -> Result<TokenResponse, ServiceError> {
        let signed = self
            .tokens
            .issue(
                identity.identity_id,
                &identity.email,
                &identity.role,
                identity.federation_id,
            )
            .map_err(|e| ServiceError::Store(anyhow::anyhow!("token issue: {}", e)))?;

        Ok(TokenResponse {
            token: signed.token,
            token_type: "Bearer",
            expires_in: signed.expires_in,
        })
    }

    pub async fn register(&self, request: RegisterRequest) -> Result<AuthResponse, ServiceError> {
        if !self.matrix.is_known_role(&request.role) {
            metrics::record_auth_outcome("register", "invalid_role");
            return Err(ServiceError::InvalidRole(request.role));
        }

        if let Err(violations) = self.policy.validate(&request.password) {
            metrics::record_auth_outcome("register", "weak_password");
            return Err(ServiceError::WeakPassword(violations));
        }

        let password_hash = hash_password(&Password::new(request.password))
            .map_err(|e| ServiceError::Store(anyhow::anyhow!(e)))?;

        let initial_state = if self.require_verified_email {
            IdentityState::Unverified
        } else {
            IdentityState::Active
        };

        let identity = Identity::new(
            &request.email,
            password_hash,
            &request.role,
            request.federation_id,
            initial_state,
        );

        // The unique index on lower(email) is the arbiter; a concurrent
        // registration with the same address loses here, not later.
        if let Err(err) = self.store.insert_identity(&identity).await {
            metrics::record_auth_outcome("register", "duplicate_email");
            return Err(err.into());
        }

        let (digest, raw) = generate_verification_token();
        let token = VerificationToken::new(
            identity.identity_id,
            digest,
            TokenPurpose::EmailVerification,
        );
        self.store.insert_verification_token(&token).await?;
        self.email
            .send_verification_email(&identity.email, &raw, &self.public_base_url)
            .await?;

        let token = self.token_response(&identity)?;
        metrics::record_auth_outcome("register", "success");
        tracing::info!(identity_id = %identity.identity_id, role = %identity.role, "identity registered");

        Ok(AuthResponse {
            identity: identity.sanitized(),
            token,
        })
    }

    pub async fn login(&self, request: LoginRequest) -> Result<AuthResponse, ServiceError> {
        let Some(identity) = self.store.find_by_email(&request.email).await? else {
            metrics::record_auth_outcome("login", "invalid_credentials");
            return Err(ServiceError::InvalidCredentials);
        };

        let matches = verify_password(&Password::new(request.password), &identity.password_hash)
            .map_err(|e| ServiceError::Store(anyhow::anyhow!(e)))?;
        if !matches {
            metrics::record_auth_outcome("login", "invalid_credentials");
            return Err(ServiceError::InvalidCredentials);
        }

        // Credential check first: state errors are only disclosed to
        // callers who proved they hold the password.
        if identity.is_deactivated() {
            metrics::record_auth_outcome("login", "deactivated");
            return Err(ServiceError::AccountDeactivated);
        }
        if self.require_verified_email && !identity.email_verified {
            metrics::record_auth_outcome("login", "email_not_verified");
            return Err(ServiceError::EmailNotVerified);
        }

        let now = Utc::now();
        self.store.record_login(identity.identity_id, now).await?;

        let mut identity = identity;
        identity.last_login_utc = Some(now);

        let token = self.token_response(&identity)?;
        metrics::record_auth_outcome("login", "success");

        Ok(AuthResponse {
            identity: identity.sanitized(),
            token,
        })
    }

    pub async fn verify_email(&self, raw_token: &str) -> Result<IdentityResponse, ServiceError> {
        let digest = digest_token(raw_token);
        let Some(token) = self
            .store
            .consume_verification_token(&digest, TokenPurpose::EmailVerification)
            .await?
        else {
            return Err(ServiceError::InvalidVerificationToken);
        };

        // Consumption already removed the row, so an expired token
        // cannot be retried; the user requests a fresh one instead.
        if token.is_expired() {
            return Err(ServiceError::VerificationTokenExpired);
        }

        let identity = self.store.mark_email_verified(token.identity_id).await?;
        metrics::record_auth_outcome("verify_email", "success");
        tracing::info!(identity_id = %identity.identity_id, "email verified");
        Ok(identity.sanitized())
    }

    /// Always succeeds from the caller's point of view so the endpoint
    /// cannot be used to probe which addresses exist.
    pub async fn request_password_reset(&self, email: &str) -> Result<(), ServiceError> {
        let Some(identity) = self.store.find_by_email(email).await? else {
            metrics::record_auth_outcome("password_reset_request", "unknown_email");
            return Ok(());
        };

        let (digest, raw) = generate_verification_token();
        let token =
            VerificationToken::new(identity.identity_id, digest, TokenPurpose::PasswordReset);
        self.store.insert_verification_token(&token).await?;
        self.email
            .send_password_reset_email(&identity.email, &raw, &self.public_base_url)
            .await?;

        metrics::record_auth_outcome("password_reset_request", "sent");
        Ok(())
    }

    pub async fn confirm_password_reset(
        &self,
        raw_token: &str,
        new_password: &str,
    ) -> Result<(), ServiceError> {
        let digest = digest_token(raw_token);
        let Some(token) = self
            .store
            .consume_verification_token(&digest, TokenPurpose::PasswordReset)
            .await?
        else {
            return Err(ServiceError::InvalidVerificationToken);
        };

        if token.is_expired() {
            return Err(ServiceError::VerificationTokenExpired);
        }

        if let Err(violations) = self.policy.validate(new_password) {
            return Err(ServiceError::WeakPassword(violations));
        }

        let password_hash = hash_password(&Password::new(new_password.to_string()))
            .map_err(|e| ServiceError::Store(anyhow::anyhow!(e)))?;
        self.store
            .update_password_hash(token.identity_id, &password_hash)
            .await?;

        metrics::record_auth_outcome("password_reset_confirm", "success");
        tracing::info!(identity_id = %token.identity_id, "password reset completed");
        Ok(())
    }
}
