//! Session token issue and verification.
//!
//! Tokens are HS256-signed JWTs carrying identity and role claims. The
//! signing secret is injected through [`TokenSettings`](crate::config::TokenSettings)
//! and never hardcoded. Verification always checks the signature before
//! trusting any claim; there is no decode-without-verify entry point.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::TokenSettings;
use crate::error::AppError;

/// Verified payload of a session token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (identity id).
    pub sub: Uuid,
    /// Email at issue time.
    pub email: String,
    /// Role at issue time. Capabilities are resolved fresh against the
    /// permission matrix, never embedded.
    pub role: String,
    /// Federation affiliation, when the identity has one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub federation_id: Option<Uuid>,
    /// Issuer.
    pub iss: String,
    /// Issued at (Unix timestamp).
    pub iat: i64,
    /// Expiration time (Unix timestamp).
    pub exp: i64,
    /// Token id. Reserved for a future deny-list; unused today.
    pub jti: String,
}

/// A freshly issued token plus its expiry metadata.
#[derive(Debug, Clone, Serialize)]
pub struct SignedToken {
    pub token: String,
    pub expires_in: i64,
    pub expires_at: i64,
}

/// Issues and verifies session tokens.
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl_seconds: i64,
    issuer: String,
}

impl TokenService {
    pub fn new(settings: &TokenSettings) -> Self {
        let secret = settings.secret.expose_secret().as_bytes();
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            ttl_seconds: settings.ttl_seconds,
            issuer: settings.issuer.clone(),
        }
    }

    /// Issue a token for an identity.
    pub fn issue(
        &self,
        sub: Uuid,
        email: &str,
        role: &str,
        federation_id: Option<Uuid>,
    ) -> Result<SignedToken, AppError> {
        let now = Utc::now();
        let exp = now + Duration::seconds(self.ttl_seconds);

        let claims = Claims {
            sub,
            email: email.to_string(),
            role: role.to_string(),
            federation_id,
            iss: self.issuer.clone(),
            iat: now.timestamp(),
            exp: exp.timestamp(),
            jti: Uuid::new_v4().to_string(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AppError::InternalError(anyhow::anyhow!("token encoding: {}", e)))?;

        Ok(SignedToken {
            token,
            expires_in: self.ttl_seconds,
            expires_at: claims.exp,
        })
    }

    /// Verify a token string and return its claims.
    ///
    /// Signature is checked before any claim is inspected; expiry is
    /// enforced with zero leeway.
    pub fn verify(&self, token: &str) -> Result<Claims, AppError> {
        if token.is_empty() {
            return Err(AppError::TokenMissing);
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_issuer(&[&self.issuer]);

        let data = decode::<Claims>(token, &self.decoding_key, &validation)?;
        Ok(data.claims)
    }

    pub fn ttl_seconds(&self) -> i64 {
        self.ttl_seconds
    }
}
