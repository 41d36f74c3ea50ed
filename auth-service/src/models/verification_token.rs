//! One-shot verification tokens for email confirmation and password
//! reset. Rows hold only the SHA-256 digest of the raw token; the raw
//! value lives exclusively in the emailed link.

use chrono::{DateTime, Duration, Utc};
use sqlx::FromRow;
use uuid::Uuid;

const EMAIL_VERIFICATION_TTL_HOURS: i64 = 24;
const PASSWORD_RESET_TTL_MINUTES: i64 = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenPurpose {
    EmailVerification,
    PasswordReset,
}

impl TokenPurpose {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenPurpose::EmailVerification => "email_verification",
            TokenPurpose::PasswordReset => "password_reset",
        }
    }

    fn ttl(&self) -> Duration {
        match self {
            TokenPurpose::EmailVerification => Duration::hours(EMAIL_VERIFICATION_TTL_HOURS),
            TokenPurpose::PasswordReset => Duration::minutes(PASSWORD_RESET_TTL_MINUTES),
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct VerificationToken {
    pub token_id: Uuid,
    pub token_digest: String,
    pub identity_id: Uuid,
    pub purpose: String,
    pub expires_utc: DateTime<Utc>,
    pub created_utc: DateTime<Utc>,
}

impl VerificationToken {
    pub fn new(identity_id: Uuid, token_digest: String, purpose: TokenPurpose) -> Self {
        let now = Utc::now();
        Self {
            token_id: Uuid::new_v4(),
            token_digest,
            identity_id,
            purpose: purpose.as_str().to_string(),
            expires_utc: now + purpose.ttl(),
            created_utc: now,
        }
    }

    pub fn is_expired(&self) -> bool {
        Utc::now() > self.expires_utc
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reset_tokens_expire_sooner_than_verification_tokens() {
        let id = Uuid::new_v4();
        let verify = VerificationToken::new(id, "d1".to_string(), TokenPurpose::EmailVerification);
        let reset = VerificationToken::new(id, "d2".to_string(), TokenPurpose::PasswordReset);

        assert!(reset.expires_utc < verify.expires_utc);
        assert!(!verify.is_expired());
        assert!(!reset.is_expired());
    }

    #[test]
    fn past_expiry_reads_as_expired() {
        let mut token = VerificationToken::new(
            Uuid::new_v4(),
            "d".to_string(),
            TokenPurpose::PasswordReset,
        );
        token.expires_utc = Utc::now() - Duration::seconds(1);
        assert!(token.is_expired());
    }
}
