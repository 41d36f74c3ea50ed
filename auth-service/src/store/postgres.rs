//! Postgres-backed identity store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{Identity, IdentityState, TokenPurpose, VerificationToken};
use crate::store::{IdentityStore, StoreError};

#[derive(Clone)]
pub struct PostgresIdentityStore {
    pool: PgPool,
}

impl PostgresIdentityStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl IdentityStore for PostgresIdentityStore {
    async fn insert_identity(&self, identity: &Identity) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO identities
                (identity_id, email, password_hash, role, federation_id,
                 state_code, email_verified, created_utc, last_login_utc)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(identity.identity_id)
        .bind(&identity.email)
        .bind(&identity.password_hash)
        .bind(&identity.role)
        .bind(identity.federation_id)
        .bind(&identity.state_code)
        .bind(identity.email_verified)
        .bind(identity.created_utc)
        .bind(identity.last_login_utc)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Identity>, StoreError> {
        let identity = sqlx::query_as::<_, Identity>(
            "SELECT * FROM identities WHERE lower(email) = lower($1)",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(identity)
    }

    async fn find_by_id(&self, identity_id: Uuid) -> Result<Option<Identity>, StoreError> {
        let identity =
            sqlx::query_as::<_, Identity>("SELECT * FROM identities WHERE identity_id = $1")
                .bind(identity_id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(identity)
    }

    async fn record_login(
        &self,
        identity_id: Uuid,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let result = sqlx::query("UPDATE identities SET last_login_utc = $2 WHERE identity_id = $1")
            .bind(identity_id)
            .bind(at)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn update_role(&self, identity_id: Uuid, role: &str) -> Result<Identity, StoreError> {
        sqlx::query_as::<_, Identity>(
            "UPDATE identities SET role = $2 WHERE identity_id = $1 RETURNING *",
        )
        .bind(identity_id)
        .bind(role)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::NotFound)
    }

    async fn update_state(
        &self,
        identity_id: Uuid,
        state: IdentityState,
    ) -> Result<Identity, StoreError> {
        sqlx::query_as::<_, Identity>(
            "UPDATE identities SET state_code = $2 WHERE identity_id = $1 RETURNING *",
        )
        .bind(identity_id)
        .bind(state.as_str())
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::NotFound)
    }

    async fn update_password_hash(
        &self,
        identity_id: Uuid,
        password_hash: &str,
    ) -> Result<(), StoreError> {
        let result =
            sqlx::query("UPDATE identities SET password_hash = $2 WHERE identity_id = $1")
                .bind(identity_id)
                .bind(password_hash)
                .execute(&self.pool)
                .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn mark_email_verified(&self, identity_id: Uuid) -> Result<Identity, StoreError> {
        // The state promotion is conditional in SQL so a concurrent
        // deactivation cannot be overwritten back to active.
        sqlx::query_as::<_, Identity>(
            r#"
            UPDATE identities
            SET email_verified = TRUE,
                state_code = CASE WHEN state_code = 'unverified'
                                  THEN 'active'
                                  ELSE state_code END
            WHERE identity_id = $1
            RETURNING *
            "#,
        )
        .bind(identity_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::NotFound)
    }

    async fn insert_verification_token(
        &self,
        token: &VerificationToken,
    ) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO verification_tokens
                (token_id, token_digest, identity_id, purpose, expires_utc, created_utc)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(token.token_id)
        .bind(&token.token_digest)
        .bind(token.identity_id)
        .bind(&token.purpose)
        .bind(token.expires_utc)
        .bind(token.created_utc)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn consume_verification_token(
        &self,
        digest: &str,
        purpose: TokenPurpose,
    ) -> Result<Option<VerificationToken>, StoreError> {
        // DELETE .. RETURNING hands the row to exactly one caller.
        let token = sqlx::query_as::<_, VerificationToken>(
            "DELETE FROM verification_tokens WHERE token_digest = $1 AND purpose = $2 RETURNING *",
        )
        .bind(digest)
        .bind(purpose.as_str())
        .fetch_optional(&self.pool)
        .await?;
        Ok(token)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
