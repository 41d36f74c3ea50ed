//! Outbound email behind a provider trait.
//!
//! Production uses SMTP via lettre; development and tests use a
//! provider that logs the link instead of sending.

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use secrecy::ExposeSecret;
use std::sync::Arc;

use crate::config::EmailConfig;
use crate::services::error::ServiceError;

#[async_trait]
pub trait EmailProvider: Send + Sync {
    /// Mail the address a link carrying the raw email-verification token.
    async fn send_verification_email(
        &self,
        to: &str,
        raw_token: &str,
        base_url: &str,
    ) -> Result<(), ServiceError>;

    /// Mail the address a link carrying the raw password-reset token.
    async fn send_password_reset_email(
        &self,
        to: &str,
        raw_token: &str,
        base_url: &str,
    ) -> Result<(), ServiceError>;
}

pub struct SmtpEmailService {
    mailer: Arc<SmtpTransport>,
    from_address: String,
}

impl SmtpEmailService {
    pub fn new(config: &EmailConfig) -> Result<Self, ServiceError> {
        let mut builder = SmtpTransport::relay(&config.smtp_host)
            .map_err(|e| ServiceError::Email(format!("SMTP relay setup: {}", e)))?
            .port(config.smtp_port);

        if !config.smtp_username.is_empty() {
            builder = builder.credentials(Credentials::new(
                config.smtp_username.clone(),
                config.smtp_password.expose_secret().clone(),
            ));
        }

        Ok(Self {
            mailer: Arc::new(builder.build()),
            from_address: config.from_address.clone(),
        })
    }

    async fn send(&self, to: &str, subject: &str, body: String) -> Result<(), ServiceError> {
        let message = Message::builder()
            .from(
                self.from_address
                    .parse()
                    .map_err(|e| ServiceError::Email(format!("from address: {}", e)))?,
            )
            .to(to
                .parse()
                .map_err(|e| ServiceError::Email(format!("recipient address: {}", e)))?)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body)
            .map_err(|e| ServiceError::Email(format!("message build: {}", e)))?;

        // lettre's sync transport blocks on the socket.
        let mailer = Arc::clone(&self.mailer);
        tokio::task::spawn_blocking(move || mailer.send(&message))
            .await
            .map_err(|e| ServiceError::Email(format!("send task: {}", e)))?
            .map_err(|e| ServiceError::Email(format!("SMTP send: {}", e)))?;

        Ok(())
    }
}

#[async_trait]
impl EmailProvider for SmtpEmailService {
    async fn send_verification_email(
        &self,
        to: &str,
        raw_token: &str,
        base_url: &str,
    ) -> Result<(), ServiceError> {
        let link = format!("{}/auth/verify-email?token={}", base_url, raw_token);
        let body = format!(
            "Welcome to scoutd.\n\n\
             Confirm your email address by opening this link:\n\n{}\n\n\
             The link expires in 24 hours. If you did not sign up, ignore this email.\n",
            link
        );
        self.send(to, "Confirm your email address", body).await
    }

    async fn send_password_reset_email(
        &self,
        to: &str,
        raw_token: &str,
        base_url: &str,
    ) -> Result<(), ServiceError> {
        let link = format!("{}/auth/password-reset?token={}", base_url, raw_token);
        let body = format!(
            "A password reset was requested for your scoutd account.\n\n\
             Open this link to choose a new password:\n\n{}\n\n\
             The link expires in 60 minutes. If you did not request a reset,\n\
             ignore this email; your password is unchanged.\n",
            link
        );
        self.send(to, "Reset your password", body).await
    }
}

/// Logs the link instead of delivering it.
#[derive(Default)]
pub struct LogEmailService;

#[async_trait]
impl EmailProvider for LogEmailService {
    async fn send_verification_email(
        &self,
        to: &str,
        raw_token: &str,
        base_url: &str,
    ) -> Result<(), ServiceError> {
        tracing::info!(
            to = %to,
            link = %format!("{}/auth/verify-email?token={}", base_url, raw_token),
            "verification email (log provider, not delivered)"
        );
        Ok(())
    }

    async fn send_password_reset_email(
        &self,
        to: &str,
        raw_token: &str,
        base_url: &str,
    ) -> Result<(), ServiceError> {
        tracing::info!(
            to = %to,
            link = %format!("{}/auth/password-reset?token={}", base_url, raw_token),
            "password reset email (log provider, not delivered)"
        );
        Ok(())
    }
}
