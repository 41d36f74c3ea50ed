use crate::error::AppError;
use config::{Config as Cfg, File};
use secrecy::Secret;
use serde::Deserialize;
use std::env;

/// Smallest secret accepted for HMAC signing. Shorter secrets make
/// offline brute force practical, so startup refuses them.
pub const MIN_SECRET_BYTES: usize = 32;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_port() -> u16 {
    8080
}

impl Config {
    pub fn load() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();

        let config = Cfg::builder()
            .add_source(File::with_name("configuration").required(false))
            .add_source(config::Environment::with_prefix("APP").separator("__"))
            .build()?;

        Ok(config.try_deserialize()?)
    }
}

/// Signing parameters shared by every service that verifies bearer
/// tokens locally. Loaded once at startup; a missing or short secret
/// must abort boot instead of failing per-request.
#[derive(Debug, Clone)]
pub struct TokenSettings {
    pub secret: Secret<String>,
    pub ttl_seconds: i64,
    pub issuer: String,
}

impl TokenSettings {
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();

        let secret = env::var("JWT_SECRET").map_err(|_| {
            AppError::ConfigError(anyhow::anyhow!("JWT_SECRET is required but not set"))
        })?;
        if secret.len() < MIN_SECRET_BYTES {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "JWT_SECRET must be at least {} bytes",
                MIN_SECRET_BYTES
            )));
        }

        let ttl_seconds: i64 = env::var("JWT_TTL_SECONDS")
            .unwrap_or_else(|_| "86400".to_string())
            .parse()
            .map_err(|e: std::num::ParseIntError| {
                AppError::ConfigError(anyhow::anyhow!(e.to_string()))
            })?;
        if ttl_seconds <= 0 {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "JWT_TTL_SECONDS must be positive"
            )));
        }

        let issuer = env::var("JWT_ISSUER").unwrap_or_else(|_| "scoutd-auth".to_string());

        Ok(Self {
            secret: Secret::new(secret),
            ttl_seconds,
            issuer,
        })
    }
}
