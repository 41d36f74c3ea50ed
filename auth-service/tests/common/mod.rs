//! Shared harness: the full router wired to an in-memory store and a
//! capturing email provider, driven through `tower::ServiceExt`.
#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use secrecy::Secret;
use serde_json::{json, Value};
use tower::ServiceExt;

use service_core::auth::{PermissionMatrix, TokenService};
use service_core::config::{Config as CommonConfig, TokenSettings};
use service_core::middleware::rate_limit::create_ip_rate_limiter;

use auth_service::config::{
    AuthConfig, DatabaseConfig, EmailConfig, EmailProviderKind, Environment,
    PasswordPolicyConfig, RateLimitConfig, SwaggerMode,
};
use auth_service::services::error::ServiceError;
use auth_service::services::{metrics, AdminService, AuthFlows, EmailProvider, PasswordPolicy};
use auth_service::store::MemoryIdentityStore;
use auth_service::{build_router, AppState};

#[derive(Debug, Clone)]
pub struct SentEmail {
    pub to: String,
    pub token: String,
    pub purpose: &'static str,
}

/// Email provider that records what would have been sent.
#[derive(Clone, Default)]
pub struct CapturingEmail {
    sent: Arc<Mutex<Vec<SentEmail>>>,
}

impl CapturingEmail {
    pub fn sent(&self) -> Vec<SentEmail> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl EmailProvider for CapturingEmail {
    async fn send_verification_email(
        &self,
        to: &str,
        raw_token: &str,
        _base_url: &str,
    ) -> Result<(), ServiceError> {
        self.sent.lock().unwrap().push(SentEmail {
            to: to.to_string(),
            token: raw_token.to_string(),
            purpose: "email_verification",
        });
        Ok(())
    }

    async fn send_password_reset_email(
        &self,
        to: &str,
        raw_token: &str,
        _base_url: &str,
    ) -> Result<(), ServiceError> {
        self.sent.lock().unwrap().push(SentEmail {
            to: to.to_string(),
            token: raw_token.to_string(),
            purpose: "password_reset",
        });
        Ok(())
    }
}

fn test_config() -> AuthConfig {
    AuthConfig {
        common: CommonConfig { port: 0 },
        environment: Environment::Development,
        service_name: "auth-service-test".to_string(),
        log_level: "debug".to_string(),
        otlp_endpoint: None,
        public_base_url: "http://localhost:8080".to_string(),
        database: DatabaseConfig {
            url: "postgres://unused".to_string(),
            max_connections: 1,
            min_connections: 0,
        },
        token: TokenSettings {
            secret: Secret::new("a-test-only-signing-secret-of-32-bytes!".to_string()),
            ttl_seconds: 3600,
            issuer: "scoutd-auth".to_string(),
        },
        permission_matrix_path: None,
        password_policy: PasswordPolicyConfig {
            min_length: 8,
            min_character_classes: 2,
        },
        require_verified_email: false,
        email: EmailConfig {
            provider: EmailProviderKind::Log,
            smtp_host: "localhost".to_string(),
            smtp_port: 587,
            smtp_username: String::new(),
            smtp_password: Secret::new(String::new()),
            from_address: "no-reply@scoutd.example".to_string(),
        },
        allowed_origins: vec!["http://localhost:3000".to_string()],
        swagger: SwaggerMode::Disabled,
        rate_limit: RateLimitConfig {
            login_attempts: 1000,
            login_window_seconds: 60,
            register_attempts: 1000,
            register_window_seconds: 60,
            password_reset_attempts: 1000,
            password_reset_window_seconds: 60,
            global_ip_attempts: 10_000,
            global_ip_window_seconds: 60,
        },
    }
}

pub struct TestApp {
    pub router: Router,
    pub store: MemoryIdentityStore,
    pub emails: CapturingEmail,
    pub tokens: TokenService,
}

impl TestApp {
    pub fn spawn() -> Self {
        Self::spawn_with(|_| {})
    }

    pub fn spawn_with(customize: impl FnOnce(&mut AuthConfig)) -> Self {
        metrics::init_metrics();

        let mut config = test_config();
        customize(&mut config);

        let store = MemoryIdentityStore::new();
        let emails = CapturingEmail::default();
        let tokens = TokenService::new(&config.token);
        let matrix = Arc::new(PermissionMatrix::load(
            config.permission_matrix_path.as_deref(),
        ).expect("test matrix loads"));

        let auth_flows = AuthFlows::new(
            Arc::new(store.clone()),
            Arc::new(emails.clone()),
            tokens.clone(),
            matrix.clone(),
            PasswordPolicy::from_config(&config.password_policy),
            config.require_verified_email,
            config.public_base_url.clone(),
        );
        let admin = AdminService::new(Arc::new(store.clone()), matrix.clone());

        let rl = &config.rate_limit;
        let state = AppState {
            login_limiter: create_ip_rate_limiter(rl.login_attempts, rl.login_window_seconds),
            register_limiter: create_ip_rate_limiter(
                rl.register_attempts,
                rl.register_window_seconds,
            ),
            reset_limiter: create_ip_rate_limiter(
                rl.password_reset_attempts,
                rl.password_reset_window_seconds,
            ),
            global_ip_limiter: create_ip_rate_limiter(
                rl.global_ip_attempts,
                rl.global_ip_window_seconds,
            ),
            config: config.clone(),
            store: Arc::new(store.clone()),
            tokens: tokens.clone(),
            matrix,
            auth_flows,
            admin,
        };

        Self {
            router: build_router(state),
            store,
            emails,
            tokens,
        }
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router handles the request");

        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("body collects")
            .to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, body)
    }

    pub async fn post_json(&self, path: &str, body: Value) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(Method::POST)
            .uri(path)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        self.send(request).await
    }

    pub async fn get(&self, path: &str, bearer: Option<&str>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(Method::GET).uri(path);
        if let Some(token) = bearer {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        self.send(builder.body(Body::empty()).unwrap()).await
    }

    pub async fn post(&self, path: &str, bearer: Option<&str>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(Method::POST).uri(path);
        if let Some(token) = bearer {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        self.send(builder.body(Body::empty()).unwrap()).await
    }

    pub async fn patch_json(
        &self,
        path: &str,
        bearer: &str,
        body: Value,
    ) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(Method::PATCH)
            .uri(path)
            .header(header::AUTHORIZATION, format!("Bearer {}", bearer))
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        self.send(request).await
    }

    /// Register an identity and return `(identity_id, bearer token)`.
    pub async fn register(&self, email: &str, password: &str, role: &str) -> (String, String) {
        let (status, body) = self
            .post_json(
                "/auth/register",
                json!({ "email": email, "password": password, "role": role }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "registration failed: {}", body);
        (
            body["identity"]["identity_id"].as_str().unwrap().to_string(),
            body["token"]["token"].as_str().unwrap().to_string(),
        )
    }

    /// The raw token from the most recent captured email.
    pub fn last_email_token(&self) -> String {
        self.emails
            .sent()
            .last()
            .expect("an email was captured")
            .token
            .clone()
    }
}
