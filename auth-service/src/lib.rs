//! Authorization and identity service for the scoutd platform.
//!
//! Owns registration, login, session-token verification, the role
//! permission matrix, email verification, and password reset.

pub mod config;
pub mod db;
pub mod dtos;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod store;
pub mod utils;

use axum::http::{HeaderValue, Method};
use axum::middleware::{from_fn, from_fn_with_state};
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

use service_core::auth::{PermissionMatrix, TokenService};
use service_core::error::AppError;
use service_core::middleware::bearer_auth_middleware;
use service_core::middleware::bot_detection::bot_detection_middleware;
use service_core::middleware::rate_limit::{ip_rate_limit_middleware, IpRateLimiter};
use service_core::middleware::security_headers::security_headers_middleware;
use service_core::middleware::tracing::{request_id_middleware, REQUEST_ID_HEADER};

use crate::config::{AuthConfig, SwaggerMode};
use crate::services::{AdminService, AuthFlows};
use crate::store::IdentityStore;

#[derive(Clone)]
pub struct AppState {
    pub config: AuthConfig,
    pub store: Arc<dyn IdentityStore>,
    pub tokens: TokenService,
    pub matrix: Arc<PermissionMatrix>,
    pub auth_flows: AuthFlows,
    pub admin: AdminService,
    pub login_limiter: IpRateLimiter,
    pub register_limiter: IpRateLimiter,
    pub reset_limiter: IpRateLimiter,
    pub global_ip_limiter: IpRateLimiter,
}

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::auth::registration::register,
        handlers::auth::registration::verify_email,
        handlers::auth::session::login,
        handlers::auth::session::verify,
        handlers::auth::password::request_reset,
        handlers::auth::password::confirm_reset,
        handlers::user::me,
        handlers::admin::update_role,
        handlers::admin::deactivate,
        handlers::admin::reactivate,
    ),
    components(schemas(
        dtos::RegisterRequest,
        dtos::LoginRequest,
        dtos::AuthResponse,
        dtos::TokenResponse,
        dtos::VerifyResponse,
        dtos::PasswordResetRequest,
        dtos::PasswordResetConfirmRequest,
        dtos::MessageResponse,
        dtos::UpdateRoleRequest,
        dtos::ErrorResponse,
        models::IdentityResponse,
        models::IdentityState,
    )),
    modifiers(&SecurityAddon),
    tags(
        (name = "auth", description = "Registration, login, and token verification"),
        (name = "users", description = "Current identity"),
        (name = "admin", description = "Privileged identity administration"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

async fn health_check(
    axum::extract::State(state): axum::extract::State<AppState>,
) -> Result<Json<serde_json::Value>, AppError> {
    state.store.ping().await.map_err(AppError::from)?;
    Ok(Json(serde_json::json!({
        "status": "healthy",
        "service": state.config.service_name,
    })))
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::OPTIONS])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
        ])
}

pub fn build_router(state: AppState) -> Router {
    let register_routes = Router::new()
        .route("/auth/register", post(handlers::auth::registration::register))
        .route_layer(from_fn_with_state(
            state.register_limiter.clone(),
            ip_rate_limit_middleware,
        ));

    let login_routes = Router::new()
        .route("/auth/login", post(handlers::auth::session::login))
        .route_layer(from_fn_with_state(
            state.login_limiter.clone(),
            ip_rate_limit_middleware,
        ));

    let reset_routes = Router::new()
        .route(
            "/auth/password-reset/request",
            post(handlers::auth::password::request_reset),
        )
        .route_layer(from_fn_with_state(
            state.reset_limiter.clone(),
            ip_rate_limit_middleware,
        ));

    let public_routes = Router::new()
        .route(
            "/auth/verify-email",
            get(handlers::auth::registration::verify_email),
        )
        .route(
            "/auth/password-reset/confirm",
            post(handlers::auth::password::confirm_reset),
        );

    let protected_routes = Router::new()
        .route("/auth/verify", get(handlers::auth::session::verify))
        .route("/users/me", get(handlers::user::me))
        .route(
            "/auth/users/:identity_id/role",
            patch(handlers::admin::update_role),
        )
        .route(
            "/auth/users/:identity_id/deactivate",
            post(handlers::admin::deactivate),
        )
        .route(
            "/auth/users/:identity_id/reactivate",
            post(handlers::admin::reactivate),
        )
        .route_layer(from_fn_with_state(
            state.tokens.clone(),
            bearer_auth_middleware,
        ));

    let mut router = Router::new()
        .route("/health", get(health_check))
        .route("/metrics", get(handlers::metrics::metrics))
        .merge(register_routes)
        .merge(login_routes)
        .merge(reset_routes)
        .merge(public_routes)
        .merge(protected_routes);

    if state.config.swagger == SwaggerMode::Enabled {
        router = router.merge(
            SwaggerUi::new("/docs").url("/.well-known/openapi.json", ApiDoc::openapi()),
        );
    }

    let cors = cors_layer(&state.config.allowed_origins);
    let global_limiter = state.global_ip_limiter.clone();

    router
        .with_state(state)
        .layer(from_fn_with_state(global_limiter, ip_rate_limit_middleware))
        .layer(from_fn(middleware::metrics_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get(REQUEST_ID_HEADER)
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("unknown");
                tracing::info_span!(
                    "http_request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = %request_id,
                )
            }),
        )
        .layer(from_fn(request_id_middleware))
        .layer(from_fn(security_headers_middleware))
        .layer(from_fn(bot_detection_middleware))
        .layer(cors)
}
