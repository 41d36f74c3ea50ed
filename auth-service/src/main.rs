use std::sync::Arc;

use service_core::auth::{PermissionMatrix, TokenService};
use service_core::error::AppError;
use service_core::middleware::rate_limit::create_ip_rate_limiter;
use service_core::observability::init_tracing;

use auth_service::config::{AuthConfig, EmailProviderKind};
use auth_service::services::{
    metrics, AdminService, AuthFlows, EmailProvider, LogEmailService, PasswordPolicy,
    SmtpEmailService,
};
use auth_service::store::PostgresIdentityStore;
use auth_service::{build_router, AppState};

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let config = AuthConfig::from_env()?;

    init_tracing(
        &config.service_name,
        &config.log_level,
        config.otlp_endpoint.as_deref(),
    );
    metrics::init_metrics();

    // A broken matrix or secret must stop boot here, not fail later
    // inside a request.
    let matrix = Arc::new(PermissionMatrix::load(
        config.permission_matrix_path.as_deref(),
    )?);
    matrix.validate()?;
    tracing::info!(
        roles = ?matrix.roles().collect::<Vec<_>>(),
        "permission matrix loaded"
    );

    let tokens = TokenService::new(&config.token);

    let pool = auth_service::db::create_pool(&config.database).await?;
    auth_service::db::run_migrations(&pool).await?;
    let store = Arc::new(PostgresIdentityStore::new(pool));

    let email: Arc<dyn EmailProvider> = match config.email.provider {
        EmailProviderKind::Smtp => {
            Arc::new(SmtpEmailService::new(&config.email).map_err(AppError::from)?)
        }
        EmailProviderKind::Log => Arc::new(LogEmailService),
    };

    let policy = PasswordPolicy::from_config(&config.password_policy);

    let auth_flows = AuthFlows::new(
        store.clone(),
        email,
        tokens.clone(),
        matrix.clone(),
        policy,
        config.require_verified_email,
        config.public_base_url.clone(),
    );
    let admin = AdminService::new(store.clone(), matrix.clone());

    let rl = &config.rate_limit;
    let state = AppState {
        login_limiter: create_ip_rate_limiter(rl.login_attempts, rl.login_window_seconds),
        register_limiter: create_ip_rate_limiter(rl.register_attempts, rl.register_window_seconds),
        reset_limiter: create_ip_rate_limiter(
            rl.password_reset_attempts,
            rl.password_reset_window_seconds,
        ),
        global_ip_limiter: create_ip_rate_limiter(rl.global_ip_attempts, rl.global_ip_window_seconds),
        config: config.clone(),
        store,
        tokens,
        matrix,
        auth_flows,
        admin,
    };

    let router = build_router(state).into_make_service_with_connect_info::<std::net::SocketAddr>();

    let addr = format!("0.0.0.0:{}", config.common.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(addr = %addr, "auth-service listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("auth-service stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("ctrl-c handler installs once");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("SIGTERM handler installs once")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("received ctrl-c, shutting down"),
        _ = terminate => tracing::info!("received SIGTERM, shutting down"),
    }
}
