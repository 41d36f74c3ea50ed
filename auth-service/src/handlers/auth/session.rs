//! Login and token verification endpoints.

use axum::extract::State;
use axum::Json;
use chrono::{DateTime, Utc};

use service_core::error::AppError;
use service_core::middleware::AuthUser;

use crate::dtos::{AuthResponse, ErrorResponse, LoginRequest, VerifyResponse};
use crate::utils::ValidatedJson;
use crate::AppState;

/// Exchange credentials for a session token.
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Authenticated", body = AuthResponse),
        (status = 401, description = "Invalid credentials", body = ErrorResponse),
        (status = 403, description = "Deactivated or email not verified", body = ErrorResponse),
        (status = 429, description = "Rate limited", body = ErrorResponse),
    ),
    tag = "auth"
)]
pub async fn login(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let response = state.auth_flows.login(request).await?;
    Ok(Json(response))
}

/// Echo the verified claims of the presented token, with capabilities
/// resolved fresh from the permission matrix.
#[utoipa::path(
    get,
    path = "/auth/verify",
    responses(
        (status = 200, description = "Token is valid", body = VerifyResponse),
        (status = 401, description = "Missing, malformed, or expired token", body = ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "auth"
)]
pub async fn verify(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
) -> Result<Json<VerifyResponse>, AppError> {
    let capabilities = state.matrix.capabilities_of(&claims.role)?;

    Ok(Json(VerifyResponse {
        identity_id: claims.sub,
        email: claims.email,
        role: claims.role,
        federation_id: claims.federation_id,
        issued_at: timestamp(claims.iat),
        expires_at: timestamp(claims.exp),
        capabilities,
    }))
}

fn timestamp(secs: i64) -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp(secs, 0).unwrap_or_default()
}
