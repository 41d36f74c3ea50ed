//! Endpoints for the calling identity itself.

use axum::extract::State;
use axum::Json;

use service_core::error::AppError;
use service_core::middleware::AuthUser;

use crate::dtos::ErrorResponse;
use crate::models::IdentityResponse;
use crate::AppState;

/// The caller's own identity record, looked up fresh so state changes
/// made after token issue are visible.
#[utoipa::path(
    get,
    path = "/users/me",
    responses(
        (status = 200, description = "Current identity", body = IdentityResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 404, description = "Identity no longer exists", body = ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "users"
)]
pub async fn me(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
) -> Result<Json<IdentityResponse>, AppError> {
    let identity = state
        .store
        .find_by_id(claims.sub)
        .await
        .map_err(AppError::from)?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Identity not found")))?;

    Ok(Json(identity.sanitized()))
}
