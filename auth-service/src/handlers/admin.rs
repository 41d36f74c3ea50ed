//! Privileged identity-administration endpoints.
//!
//! Each handler guards with `require_capability` before touching the
//! target; the capability names match the permission matrix.

use axum::extract::{Path, State};
use axum::Json;
use uuid::Uuid;

use service_core::error::AppError;
use service_core::middleware::AuthUser;

use crate::dtos::{ErrorResponse, UpdateRoleRequest};
use crate::models::IdentityResponse;
use crate::utils::ValidatedJson;
use crate::AppState;

/// Change an identity's role.
#[utoipa::path(
    patch,
    path = "/auth/users/{identity_id}/role",
    params(("identity_id" = Uuid, Path, description = "Target identity")),
    request_body = UpdateRoleRequest,
    responses(
        (status = 200, description = "Role updated", body = IdentityResponse),
        (status = 400, description = "Unknown role", body = ErrorResponse),
        (status = 403, description = "Caller lacks manage_roles", body = ErrorResponse),
        (status = 404, description = "Identity not found", body = ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "admin"
)]
pub async fn update_role(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Path(identity_id): Path<Uuid>,
    ValidatedJson(request): ValidatedJson<UpdateRoleRequest>,
) -> Result<Json<IdentityResponse>, AppError> {
    state.matrix.require_capability(&claims, "manage_roles")?;
    let identity = state.admin.update_role(identity_id, &request.role).await?;
    Ok(Json(identity))
}

/// Deactivate an identity. Its tokens keep verifying until expiry, but
/// login is refused immediately.
#[utoipa::path(
    post,
    path = "/auth/users/{identity_id}/deactivate",
    params(("identity_id" = Uuid, Path, description = "Target identity")),
    responses(
        (status = 200, description = "Identity deactivated", body = IdentityResponse),
        (status = 400, description = "Already deactivated", body = ErrorResponse),
        (status = 403, description = "Caller lacks manage_users", body = ErrorResponse),
        (status = 404, description = "Identity not found", body = ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "admin"
)]
pub async fn deactivate(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Path(identity_id): Path<Uuid>,
) -> Result<Json<IdentityResponse>, AppError> {
    state.matrix.require_capability(&claims, "manage_users")?;
    let identity = state.admin.deactivate(identity_id).await?;
    Ok(Json(identity))
}

/// Reactivate a deactivated identity.
#[utoipa::path(
    post,
    path = "/auth/users/{identity_id}/reactivate",
    params(("identity_id" = Uuid, Path, description = "Target identity")),
    responses(
        (status = 200, description = "Identity reactivated", body = IdentityResponse),
        (status = 400, description = "Not deactivated", body = ErrorResponse),
        (status = 403, description = "Caller lacks manage_users", body = ErrorResponse),
        (status = 404, description = "Identity not found", body = ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "admin"
)]
pub async fn reactivate(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Path(identity_id): Path<Uuid>,
) -> Result<Json<IdentityResponse>, AppError> {
    state.matrix.require_capability(&claims, "manage_users")?;
    let identity = state.admin.reactivate(identity_id).await?;
    Ok(Json(identity))
}
