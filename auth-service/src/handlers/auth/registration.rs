//! Registration and email verification endpoints.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;

use service_core::error::AppError;

use crate::dtos::{AuthResponse, ErrorResponse, RegisterRequest, VerifyEmailQuery};
use crate::models::IdentityResponse;
use crate::utils::ValidatedJson;
use crate::AppState;

/// Register a new identity.
#[utoipa::path(
    post,
    path = "/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Identity created", body = AuthResponse),
        (status = 400, description = "Validation, weak password, or unknown role", body = ErrorResponse),
        (status = 409, description = "Email already registered", body = ErrorResponse),
    ),
    tag = "auth"
)]
pub async fn register(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    let response = state.auth_flows.register(request).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// Consume an emailed verification token and mark the email verified.
#[utoipa::path(
    get,
    path = "/auth/verify-email",
    params(VerifyEmailQuery),
    responses(
        (status = 200, description = "Email verified", body = IdentityResponse),
        (status = 400, description = "Token invalid, used, or expired", body = ErrorResponse),
    ),
    tag = "auth"
)]
pub async fn verify_email(
    State(state): State<AppState>,
    Query(query): Query<VerifyEmailQuery>,
) -> Result<Json<IdentityResponse>, AppError> {
    let identity = state.auth_flows.verify_email(&query.token).await?;
    Ok(Json(identity))
}
