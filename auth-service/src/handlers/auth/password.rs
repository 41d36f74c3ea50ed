//! Password reset endpoints.

use axum::extract::State;
use axum::Json;

use service_core::error::AppError;

use crate::dtos::{
    ErrorResponse, MessageResponse, PasswordResetConfirmRequest, PasswordResetRequest,
};
use crate::utils::ValidatedJson;
use crate::AppState;

/// Request a password reset email.
///
/// Responds identically whether or not the address exists.
#[utoipa::path(
    post,
    path = "/auth/password-reset/request",
    request_body = PasswordResetRequest,
    responses(
        (status = 200, description = "Reset email sent if the address exists", body = MessageResponse),
        (status = 429, description = "Rate limited", body = ErrorResponse),
    ),
    tag = "auth"
)]
pub async fn request_reset(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<PasswordResetRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    state.auth_flows.request_password_reset(&request.email).await?;
    Ok(Json(MessageResponse {
        message: "If that address is registered, a reset email is on its way.".to_string(),
    }))
}

/// Complete a password reset with an emailed token.
#[utoipa::path(
    post,
    path = "/auth/password-reset/confirm",
    request_body = PasswordResetConfirmRequest,
    responses(
        (status = 200, description = "Password updated", body = MessageResponse),
        (status = 400, description = "Token invalid/expired or weak password", body = ErrorResponse),
    ),
    tag = "auth"
)]
pub async fn confirm_reset(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<PasswordResetConfirmRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    state
        .auth_flows
        .confirm_password_reset(&request.token, &request.new_password)
        .await?;
    Ok(Json(MessageResponse {
        message: "Password updated. You can log in with the new password.".to_string(),
    }))
}
