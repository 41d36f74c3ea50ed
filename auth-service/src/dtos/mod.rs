pub mod admin;
pub mod auth;

use serde::Serialize;
use utoipa::ToSchema;

pub use admin::UpdateRoleRequest;
pub use auth::{
    AuthResponse, LoginRequest, MessageResponse, PasswordResetConfirmRequest,
    PasswordResetRequest, RegisterRequest, TokenResponse, VerifyEmailQuery, VerifyResponse,
};

/// Error body shape shared by every endpoint.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Stable machine-readable code, e.g. `invalid_credentials`.
    pub code: String,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}
