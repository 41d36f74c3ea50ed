//! Bearer-token authentication layer.
//!
//! The single verified-decode entry point for HTTP requests: extracts
//! the bearer token, verifies it through [`TokenService`], and stores
//! the resulting [`Claims`] in request extensions. Handlers never see
//! unverified claims.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts},
    middleware::Next,
    response::Response,
};

use crate::auth::token::{Claims, TokenService};
use crate::error::AppError;

/// Pull the bearer token out of the `Authorization` header.
pub fn bearer_token(parts: &axum::http::HeaderMap) -> Result<&str, AppError> {
    parts
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or(AppError::TokenMissing)
}

/// Require a valid bearer token; verified claims land in request
/// extensions for [`AuthUser`] to pick up.
pub async fn bearer_auth_middleware(
    State(tokens): State<TokenService>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = bearer_token(req.headers())?;
    let claims = tokens.verify(token)?;

    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}

/// Extractor for the verified claims of the calling identity.
///
/// Only meaningful on routes behind [`bearer_auth_middleware`]; a route
/// outside it has no claims and the extractor fails loudly rather than
/// inventing an anonymous identity.
pub struct AuthUser(pub Claims);

#[axum::async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let claims = parts.extensions.get::<Claims>().ok_or_else(|| {
            AppError::InternalError(anyhow::anyhow!(
                "auth claims missing from request extensions; route is not behind bearer auth"
            ))
        })?;

        Ok(AuthUser(claims.clone()))
    }
}
