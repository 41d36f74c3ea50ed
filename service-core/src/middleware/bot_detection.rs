//! Heuristic bot screening for interactive auth endpoints.
//!
//! Scores the request on its user agent and header shape; anything
//! scoring like an automated client is rejected before it reaches a
//! handler. Health, metrics, and preflight traffic is exempt.

use axum::{extract::Request, http::HeaderMap, http::Method, middleware::Next, response::Response};
use isbot::Bots;

use crate::error::AppError;

const BLOCK_THRESHOLD: u32 = 100;

pub async fn bot_detection_middleware(
    headers: HeaderMap,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    if request.method() == Method::OPTIONS {
        return Ok(next.run(request).await);
    }

    let path = request.uri().path();
    if path == "/health" || path == "/metrics" {
        return Ok(next.run(request).await);
    }

    let user_agent = headers
        .get("User-Agent")
        .and_then(|h| h.to_str().ok())
        .unwrap_or("");

    let score = score_request(user_agent, &headers);

    if score >= BLOCK_THRESHOLD {
        tracing::warn!(
            user_agent = %user_agent,
            score = %score,
            path = %request.uri(),
            "blocking suspected bot request"
        );
        return Err(AppError::Forbidden(anyhow::anyhow!("Bot detected")));
    }

    Ok(next.run(request).await)
}

fn score_request(user_agent: &str, headers: &HeaderMap) -> u32 {
    if user_agent.is_empty() {
        return 50;
    }

    let mut score = 0;

    if Bots::default().is_bot(user_agent) {
        score += 100;
    }

    // A real browser sends the standard Accept-* trio; a Mozilla UA
    // without them is almost always a script wearing a costume.
    if user_agent.starts_with("Mozilla/") {
        let missing = ["Accept", "Accept-Language", "Accept-Encoding"]
            .iter()
            .filter(|name| !headers.contains_key(**name))
            .count();

        score += match missing {
            0 => 0,
            1 => 30,
            _ => 70,
        };
    }

    score
}
