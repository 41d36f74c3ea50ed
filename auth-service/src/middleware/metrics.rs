//! Records request count and latency for every handled request.

use axum::{extract::Request, middleware::Next, response::Response};
use std::time::Instant;

use crate::services::metrics;

pub async fn metrics_middleware(req: Request, next: Next) -> Response {
    let method = req.method().to_string();
    // Raw path, not the matched route: fine for this service's small,
    // parameter-light surface.
    let path = req.uri().path().to_string();
    let start = Instant::now();

    let response = next.run(req).await;

    metrics::observe_request(
        &method,
        &path,
        response.status().as_u16(),
        start.elapsed().as_secs_f64(),
    );
    response
}
