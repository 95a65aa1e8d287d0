use axum::{extract::Request, middleware::Next, response::Response};
use std::time::Instant;

/// Request arrival time, stamped before routing so handlers can report
/// end-to-end latency.
#[derive(Copy, Clone)]
pub struct RequestStart(Instant);

impl RequestStart {
    pub fn elapsed_ms(&self) -> u128 {
        self.0.elapsed().as_millis()
    }
}

pub async fn record_request_start(mut request: Request, next: Next) -> Response {
    request.extensions_mut().insert(RequestStart(Instant::now()));
    next.run(request).await
}
