pub mod metrics;
pub mod security_headers;
pub mod tracing;

use tower_http::cors::{Any, CorsLayer};

/// Allows any origin to read responses (`Access-Control-Allow-Origin: *`).
pub fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
}
