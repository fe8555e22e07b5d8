use axum::http::Method;
use tower_http::cors::{Any, CorsLayer};

/// Any origin may call the public catalogue and booking endpoints.
pub fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any)
}
