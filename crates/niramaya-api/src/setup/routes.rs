//! Route configuration and setup

use crate::handlers;
use crate::state::AppState;
use axum::{
    http::{HeaderValue, Method},
    routing::{get, post},
    Router,
};
use niramaya_core::Config;
use niramaya_infra::request_id_middleware;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Setup all application routes
///
/// The upload handler reads the raw body stream, so no body-size layer sits in front
/// of it; per-part limits are enforced while parsing.
pub fn setup_routes(config: &Config, state: Arc<AppState>) -> Result<Router<()>, anyhow::Error> {
    let cors = setup_cors(config)?;

    let app = Router::new()
        .route("/", get(handlers::root::welcome))
        .route("/health", get(handlers::health::health_check))
        .route("/upload", post(handlers::upload::upload_files))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .layer(axum::middleware::from_fn(request_id_middleware))
        .with_state(state);

    Ok(app)
}

/// Setup CORS configuration
fn setup_cors(config: &Config) -> Result<CorsLayer, anyhow::Error> {
    let methods = [Method::GET, Method::POST, Method::OPTIONS];

    if config.cors_origins().iter().any(|o| o == "*") {
        tracing::warn!("CORS configured to allow all origins - not recommended for production");
        return Ok(CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(methods)
            .allow_headers(Any));
    }

    let origins = config
        .cors_origins()
        .iter()
        .map(|o| {
            o.parse::<HeaderValue>()
                .map_err(|e| anyhow::anyhow!("Invalid CORS origin '{}': {}", o, e))
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(methods)
        .allow_headers(Any))
}

#[cfg(test)]
mod tests {
    use super::*;
    use niramaya_core::UploadServiceConfig;

    #[test]
    fn test_invalid_cors_origin_is_rejected() {
        let mut inner = UploadServiceConfig::with_upload_dir("/tmp/uploads");
        inner.base.cors_origins = vec!["https://ok.example".to_string(), "bad\norigin".to_string()];
        assert!(setup_cors(&Config(Box::new(inner))).is_err());
    }

    #[test]
    fn test_explicit_origins_are_accepted() {
        let mut inner = UploadServiceConfig::with_upload_dir("/tmp/uploads");
        inner.base.cors_origins = vec!["https://app.example".to_string()];
        assert!(setup_cors(&Config(Box::new(inner))).is_ok());
    }
}
