//! HTTP service wrapping the classifier.
//!
//! Thin adapter: OCR the upload, classify the text, serialize the result.
//! CORS, request tracing and the upload size limit are applied here.

pub mod routes;

pub use routes::{AppState, ProcessResponse, document_routes};

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::http::HeaderValue;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::config::ServiceConfig;
use crate::error::ServerError;

/// Build the full application: routes plus CORS, tracing and body limit.
pub fn build_app(state: AppState, config: &ServiceConfig) -> Router {
    document_routes(state)
        .layer(DefaultBodyLimit::max(config.max_upload_bytes))
        .layer(cors_layer(config))
        .layer(TraceLayer::new_for_http())
}

/// CORS policy from the configured origins.
pub fn cors_layer(config: &ServiceConfig) -> CorsLayer {
    let base = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if config.allows_any_origin() {
        return base.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = config
        .cors_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    base.allow_origin(AllowOrigin::list(origins))
}

/// Bind and serve until Ctrl-C.
pub async fn serve(app: Router, config: &ServiceConfig) -> Result<(), ServerError> {
    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|source| ServerError::Bind {
            addr: addr.clone(),
            source,
        })?;

    info!(addr = %addr, "Document classification service started");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(ServerError::Serve)?;

    info!("Document classification service stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
