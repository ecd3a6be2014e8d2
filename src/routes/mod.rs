//! HTTP routes

pub mod heartbeat;
pub mod pdf;
pub mod tempfiles;

use axum::http::HeaderValue;
use axum::{routing::get, Router};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Build the full application router
pub fn app(state: AppState) -> Router {
    let storage = &state.config().storage;
    let files = ServeDir::new(&storage.root);

    let router = Router::new()
        .route("/heartbeat", get(heartbeat::heartbeat))
        .nest("/pdf", pdf::router().merge(tempfiles::router()));

    let router = if storage.url_prefix.is_empty() {
        router.fallback_service(files)
    } else {
        router.nest_service(&storage.url_prefix, files)
    };

    router
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&state.config().server.cors_origins))
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if origins.is_empty() {
        return layer.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    layer.allow_origin(AllowOrigin::list(origins))
}
