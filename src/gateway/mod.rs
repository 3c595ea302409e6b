mod http;
mod ws;

use axum::http::Method;
use axum::routing::get;
use axum::Router;
use tower_http::cors::{Any, CorsLayer};

use crate::state::AppState;

/// Builds the full HTTP + WebSocket router.
///
/// CORS is wide open: any origin may call `/servers`, `/resolve/:code`,
/// `/health`, and open a relay WebSocket.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers([axum::http::header::CONTENT_TYPE]);

    Router::new()
        .route("/servers", get(http::list_servers))
        .route("/resolve/:code", get(http::resolve_invite))
        .route("/health", get(http::health))
        .route("/connect/:host/:port", get(ws::upgrade))
        .fallback(http::fallback)
        .layer(cors)
        .with_state(state)
}
