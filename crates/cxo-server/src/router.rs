use axum::routing::{any, get};
use axum::Router;
use tower_http::trace::TraceLayer;

use cxo_protocol::endpoints;

use crate::handler::{self, AppState};

/// Build the axum router with all node endpoints.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route(endpoints::NOTIFY, any(handler::notify_handler))
        .route(endpoints::HEALTH, get(handler::health_handler))
        .route(endpoints::INFO, get(handler::info_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
