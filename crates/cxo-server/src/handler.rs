use axum::body::Bytes;
use axum::extract::State;
use axum::http::Method;
use axum::response::Json;
use serde_json::json;

use cxo_protocol::{AnnounceAck, AnnouncementCodec, HealthResponse, PROTOCOL_VERSION};

use crate::error::{ServerError, ServerResult};
use crate::scheduler::NotificationScheduler;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    scheduler: NotificationScheduler,
}

impl AppState {
    pub fn new(scheduler: NotificationScheduler) -> Self {
        Self { scheduler }
    }

    pub fn scheduler(&self) -> &NotificationScheduler {
        &self.scheduler
    }
}

/// Accept a root-hash announcement.
///
/// Only `POST` is served; the route answers every other method with 404.
/// The body is validated before anything is scheduled, and the response is
/// sent without waiting for the pipeline.
pub async fn notify_handler(
    State(state): State<AppState>,
    method: Method,
    body: Bytes,
) -> ServerResult<Json<AnnounceAck>> {
    if method != Method::POST {
        return Err(ServerError::NotFound);
    }
    let root = AnnouncementCodec::decode(&body)?;
    let key = root.key();
    state.scheduler.schedule(root).await?;
    tracing::info!(key = %key, "announcement accepted");
    Ok(Json(AnnounceAck::accepted(&key)))
}

pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::default())
}

pub async fn info_handler(State(state): State<AppState>) -> ServerResult<Json<serde_json::Value>> {
    let engine = state.scheduler.engine();
    let stats = engine.store().stats()?;
    Ok(Json(json!({
        "name": "cxo-node",
        "version": env!("CARGO_PKG_VERSION"),
        "protocol_version": PROTOCOL_VERSION,
        "storage_root": engine.config().storage_root.display().to_string(),
        "in_flight": state.scheduler.in_flight(),
        "index": stats,
    })))
}
