use std::sync::Arc;

use axum::extract::State;
use axum::http::{header, HeaderMap};
use axum::routing::get;
use axum::Json;
use axum::Router;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use crate::error::AppError;
use crate::models::event::QueueEvent;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/cron/clear-queues", get(clear_queues))
}

#[derive(Serialize)]
pub struct ClearResponse {
    pub success: bool,
    pub deleted: usize,
    pub timestamp: DateTime<Utc>,
}

/// Invoked by the external scheduler; drops everything older than the
/// current shift window. Guarded by a shared bearer secret; an unset secret
/// disables the endpoint entirely.
async fn clear_queues(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<ClearResponse>, AppError> {
    let expected = format!("Bearer {}", state.cron_secret);
    let supplied = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok());

    if state.cron_secret.is_empty() || supplied != Some(expected.as_str()) {
        return Err(AppError::Unauthorized);
    }

    let now = Utc::now();
    let window = state.shift_clock.current_window(now);
    let deleted = state.store.clear_before(window.start);

    state.metrics.cleanup_deleted_total.inc_by(deleted as u64);
    state
        .metrics
        .registrations_in_shift
        .set(state.store.count_window(&window) as i64);

    let _ = state
        .queue_events_tx
        .send(QueueEvent::QueuesCleared { deleted });

    info!(deleted, "cleared past-shift registrations");

    Ok(Json(ClearResponse {
        success: true,
        deleted,
        timestamp: now,
    }))
}
