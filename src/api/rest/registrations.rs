use std::sync::Arc;
use std::time::Instant;

use axum::extract::{Path, Query, State};
use axum::routing::{get, patch, post};
use axum::Json;
use axum::Router;
use chrono::Utc;
use serde::Deserialize;
use tracing::warn;
use uuid::Uuid;

use crate::engine::submission::{self, SubmissionRequest};
use crate::error::AppError;
use crate::models::event::QueueEvent;
use crate::models::registration::{Registration, Status, TimeSlot};
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/registrations",
            post(submit_registration).get(list_registrations),
        )
        .route("/registrations/:id", get(get_registration))
        .route("/registrations/:id/status", patch(update_status))
}

async fn submit_registration(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<SubmissionRequest>,
) -> Result<Json<Registration>, AppError> {
    let start = Instant::now();
    let now = Utc::now();

    let result = submission::process(&state, payload, now).await;

    let elapsed = start.elapsed().as_secs_f64();
    let outcome = match &result {
        Ok(_) => "success",
        Err(err) => err.code(),
    };
    state
        .metrics
        .submission_latency_seconds
        .with_label_values(&[outcome])
        .observe(elapsed);
    state
        .metrics
        .submissions_total
        .with_label_values(&[outcome])
        .inc();

    match result {
        Ok(registration) => {
            let window = state.shift_clock.current_window(now);
            state
                .metrics
                .registrations_in_shift
                .set(state.store.count_window(&window) as i64);
            Ok(Json(registration))
        }
        Err(err) => {
            warn!(error = %err, outcome, "submission rejected");
            Err(err)
        }
    }
}

#[derive(Deserialize)]
pub struct ListQuery {
    pub slot: Option<TimeSlot>,
    pub line_user_id: Option<String>,
}

async fn list_registrations(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> Json<Vec<Registration>> {
    let window = state.shift_clock.current_window(Utc::now());
    Json(
        state
            .store
            .list_window(&window, query.slot, query.line_user_id.as_deref()),
    )
}

async fn get_registration(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Registration>, AppError> {
    state
        .store
        .get(id)
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("registration {id} not found")))
}

#[derive(Deserialize)]
pub struct UpdateStatusRequest {
    pub status: Status,
}

async fn update_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateStatusRequest>,
) -> Result<Json<Registration>, AppError> {
    let registration = state.store.update_status(id, payload.status)?;

    let _ = state.queue_events_tx.send(QueueEvent::StatusChanged {
        registration: registration.clone(),
    });

    Ok(Json(registration))
}
