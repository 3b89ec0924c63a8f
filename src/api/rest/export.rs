use std::sync::Arc;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use chrono::Utc;

use crate::error::AppError;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/export", get(export_csv))
}

/// Current shift's queue as a CSV download for the back office.
async fn export_csv(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, AppError> {
    let window = state.shift_clock.current_window(Utc::now());
    let rows = state.store.list_window(&window, None, None);

    let mut writer = csv::Writer::from_writer(Vec::new());
    writer
        .write_record([
            "queue_number",
            "time_slot",
            "driver_name",
            "vehicle_plate",
            "carrier",
            "truck_class",
            "job_type",
            "trip_number",
            "status",
            "created_at",
        ])
        .map_err(|err| AppError::Internal(format!("csv header write failed: {err}")))?;

    for row in &rows {
        let time_slot = row.time_slot.to_string();
        let status = row.status.to_string();
        let created_at = row.created_at.to_rfc3339();
        writer
            .write_record([
                row.queue_number.as_str(),
                time_slot.as_str(),
                row.driver_name.as_str(),
                row.vehicle_plate.as_str(),
                row.carrier.as_str(),
                row.job.class_label(),
                row.job.job_label(),
                row.trip_number.as_deref().unwrap_or(""),
                status.as_str(),
                created_at.as_str(),
            ])
            .map_err(|err| AppError::Internal(format!("csv row write failed: {err}")))?;
    }

    let body = writer
        .into_inner()
        .map_err(|err| AppError::Internal(format!("csv flush failed: {err}")))?;
    let csv = String::from_utf8(body)
        .map_err(|err| AppError::Internal(format!("csv is not valid utf8: {err}")))?;

    let disposition = format!(
        "attachment; filename=\"queues-{}.csv\"",
        state.shift_clock.day_key(&window)
    );

    Ok((
        [
            ("content-type", "text/csv; charset=utf-8".to_string()),
            ("content-disposition", disposition),
        ],
        csv,
    ))
}
