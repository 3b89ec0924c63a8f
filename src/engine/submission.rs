use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::info;

use crate::engine::eligibility;
use crate::error::AppError;
use crate::geo::{GeoPoint, LocationFix};
use crate::models::event::QueueEvent;
use crate::models::registration::{HeavyJob, JobCategory, LightJob, Registration, TimeSlot};
use crate::state::AppState;
use crate::store::NewRegistration;

/// Everything the client sends with one submission attempt. Immutable for the
/// whole flow; each stage derives what it needs instead of mutating shared
/// form state.
#[derive(Debug, Clone, Deserialize)]
pub struct SubmissionRequest {
    pub access_token: Option<String>,
    pub driver_name: String,
    pub vehicle_plate: String,
    pub carrier: String,
    pub heavy_job: Option<HeavyJob>,
    pub light_job: Option<LightJob>,
    pub trip_number: Option<String>,
    pub time_slot: Option<TimeSlot>,
    /// Device GPS reading; absent when acquisition failed client-side.
    pub location: Option<LocationFix>,
    /// Client-reported acquisition failure, surfaced verbatim.
    pub location_error: Option<String>,
}

struct ValidForm {
    driver_name: String,
    vehicle_plate: String,
    carrier: String,
    job: JobCategory,
    trip_number: Option<String>,
    time_slot: TimeSlot,
}

/// The submission flow: validate, locate, geofence, identify, dedup, persist.
/// Strictly ordered, no retries; the first failing stage ends the attempt.
pub async fn process(
    state: &AppState,
    request: SubmissionRequest,
    now: DateTime<Utc>,
) -> Result<Registration, AppError> {
    let form = validate(&request)?;
    let fix = locate(&request)?;

    let check = state.geofence.evaluate(&fix);
    if !check.within_area {
        return Err(AppError::GeofenceRejected {
            distance_m: check.distance_m,
            message: check.message,
        });
    }

    let token = request.access_token.as_deref().ok_or_else(|| {
        AppError::AuthenticationRequired("log in through LINE before registering".to_string())
    })?;
    let profile = state.identity.verify(token).await?;

    let window = state.shift_clock.current_window(now);
    eligibility::check_duplicate(&state.store, &profile.user_id, form.time_slot, &window)?;

    let registration = state.store.insert(
        NewRegistration {
            line_user_id: profile.user_id,
            driver_name: form.driver_name,
            vehicle_plate: form.vehicle_plate,
            carrier: form.carrier,
            job: form.job,
            trip_number: form.trip_number,
            time_slot: form.time_slot,
            check_in: GeoPoint {
                lat: fix.lat,
                lng: fix.lng,
            },
        },
        &state.shift_clock.day_key(&window),
        now,
    )?;

    info!(
        queue_number = %registration.queue_number,
        slot = %registration.time_slot,
        distance_m = check.distance_m,
        "registration created"
    );

    let _ = state.queue_events_tx.send(QueueEvent::Registered {
        registration: registration.clone(),
    });

    Ok(registration)
}

/// Pure field validation; runs before any network or store access.
fn validate(request: &SubmissionRequest) -> Result<ValidForm, AppError> {
    let time_slot = request.time_slot.ok_or_else(|| {
        AppError::Validation("select a time slot (morning or afternoon)".to_string())
    })?;

    let job = match (request.heavy_job, request.light_job) {
        (Some(heavy), None) => JobCategory::Heavy(heavy),
        (None, Some(light)) => JobCategory::Light(light),
        (Some(_), Some(_)) => {
            return Err(AppError::Validation(
                "select either a heavy or a light truck job, not both".to_string(),
            ))
        }
        (None, None) => {
            return Err(AppError::Validation(
                "select a job type (heavy or light truck)".to_string(),
            ))
        }
    };

    let driver_name = required(&request.driver_name, "driver name")?;
    let vehicle_plate = required(&request.vehicle_plate, "vehicle plate")?;
    let carrier = required(&request.carrier, "carrier")?;

    let trip_number = request
        .trip_number
        .as_deref()
        .map(str::trim)
        .filter(|trip| !trip.is_empty())
        .map(str::to_string);

    if job.requires_trip_number() && trip_number.is_none() {
        return Err(AppError::Validation(
            "specify the pickup trip for freight-out jobs".to_string(),
        ));
    }

    Ok(ValidForm {
        driver_name,
        vehicle_plate,
        carrier,
        job,
        trip_number,
        time_slot,
    })
}

fn required(value: &str, field: &str) -> Result<String, AppError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::Validation(format!("{field} cannot be empty")));
    }
    Ok(trimmed.to_string())
}

/// A missing fix is a location failure, never a geofence verdict.
fn locate(request: &SubmissionRequest) -> Result<LocationFix, AppError> {
    if let Some(reason) = &request.location_error {
        return Err(AppError::LocationUnavailable(reason.clone()));
    }

    request.location.ok_or_else(|| {
        AppError::LocationUnavailable(
            "no gps fix supplied; enable location access and try again".to_string(),
        )
    })
}
