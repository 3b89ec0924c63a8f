use std::env;

use crate::error::AppError;
use crate::geo::{GeoPoint, Geofence};
use crate::identity::IdentityBackend;
use crate::shift::{ShiftClock, ShiftPolicy};

#[derive(Debug, Clone)]
pub struct Config {
    pub http_port: u16,
    pub log_level: String,
    pub event_buffer_size: usize,
    pub shift_policy: ShiftPolicy,
    pub shift_anchor_hour: u32,
    pub utc_offset_hours: i32,
    pub geofence_lat_min: f64,
    pub geofence_lat_max: f64,
    pub geofence_lng_min: f64,
    pub geofence_lng_max: f64,
    pub accuracy_threshold_m: f64,
    pub cron_secret: String,
    pub identity_backend: IdentityBackend,
    pub line_channel_id: String,
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        let _ = dotenvy::dotenv();

        Ok(Self {
            http_port: parse_or_default("HTTP_PORT", 3000)?,
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            event_buffer_size: parse_or_default("EVENT_BUFFER_SIZE", 1024)?,
            shift_policy: parse_or_default("SHIFT_POLICY", ShiftPolicy::Rolling)?,
            shift_anchor_hour: parse_or_default("SHIFT_ANCHOR_HOUR", 18)?,
            utc_offset_hours: parse_or_default("UTC_OFFSET_HOURS", 7)?,
            geofence_lat_min: parse_or_default("GEOFENCE_LAT_MIN", 18.761_000)?,
            geofence_lat_max: parse_or_default("GEOFENCE_LAT_MAX", 18.761_650)?,
            geofence_lng_min: parse_or_default("GEOFENCE_LNG_MIN", 99.060_200)?,
            geofence_lng_max: parse_or_default("GEOFENCE_LNG_MAX", 99.060_750)?,
            accuracy_threshold_m: parse_or_default("GPS_ACCURACY_THRESHOLD_M", 50.0)?,
            cron_secret: env::var("CRON_SECRET").unwrap_or_default(),
            identity_backend: parse_or_default("IDENTITY_BACKEND", IdentityBackend::Line)?,
            line_channel_id: env::var("LINE_CHANNEL_ID").unwrap_or_default(),
        })
    }

    pub fn geofence(&self) -> Geofence {
        Geofence::new(
            GeoPoint {
                lat: self.geofence_lat_min,
                lng: self.geofence_lng_min,
            },
            GeoPoint {
                lat: self.geofence_lat_max,
                lng: self.geofence_lng_max,
            },
            self.accuracy_threshold_m,
        )
    }

    pub fn shift_clock(&self) -> Result<ShiftClock, AppError> {
        ShiftClock::new(self.shift_policy, self.shift_anchor_hour, self.utc_offset_hours)
    }
}

fn parse_or_default<T>(key: &str, default: T) -> Result<T, AppError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .map_err(|err| AppError::Internal(format!("invalid {key}: {err}"))),
        Err(_) => Ok(default),
    }
}
