use std::sync::Arc;

use tokio::sync::broadcast;

use crate::config::Config;
use crate::error::AppError;
use crate::geo::Geofence;
use crate::identity::IdentityProvider;
use crate::models::event::QueueEvent;
use crate::observability::metrics::Metrics;
use crate::shift::ShiftClock;
use crate::store::RegistrationStore;

pub struct AppState {
    pub store: RegistrationStore,
    pub geofence: Geofence,
    pub shift_clock: ShiftClock,
    pub identity: Arc<dyn IdentityProvider>,
    pub cron_secret: String,
    pub queue_events_tx: broadcast::Sender<QueueEvent>,
    pub metrics: Metrics,
}

impl AppState {
    pub fn new(config: &Config, identity: Arc<dyn IdentityProvider>) -> Result<Self, AppError> {
        let (queue_events_tx, _unused_rx) = broadcast::channel(config.event_buffer_size);

        Ok(Self {
            store: RegistrationStore::new(),
            geofence: config.geofence(),
            shift_clock: config.shift_clock()?,
            identity,
            cron_secret: config.cron_secret.clone(),
            queue_events_tx,
            metrics: Metrics::new(),
        })
    }
}
