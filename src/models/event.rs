use serde::Serialize;

use crate::models::registration::Registration;

/// Broadcast to live staff views over the websocket feed.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum QueueEvent {
    Registered { registration: Registration },
    StatusChanged { registration: Registration },
    QueuesCleared { deleted: usize },
}
