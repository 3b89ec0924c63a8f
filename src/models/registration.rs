use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::geo::GeoPoint;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeSlot {
    Morning,
    Afternoon,
}

impl TimeSlot {
    /// Queue-number prefix, e.g. `M001` / `A001`.
    pub fn prefix(&self) -> char {
        match self {
            TimeSlot::Morning => 'M',
            TimeSlot::Afternoon => 'A',
        }
    }
}

impl std::fmt::Display for TimeSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            TimeSlot::Morning => "morning",
            TimeSlot::Afternoon => "afternoon",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeavyJob {
    /// Finished-goods pickup; the driver must name the trip.
    FreightOut,
    /// Pallets, bottles and other packaging going back.
    Returns,
}

impl HeavyJob {
    pub fn label(&self) -> &'static str {
        match self {
            HeavyJob::FreightOut => "freight_out",
            HeavyJob::Returns => "returns",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LightJob {
    ReadyForWork,
    Maintenance,
}

impl LightJob {
    pub fn label(&self) -> &'static str {
        match self {
            LightJob::ReadyForWork => "ready_for_work",
            LightJob::Maintenance => "maintenance",
        }
    }
}

/// Heavy and light truck jobs are mutually exclusive on the form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "truck_class", content = "job_type", rename_all = "snake_case")]
pub enum JobCategory {
    Heavy(HeavyJob),
    Light(LightJob),
}

impl JobCategory {
    pub fn class_label(&self) -> &'static str {
        match self {
            JobCategory::Heavy(_) => "heavy",
            JobCategory::Light(_) => "light",
        }
    }

    pub fn job_label(&self) -> &'static str {
        match self {
            JobCategory::Heavy(job) => job.label(),
            JobCategory::Light(job) => job.label(),
        }
    }

    pub fn requires_trip_number(&self) -> bool {
        matches!(self, JobCategory::Heavy(HeavyJob::FreightOut))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Pending,
    Confirmed,
    InProgress,
    Completed,
    Cancelled,
}

impl Status {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Status::Completed | Status::Cancelled)
    }

    pub fn can_transition_to(&self, next: Status) -> bool {
        matches!(
            (self, next),
            (Status::Pending, Status::Confirmed)
                | (Status::Confirmed, Status::InProgress)
                | (Status::InProgress, Status::Completed)
        ) || (next == Status::Cancelled && !self.is_terminal())
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Status::Pending => "pending",
            Status::Confirmed => "confirmed",
            Status::InProgress => "in_progress",
            Status::Completed => "completed",
            Status::Cancelled => "cancelled",
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Registration {
    pub id: Uuid,
    /// Assigned by the store at insert time, immutable afterwards.
    pub queue_number: String,
    pub line_user_id: String,
    pub driver_name: String,
    pub vehicle_plate: String,
    pub carrier: String,
    #[serde(flatten)]
    pub job: JobCategory,
    pub trip_number: Option<String>,
    pub time_slot: TimeSlot,
    pub status: Status,
    pub check_in: GeoPoint,
    pub created_at: DateTime<Utc>,
}
