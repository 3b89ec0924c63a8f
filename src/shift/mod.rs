use chrono::{DateTime, Duration, FixedOffset, Timelike, Utc};

use crate::error::AppError;

/// Which interval registrations are deduplicated, listed and exported
/// against. One policy is picked per deployment and used everywhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShiftPolicy {
    /// 24-hour window anchored at a fixed local clock hour.
    Rolling,
    /// Local midnight to next local midnight.
    Calendar,
}

impl std::str::FromStr for ShiftPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "rolling" => Ok(ShiftPolicy::Rolling),
            "calendar" => Ok(ShiftPolicy::Calendar),
            other => Err(format!("unknown shift policy: {other}")),
        }
    }
}

/// Half-open interval [start, end) in UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShiftWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl ShiftWindow {
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start <= instant && instant < self.end
    }
}

/// Computes shift windows in a fixed UTC offset, independent of whatever
/// timezone the caller's device is set to. `now` is always injected so window
/// arithmetic stays deterministic under test.
#[derive(Debug, Clone)]
pub struct ShiftClock {
    policy: ShiftPolicy,
    anchor_hour: u32,
    offset: FixedOffset,
}

impl ShiftClock {
    pub fn new(policy: ShiftPolicy, anchor_hour: u32, offset_hours: i32) -> Result<Self, AppError> {
        if anchor_hour > 23 {
            return Err(AppError::Internal(format!(
                "shift anchor hour out of range: {anchor_hour}"
            )));
        }
        let offset = FixedOffset::east_opt(offset_hours * 3600).ok_or_else(|| {
            AppError::Internal(format!("invalid utc offset: {offset_hours} hours"))
        })?;

        Ok(Self {
            policy,
            anchor_hour,
            offset,
        })
    }

    pub fn current_window(&self, now: DateTime<Utc>) -> ShiftWindow {
        let local = now.with_timezone(&self.offset);

        let (start_date, start_hour) = match self.policy {
            ShiftPolicy::Rolling => {
                // Before the anchor hour the shift started yesterday.
                let date = if local.hour() < self.anchor_hour {
                    local.date_naive() - Duration::days(1)
                } else {
                    local.date_naive()
                };
                (date, self.anchor_hour)
            }
            ShiftPolicy::Calendar => (local.date_naive(), 0),
        };

        let start_local = start_date
            .and_hms_opt(start_hour, 0, 0)
            .expect("anchor hour validated at construction")
            .and_local_timezone(self.offset)
            .single()
            .expect("fixed offsets have unambiguous local times");

        let start = start_local.with_timezone(&Utc);
        ShiftWindow {
            start,
            end: start + Duration::hours(24),
        }
    }

    /// Local start date of the window, the shift component of the store's
    /// uniqueness key.
    pub fn day_key(&self, window: &ShiftWindow) -> String {
        window
            .start
            .with_timezone(&self.offset)
            .format("%Y-%m-%d")
            .to_string()
    }
}
