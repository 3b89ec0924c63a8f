use std::collections::HashSet;

use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use uuid::Uuid;

use crate::error::AppError;
use crate::geo::GeoPoint;
use crate::models::registration::{JobCategory, Registration, Status, TimeSlot};
use crate::shift::ShiftWindow;

/// Fields accepted from a validated submission. Id, queue number, status and
/// creation timestamp are assigned at insert.
#[derive(Debug, Clone)]
pub struct NewRegistration {
    pub line_user_id: String,
    pub driver_name: String,
    pub vehicle_plate: String,
    pub carrier: String,
    pub job: JobCategory,
    pub trip_number: Option<String>,
    pub time_slot: TimeSlot,
    pub check_in: GeoPoint,
}

/// In-process registry of the queue. A secondary index keyed by
/// (shift day, slot, identity) backs the one-registration-per-shift rule;
/// going through its entry API makes check-and-insert atomic per key, so a
/// concurrent double submission loses at the insert rather than slipping past
/// a separate pre-check.
pub struct RegistrationStore {
    registrations: DashMap<Uuid, Registration>,
    shift_index: DashMap<(String, TimeSlot, String), Uuid>,
    sequences: DashMap<(String, TimeSlot), u32>,
}

impl RegistrationStore {
    pub fn new() -> Self {
        Self {
            registrations: DashMap::new(),
            shift_index: DashMap::new(),
            sequences: DashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.registrations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }

    /// Conditional insert: fails with the blocking queue number if a
    /// non-cancelled registration already holds the (day, slot, identity)
    /// key. A cancelled holder releases the key.
    pub fn insert(
        &self,
        new: NewRegistration,
        day_key: &str,
        now: DateTime<Utc>,
    ) -> Result<Registration, AppError> {
        let key = (day_key.to_string(), new.time_slot, new.line_user_id.clone());

        match self.shift_index.entry(key) {
            Entry::Occupied(mut holder) => {
                let blocking = self
                    .registrations
                    .get(holder.get())
                    .map(|entry| entry.value().clone());

                match blocking {
                    Some(existing) if existing.status != Status::Cancelled => {
                        Err(AppError::DuplicateRegistration {
                            queue_number: existing.queue_number,
                            slot: existing.time_slot,
                        })
                    }
                    _ => {
                        let registration = self.build(new, day_key, now);
                        holder.insert(registration.id);
                        self.registrations
                            .insert(registration.id, registration.clone());
                        Ok(registration)
                    }
                }
            }
            Entry::Vacant(slot) => {
                let registration = self.build(new, day_key, now);
                slot.insert(registration.id);
                self.registrations
                    .insert(registration.id, registration.clone());
                Ok(registration)
            }
        }
    }

    fn build(&self, new: NewRegistration, day_key: &str, now: DateTime<Utc>) -> Registration {
        let sequence = {
            let mut counter = self
                .sequences
                .entry((day_key.to_string(), new.time_slot))
                .or_insert(0);
            *counter += 1;
            *counter
        };

        Registration {
            id: Uuid::new_v4(),
            queue_number: format!("{}{:03}", new.time_slot.prefix(), sequence),
            line_user_id: new.line_user_id,
            driver_name: new.driver_name,
            vehicle_plate: new.vehicle_plate,
            carrier: new.carrier,
            job: new.job,
            trip_number: new.trip_number,
            time_slot: new.time_slot,
            status: Status::Pending,
            check_in: new.check_in,
            created_at: now,
        }
    }

    pub fn get(&self, id: Uuid) -> Option<Registration> {
        self.registrations.get(&id).map(|entry| entry.value().clone())
    }

    /// Newest non-cancelled registration for the identity and slot inside the
    /// window, if any.
    pub fn find_duplicate(
        &self,
        line_user_id: &str,
        slot: TimeSlot,
        window: &ShiftWindow,
    ) -> Option<Registration> {
        self.registrations
            .iter()
            .filter(|entry| {
                let r = entry.value();
                r.line_user_id == line_user_id
                    && r.time_slot == slot
                    && r.status != Status::Cancelled
                    && window.contains(r.created_at)
            })
            .map(|entry| entry.value().clone())
            .max_by_key(|r| r.created_at)
    }

    /// Registrations created inside the window, newest first, optionally
    /// narrowed by slot and identity.
    pub fn list_window(
        &self,
        window: &ShiftWindow,
        slot: Option<TimeSlot>,
        line_user_id: Option<&str>,
    ) -> Vec<Registration> {
        let mut rows: Vec<Registration> = self
            .registrations
            .iter()
            .filter(|entry| {
                let r = entry.value();
                window.contains(r.created_at)
                    && slot.map_or(true, |s| r.time_slot == s)
                    && line_user_id.map_or(true, |id| r.line_user_id == id)
            })
            .map(|entry| entry.value().clone())
            .collect();

        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        rows
    }

    pub fn count_window(&self, window: &ShiftWindow) -> usize {
        self.registrations
            .iter()
            .filter(|entry| window.contains(entry.value().created_at))
            .count()
    }

    pub fn update_status(&self, id: Uuid, next: Status) -> Result<Registration, AppError> {
        let mut entry = self
            .registrations
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("registration {id} not found")))?;

        if !entry.status.can_transition_to(next) {
            return Err(AppError::InvalidTransition(format!(
                "{} -> {}",
                entry.status, next
            )));
        }

        entry.status = next;
        Ok(entry.clone())
    }

    /// Drops registrations created before `cutoff` along with their index and
    /// sequence entries, so a fresh shift starts numbering from 001 again.
    pub fn clear_before(&self, cutoff: DateTime<Utc>) -> usize {
        let stale: Vec<Uuid> = self
            .registrations
            .iter()
            .filter(|entry| entry.value().created_at < cutoff)
            .map(|entry| *entry.key())
            .collect();

        for id in &stale {
            self.registrations.remove(id);
        }

        self.shift_index
            .retain(|_, id| self.registrations.contains_key(id));

        let live: HashSet<(String, TimeSlot)> = self
            .shift_index
            .iter()
            .map(|entry| (entry.key().0.clone(), entry.key().1))
            .collect();
        self.sequences.retain(|key, _| live.contains(key));

        stale.len()
    }
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Duration, Utc};
    use uuid::Uuid;

    use super::{NewRegistration, RegistrationStore};
    use crate::error::AppError;
    use crate::geo::GeoPoint;
    use crate::models::registration::{HeavyJob, JobCategory, Status, TimeSlot};
    use crate::shift::ShiftWindow;

    fn now() -> DateTime<Utc> {
        "2026-08-06T03:00:00Z".parse().unwrap()
    }

    fn window() -> ShiftWindow {
        ShiftWindow {
            start: "2026-08-05T11:00:00Z".parse().unwrap(),
            end: "2026-08-06T11:00:00Z".parse().unwrap(),
        }
    }

    fn new_registration(user: &str, slot: TimeSlot) -> NewRegistration {
        NewRegistration {
            line_user_id: user.to_string(),
            driver_name: "Somchai J.".to_string(),
            vehicle_plate: "83-1234".to_string(),
            carrier: "TBL-North".to_string(),
            job: JobCategory::Heavy(HeavyJob::Returns),
            trip_number: None,
            time_slot: slot,
            check_in: GeoPoint {
                lat: 18.7613,
                lng: 99.0605,
            },
        }
    }

    #[test]
    fn queue_numbers_are_sequential_per_slot() {
        let store = RegistrationStore::new();
        let first = store
            .insert(new_registration("U1", TimeSlot::Morning), "2026-08-05", now())
            .unwrap();
        let second = store
            .insert(new_registration("U2", TimeSlot::Morning), "2026-08-05", now())
            .unwrap();
        let afternoon = store
            .insert(new_registration("U1", TimeSlot::Afternoon), "2026-08-05", now())
            .unwrap();

        assert_eq!(first.queue_number, "M001");
        assert_eq!(second.queue_number, "M002");
        assert_eq!(afternoon.queue_number, "A001");
    }

    #[test]
    fn duplicate_insert_reports_existing_queue_number() {
        let store = RegistrationStore::new();
        let first = store
            .insert(new_registration("U1", TimeSlot::Morning), "2026-08-05", now())
            .unwrap();

        let err = store
            .insert(new_registration("U1", TimeSlot::Morning), "2026-08-05", now())
            .unwrap_err();

        match err {
            AppError::DuplicateRegistration { queue_number, slot } => {
                assert_eq!(queue_number, first.queue_number);
                assert_eq!(slot, TimeSlot::Morning);
            }
            other => panic!("expected duplicate, got {other:?}"),
        }
    }

    #[test]
    fn other_slot_and_next_shift_are_not_duplicates() {
        let store = RegistrationStore::new();
        store
            .insert(new_registration("U1", TimeSlot::Morning), "2026-08-05", now())
            .unwrap();

        assert!(store
            .insert(new_registration("U1", TimeSlot::Afternoon), "2026-08-05", now())
            .is_ok());
        assert!(store
            .insert(new_registration("U1", TimeSlot::Morning), "2026-08-06", now())
            .is_ok());
    }

    #[test]
    fn cancelled_registration_releases_the_slot() {
        let store = RegistrationStore::new();
        let first = store
            .insert(new_registration("U1", TimeSlot::Morning), "2026-08-05", now())
            .unwrap();
        store.update_status(first.id, Status::Cancelled).unwrap();

        let second = store
            .insert(new_registration("U1", TimeSlot::Morning), "2026-08-05", now())
            .unwrap();
        assert_eq!(second.queue_number, "M002");
    }

    #[test]
    fn find_duplicate_ignores_cancelled_and_out_of_window_rows() {
        let store = RegistrationStore::new();
        let early = window().start - Duration::hours(1);
        store
            .insert(new_registration("U1", TimeSlot::Morning), "2026-08-04", early)
            .unwrap();
        assert!(store
            .find_duplicate("U1", TimeSlot::Morning, &window())
            .is_none());

        let current = store
            .insert(new_registration("U1", TimeSlot::Morning), "2026-08-05", now())
            .unwrap();
        assert_eq!(
            store
                .find_duplicate("U1", TimeSlot::Morning, &window())
                .unwrap()
                .id,
            current.id
        );

        store.update_status(current.id, Status::Cancelled).unwrap();
        assert!(store
            .find_duplicate("U1", TimeSlot::Morning, &window())
            .is_none());
    }

    #[test]
    fn list_window_is_newest_first_and_filterable() {
        let store = RegistrationStore::new();
        let older = now() - Duration::minutes(30);
        store
            .insert(new_registration("U1", TimeSlot::Morning), "2026-08-05", older)
            .unwrap();
        store
            .insert(new_registration("U2", TimeSlot::Afternoon), "2026-08-05", now())
            .unwrap();

        let all = store.list_window(&window(), None, None);
        assert_eq!(all.len(), 2);
        assert!(all[0].created_at > all[1].created_at);

        let mine = store.list_window(&window(), None, Some("U1"));
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].line_user_id, "U1");

        let morning = store.list_window(&window(), Some(TimeSlot::Morning), None);
        assert_eq!(morning.len(), 1);
    }

    #[test]
    fn illegal_transition_is_rejected() {
        let store = RegistrationStore::new();
        let row = store
            .insert(new_registration("U1", TimeSlot::Morning), "2026-08-05", now())
            .unwrap();

        let err = store.update_status(row.id, Status::Completed).unwrap_err();
        assert!(matches!(err, AppError::InvalidTransition(_)));

        let missing = store.update_status(Uuid::new_v4(), Status::Confirmed);
        assert!(matches!(missing, Err(AppError::NotFound(_))));
    }

    #[test]
    fn clear_before_drops_old_rows_and_resets_sequences() {
        let store = RegistrationStore::new();
        let yesterday = window().start - Duration::hours(2);
        store
            .insert(new_registration("U1", TimeSlot::Morning), "2026-08-04", yesterday)
            .unwrap();
        store
            .insert(new_registration("U2", TimeSlot::Morning), "2026-08-05", now())
            .unwrap();

        let deleted = store.clear_before(window().start);
        assert_eq!(deleted, 1);
        assert_eq!(store.len(), 1);

        // The cleared shift's sequence is gone; a rerun of that day restarts.
        let fresh = store
            .insert(new_registration("U3", TimeSlot::Morning), "2026-08-04", now())
            .unwrap();
        assert_eq!(fresh.queue_number, "M001");
    }
}
