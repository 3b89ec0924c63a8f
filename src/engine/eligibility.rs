use crate::error::AppError;
use crate::models::registration::TimeSlot;
use crate::shift::ShiftWindow;
use crate::store::RegistrationStore;

/// One registration per identity, slot and shift window. The blocking queue
/// number rides along in the error so the driver sees which ticket they
/// already hold. The store's conditional insert enforces the same rule again,
/// so a race between two concurrent submissions cannot slip past this check.
pub fn check_duplicate(
    store: &RegistrationStore,
    line_user_id: &str,
    slot: TimeSlot,
    window: &ShiftWindow,
) -> Result<(), AppError> {
    match store.find_duplicate(line_user_id, slot, window) {
        Some(existing) => Err(AppError::DuplicateRegistration {
            queue_number: existing.queue_number,
            slot: existing.time_slot,
        }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Utc};

    use super::check_duplicate;
    use crate::error::AppError;
    use crate::geo::GeoPoint;
    use crate::models::registration::{JobCategory, LightJob, TimeSlot};
    use crate::shift::ShiftWindow;
    use crate::store::{NewRegistration, RegistrationStore};

    fn now() -> DateTime<Utc> {
        "2026-08-06T03:00:00Z".parse().unwrap()
    }

    fn window() -> ShiftWindow {
        ShiftWindow {
            start: "2026-08-05T11:00:00Z".parse().unwrap(),
            end: "2026-08-06T11:00:00Z".parse().unwrap(),
        }
    }

    fn seeded_store() -> RegistrationStore {
        let store = RegistrationStore::new();
        store
            .insert(
                NewRegistration {
                    line_user_id: "U1".to_string(),
                    driver_name: "Somchai J.".to_string(),
                    vehicle_plate: "83-1234".to_string(),
                    carrier: "TBL-North".to_string(),
                    job: JobCategory::Light(LightJob::ReadyForWork),
                    trip_number: None,
                    time_slot: TimeSlot::Morning,
                    check_in: GeoPoint {
                        lat: 18.7613,
                        lng: 99.0605,
                    },
                },
                "2026-08-05",
                now(),
            )
            .unwrap();
        store
    }

    #[test]
    fn existing_registration_blocks_the_same_slot() {
        let store = seeded_store();
        let err = check_duplicate(&store, "U1", TimeSlot::Morning, &window()).unwrap_err();
        match err {
            AppError::DuplicateRegistration { queue_number, .. } => {
                assert_eq!(queue_number, "M001");
            }
            other => panic!("expected duplicate, got {other:?}"),
        }
    }

    #[test]
    fn other_slot_or_identity_passes() {
        let store = seeded_store();
        assert!(check_duplicate(&store, "U1", TimeSlot::Afternoon, &window()).is_ok());
        assert!(check_duplicate(&store, "U2", TimeSlot::Morning, &window()).is_ok());
    }
}
