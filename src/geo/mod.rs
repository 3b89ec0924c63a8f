use serde::{Deserialize, Serialize};

const EARTH_RADIUS_M: f64 = 6_371_000.0;

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

/// A device GPS reading as reported by the client.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct LocationFix {
    pub lat: f64,
    pub lng: f64,
    pub accuracy_m: f64,
}

pub fn haversine_m(a: &GeoPoint, b: &GeoPoint) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let delta_lat = (b.lat - a.lat).to_radians();
    let delta_lng = (b.lng - a.lng).to_radians();

    let sin_lat = (delta_lat / 2.0).sin();
    let sin_lng = (delta_lng / 2.0).sin();

    let haversine = sin_lat * sin_lat + lat1.cos() * lat2.cos() * sin_lng * sin_lng;
    let central_angle = 2.0 * haversine.sqrt().asin();

    EARTH_RADIUS_M * central_angle
}

/// Axis-aligned registration boundary around the warehouse, plus the accuracy
/// cutoff above which a fix is not trusted at all.
#[derive(Debug, Clone)]
pub struct Geofence {
    south_west: GeoPoint,
    north_east: GeoPoint,
    accuracy_threshold_m: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct GeofenceCheck {
    pub within_area: bool,
    pub distance_m: f64,
    pub message: String,
}

impl Geofence {
    pub fn new(south_west: GeoPoint, north_east: GeoPoint, accuracy_threshold_m: f64) -> Self {
        Self {
            south_west,
            north_east,
            accuracy_threshold_m,
        }
    }

    pub fn center(&self) -> GeoPoint {
        GeoPoint {
            lat: (self.south_west.lat + self.north_east.lat) / 2.0,
            lng: (self.south_west.lng + self.north_east.lng) / 2.0,
        }
    }

    /// Latitude and longitude bounded independently; boundary inclusive.
    pub fn contains(&self, point: &GeoPoint) -> bool {
        point.lat >= self.south_west.lat
            && point.lat <= self.north_east.lat
            && point.lng >= self.south_west.lng
            && point.lng <= self.north_east.lng
    }

    /// Imprecise fixes fail closed regardless of position. The distance from
    /// the boundary center is informational only and never decides membership.
    pub fn evaluate(&self, fix: &LocationFix) -> GeofenceCheck {
        let point = GeoPoint {
            lat: fix.lat,
            lng: fix.lng,
        };
        let distance_m = round1(haversine_m(&point, &self.center()));

        if fix.accuracy_m > self.accuracy_threshold_m {
            return GeofenceCheck {
                within_area: false,
                distance_m,
                message: format!(
                    "gps fix too imprecise (±{:.0} m); move to open sky and try again",
                    fix.accuracy_m
                ),
            };
        }

        let within_area = self.contains(&point);
        let message = if within_area {
            format!("inside the warehouse area ({distance_m} m from center)")
        } else {
            format!(
                "outside the warehouse area ({distance_m} m from center); enter the warehouse before registering"
            )
        };

        GeofenceCheck {
            within_area,
            distance_m,
            message,
        }
    }
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::{haversine_m, GeoPoint, Geofence, LocationFix};

    fn warehouse() -> Geofence {
        Geofence::new(
            GeoPoint {
                lat: 18.7605,
                lng: 99.0594,
            },
            GeoPoint {
                lat: 18.7623,
                lng: 99.0616,
            },
            50.0,
        )
    }

    fn fix(lat: f64, lng: f64, accuracy_m: f64) -> LocationFix {
        LocationFix {
            lat,
            lng,
            accuracy_m,
        }
    }

    #[test]
    fn zero_distance_for_same_point() {
        let p = GeoPoint {
            lat: 18.7614,
            lng: 99.0605,
        };
        let distance = haversine_m(&p, &p);
        assert!(distance < 1e-6);
    }

    #[test]
    fn london_to_paris_is_around_343_km() {
        let london = GeoPoint {
            lat: 51.5074,
            lng: -0.1278,
        };
        let paris = GeoPoint {
            lat: 48.8566,
            lng: 2.3522,
        };
        let distance = haversine_m(&london, &paris);
        assert!((distance - 343_000.0).abs() < 5_000.0);
    }

    #[test]
    fn accurate_fix_inside_rectangle_is_within() {
        let check = warehouse().evaluate(&fix(18.7614, 99.0605, 10.0));
        assert!(check.within_area);
    }

    #[test]
    fn fix_outside_rectangle_is_rejected_regardless_of_accuracy() {
        let check = warehouse().evaluate(&fix(18.7700, 99.0605, 5.0));
        assert!(!check.within_area);
        assert!(check.distance_m > 0.0);
    }

    #[test]
    fn one_axis_out_of_bounds_is_outside() {
        let geofence = warehouse();
        assert!(!geofence.evaluate(&fix(18.7614, 99.0700, 5.0)).within_area);
        assert!(!geofence.evaluate(&fix(18.7500, 99.0605, 5.0)).within_area);
    }

    #[test]
    fn imprecise_fix_fails_closed_even_inside() {
        let check = warehouse().evaluate(&fix(18.7614, 99.0605, 80.0));
        assert!(!check.within_area);
        assert!(check.message.contains("imprecise"));
    }

    #[test]
    fn accuracy_exactly_at_threshold_is_trusted() {
        let check = warehouse().evaluate(&fix(18.7614, 99.0605, 50.0));
        assert!(check.within_area);
    }

    #[test]
    fn boundary_corner_counts_as_inside() {
        let check = warehouse().evaluate(&fix(18.7605, 99.0594, 10.0));
        assert!(check.within_area);
    }

    #[test]
    fn distance_is_measured_from_rectangle_center() {
        let geofence = warehouse();
        let center = geofence.center();
        let check = geofence.evaluate(&fix(center.lat, center.lng, 10.0));
        assert!(check.within_area);
        assert!(check.distance_m < 1.0);
    }
}
