//! Position fix value type.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single resolved geographic position with accuracy and time metadata.
///
/// A `Fix` is produced only by an acquisition task and is immutable from
/// then on: the owning workflow holds it until it is saved into a waypoint
/// record or discarded by a re-run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fix {
    /// Latitude in decimal degrees, positive north
    pub latitude: f64,
    /// Longitude in decimal degrees, positive east
    pub longitude: f64,
    /// Estimated horizontal accuracy radius in meters
    pub accuracy_m: f32,
    /// When the fix was resolved
    pub timestamp: DateTime<Utc>,
    /// Altitude above sea level in meters, when the provider reports one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub altitude_m: Option<f64>,
    /// Direction of travel in degrees from true north
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bearing_deg: Option<f32>,
    /// Ground speed in meters per second
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speed_mps: Option<f32>,
    /// Name of the provider that produced the fix (e.g. "gps")
    pub provider: String,
}

impl Fix {
    /// Create a fix resolved now, without the optional fields.
    pub fn new(latitude: f64, longitude: f64, accuracy_m: f32, provider: impl Into<String>) -> Self {
        Self {
            latitude,
            longitude,
            accuracy_m,
            timestamp: Utc::now(),
            altitude_m: None,
            bearing_deg: None,
            speed_mps: None,
            provider: provider.into(),
        }
    }

    /// Set the altitude in meters.
    pub fn with_altitude(mut self, altitude_m: f64) -> Self {
        self.altitude_m = Some(altitude_m);
        self
    }

    /// Set the bearing in degrees from true north.
    pub fn with_bearing(mut self, bearing_deg: f32) -> Self {
        self.bearing_deg = Some(bearing_deg);
        self
    }

    /// Set the ground speed in meters per second.
    pub fn with_speed(mut self, speed_mps: f32) -> Self {
        self.speed_mps = Some(speed_mps);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn optional_fields_are_omitted_from_json() {
        let fix = Fix::new(52.1, 21.0, 4.0, "gps");
        let json = serde_json::to_value(&fix).unwrap();
        assert!(json.get("altitude_m").is_none());
        assert!(json.get("bearing_deg").is_none());
        assert_eq!(json["provider"], "gps");
    }

    #[test]
    fn round_trips_through_json() {
        let fix = Fix::new(52.1, 21.0, 4.0, "gps")
            .with_altitude(110.0)
            .with_speed(1.5);
        let json = serde_json::to_string(&fix).unwrap();
        let back: Fix = serde_json::from_str(&json).unwrap();
        assert_eq!(back, fix);
    }
}
