//! Per-frame geospatial pose estimate delivered by the tracking provider.

use glam::DQuat;
use std::time::Duration;

/// One frame's global pose estimate with accuracy figures.
///
/// Produced once per rendered frame; immutable; not persisted.
#[derive(Debug, Clone, Copy)]
pub struct GeospatialPoseSample {
    /// Latitude in degrees (WGS84)
    pub latitude: f64,

    /// Longitude in degrees (WGS84)
    pub longitude: f64,

    /// Altitude in meters above the WGS84 ellipsoid
    pub altitude: f64,

    /// Device orientation in the east-up-south frame
    pub orientation: DQuat,

    /// Estimated horizontal position error in meters
    pub horizontal_accuracy_m: f64,

    /// Estimated heading error in degrees
    pub yaw_accuracy_deg: f64,

    /// Whether the motion tracking subsystem currently has a valid pose
    pub tracking_valid: bool,

    /// Whether the earth-tracking subsystem itself is healthy
    pub earth_state_valid: bool,
}

impl GeospatialPoseSample {
    /// A sample with valid tracking and the given accuracy figures.
    /// Position fields default to the origin; tests and callers overwrite
    /// what they need.
    pub fn with_accuracy(horizontal_accuracy_m: f64, yaw_accuracy_deg: f64) -> Self {
        Self {
            latitude: 0.0,
            longitude: 0.0,
            altitude: 0.0,
            orientation: DQuat::IDENTITY,
            horizontal_accuracy_m,
            yaw_accuracy_deg,
            tracking_valid: true,
            earth_state_valid: true,
        }
    }
}

/// Accuracy thresholds and timing for the localization state machine.
#[derive(Debug, Clone, serde::Deserialize)]
#[serde(default)]
pub struct TrackingThresholds {
    /// Horizontal accuracy required to enter the localized state, meters
    pub horizontal_entry_m: f64,

    /// Yaw accuracy required to enter the localized state, degrees
    pub yaw_entry_deg: f64,

    /// Extra horizontal slack tolerated before leaving the localized state
    pub horizontal_hysteresis_m: f64,

    /// Extra yaw slack tolerated before leaving the localized state
    pub yaw_hysteresis_deg: f64,

    /// Time allowed in the localizing state before giving up
    pub localizing_timeout: Duration,
}

impl Default for TrackingThresholds {
    fn default() -> Self {
        Self {
            horizontal_entry_m: 10.0,
            yaw_entry_deg: 15.0,
            horizontal_hysteresis_m: 10.0,
            yaw_hysteresis_deg: 10.0,
            localizing_timeout: Duration::from_secs(180),
        }
    }
}

impl TrackingThresholds {
    /// Horizontal accuracy beyond which a localized session degrades.
    pub fn horizontal_exit_m(&self) -> f64 {
        self.horizontal_entry_m + self.horizontal_hysteresis_m
    }

    /// Yaw accuracy beyond which a localized session degrades.
    pub fn yaw_exit_deg(&self) -> f64 {
        self.yaw_entry_deg + self.yaw_hysteresis_deg
    }
}
