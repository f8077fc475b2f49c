// src/geopose/state.rs
// Localization confidence state machine as a pure transition function
// RELEVANT FILES: src/geopose/tracker.rs, src/geopose/sample.rs

use std::time::Instant;

use super::sample::{GeospatialPoseSample, TrackingThresholds};

/// Session-scoped confidence in the device's global pose.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocalizationState {
    /// No sample processed yet
    Uninitialized,
    /// Geospatial positioning unavailable on this session or device
    Unsupported,
    /// The earth-tracking subsystem reported a failure
    EarthStateError,
    /// Motion tracking has no valid pose
    PreTracking,
    /// Tracking is valid, accuracy not yet sufficient
    Localizing,
    /// Accuracy thresholds were not reached within the timeout
    LocalizingFailed,
    /// Global pose is accurate enough for anchor placement
    Localized,
}

impl LocalizationState {
    /// Terminal states stay put until an explicit reset.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            LocalizationState::Unsupported
                | LocalizationState::EarthStateError
                | LocalizationState::LocalizingFailed
        )
    }
}

/// Side effects requested by a transition, applied by the tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionEffect {
    /// Record the current instant as the start of the localizing window
    RecordLocalizingStart,
    /// The pose qualifies for anchor placement this frame
    RequestAnchorPlacement,
}

/// Advance the state machine by one pose sample.
///
/// Pure: all inputs are explicit, including the timeout clock, so the
/// machine is testable without a live session. `localizing_started` is the
/// instant recorded by the last `RecordLocalizingStart` effect.
pub fn transition(
    state: LocalizationState,
    sample: &GeospatialPoseSample,
    thresholds: &TrackingThresholds,
    localizing_started: Option<Instant>,
    now: Instant,
) -> (LocalizationState, Vec<TransitionEffect>) {
    use LocalizationState::*;

    if state.is_terminal() {
        return (state, Vec::new());
    }
    if !sample.earth_state_valid {
        return (EarthStateError, Vec::new());
    }
    if !sample.tracking_valid {
        return (PreTracking, Vec::new());
    }

    match state {
        Uninitialized | PreTracking => (Localizing, vec![TransitionEffect::RecordLocalizingStart]),
        Localizing => {
            if sample.horizontal_accuracy_m <= thresholds.horizontal_entry_m
                && sample.yaw_accuracy_deg <= thresholds.yaw_entry_deg
            {
                (Localized, vec![TransitionEffect::RequestAnchorPlacement])
            } else if elapsed_since(localizing_started, now) > thresholds.localizing_timeout {
                (LocalizingFailed, Vec::new())
            } else {
                (Localizing, Vec::new())
            }
        }
        Localized => {
            if sample.horizontal_accuracy_m > thresholds.horizontal_exit_m()
                || sample.yaw_accuracy_deg > thresholds.yaw_exit_deg()
            {
                (Localizing, vec![TransitionEffect::RecordLocalizingStart])
            } else {
                // Still qualified; the tracker retries placement here if an
                // earlier attempt found no plane or failed to resolve.
                (Localized, vec![TransitionEffect::RequestAnchorPlacement])
            }
        }
        Unsupported | EarthStateError | LocalizingFailed => unreachable!(),
    }
}

fn elapsed_since(started: Option<Instant>, now: Instant) -> std::time::Duration {
    started.map_or(std::time::Duration::ZERO, |t| {
        now.saturating_duration_since(t)
    })
}
