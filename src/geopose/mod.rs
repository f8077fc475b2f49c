//! Geospatial localization and anchor placement
//!
//! Tracks confidence in the device's global pose over time, decides when a
//! placement anchor may be committed, detects timeout, and applies
//! hysteresis so the session does not flap between localizing and localized.

pub mod provider;
pub mod sample;
pub mod state;
pub mod tracker;

pub use provider::{
    AnchorPose, AnchorRequest, GeospatialAnchorProvider, PlanePose, ResolutionCallback,
};
pub use sample::{GeospatialPoseSample, TrackingThresholds};
pub use state::{transition, LocalizationState, TransitionEffect};
pub use tracker::{GeospatialTracker, PlacementSlot};
