//! Seam to the external pose/tracking engine.
//!
//! The tracker only needs two capabilities from the AR session: finding a
//! horizontal plane near the device, and resolving a geodetic anchor
//! asynchronously. Both are behind a trait so the state machine can be
//! exercised against mocks.

use glam::{DQuat, DVec3};

use crate::error::GeoArError;

/// World pose of a resolved anchor, owned by the provider once created.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnchorPose {
    pub position: DVec3,
    pub orientation: DQuat,
}

/// A detected horizontal plane near the device.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlanePose {
    /// Plane center in world space; its height anchors the virtual object
    pub center: DVec3,
    pub orientation: DQuat,
}

/// Geodetic anchor resolution request, combining the qualifying pose
/// sample's latitude/longitude/orientation with the detected plane's height.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnchorRequest {
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: f64,
    pub orientation: DQuat,
}

/// Delivered on an unspecified thread when resolution completes.
pub type ResolutionCallback = Box<dyn FnOnce(Result<AnchorPose, GeoArError>) + Send + 'static>;

/// Capabilities the tracker consumes from the AR session.
pub trait GeospatialAnchorProvider {
    /// Look for a detected horizontal plane near the device's current pose.
    /// Returns None when plane detection has not converged yet.
    fn detect_plane_near(
        &mut self,
        sample: &crate::geopose::GeospatialPoseSample,
    ) -> Option<PlanePose>;

    /// Resolve a combined plane/geodetic anchor. The callback fires exactly
    /// once, possibly on another thread, with the resolved world pose or an
    /// error.
    fn resolve_geodetic_anchor(&mut self, request: AnchorRequest, on_resolved: ResolutionCallback);
}
