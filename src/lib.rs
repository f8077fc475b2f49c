//! Geospatial AR anchoring and specular image-based lighting core.
//!
//! Two subsystems share this crate: a localization state machine that
//! decides when the device's global pose is trustworthy enough to commit a
//! world anchor, and a GPU cubemap filter that pre-convolves per-frame
//! environment radiance for physically-based specular shading. They meet
//! only at the host's final draw call.

pub mod device_caps;
pub mod error;
pub mod geopose;
pub mod gpu;
pub mod ibl;

pub use device_caps::DeviceCaps;
pub use error::{GeoArError, GeoArResult};
pub use geopose::{
    AnchorPose, AnchorRequest, GeospatialAnchorProvider, GeospatialPoseSample, GeospatialTracker,
    LocalizationState, PlanePose, TrackingThresholds,
};
pub use ibl::{
    CubemapFaceImage, CubemapFaceSource, FaceChunk, SpecularCubemapFilter, SpecularFilterConfig,
    CUBE_FACE_COUNT,
};
