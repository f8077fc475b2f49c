//! Specular image-based lighting
//!
//! Turns the per-frame radiance cubemap delivered by the tracking provider's
//! light estimation into a filtered, roughness-indexed mipmap chain for
//! physically-based shading.

pub mod chunks;
pub mod cubemap;
pub mod filter;
pub mod sampling;

pub use chunks::{partition_faces, FaceChunk, CUBE_FACE_COUNT};
pub use cubemap::{CubemapFaceImage, CubemapFaceSource};
pub use filter::{SpecularCubemapFilter, SpecularFilterConfig};
pub use sampling::{generate_caches, mip_level_count, ImportanceSample, SampleCache};
