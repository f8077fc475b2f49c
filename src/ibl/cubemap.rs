//! Cubemap face images on the CPU side
//!
//! Validation of the per-frame radiance batch, box-filtered mip chain
//! generation, and conversion to the half-float texel layout uploaded to
//! the GPU.

use half::f16;

use crate::error::{GeoArError, GeoArResult};
use crate::ibl::chunks::CUBE_FACE_COUNT;

const COPY_ALIGNMENT: usize = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT as usize;

/// One square HDR radiance face, RGBA32F row-major.
#[derive(Debug, Clone)]
pub struct CubemapFaceImage {
    resolution: u32,
    pixels: Vec<f32>,
}

impl CubemapFaceImage {
    pub fn new(resolution: u32, pixels: Vec<f32>) -> GeoArResult<Self> {
        let expected = (resolution * resolution * 4) as usize;
        if resolution == 0 || pixels.len() != expected {
            return Err(GeoArError::validation(format!(
                "face data length mismatch: expected {} ({res}x{res}x4), got {}",
                expected,
                pixels.len(),
                res = resolution
            )));
        }
        Ok(Self { resolution, pixels })
    }

    pub fn resolution(&self) -> u32 {
        self.resolution
    }

    pub fn pixels(&self) -> &[f32] {
        &self.pixels
    }
}

/// Per-frame source of raw radiance faces, implemented by the tracking
/// provider's light estimation. Returns None on frames where no new
/// cubemap is available.
pub trait CubemapFaceSource {
    fn acquire_faces(&mut self) -> Option<Vec<CubemapFaceImage>>;
}

/// Reject a malformed per-frame batch before touching any GPU state.
pub fn validate_face_batch(faces: &[CubemapFaceImage], resolution: u32) -> GeoArResult<()> {
    if faces.len() != CUBE_FACE_COUNT as usize {
        return Err(GeoArError::validation(format!(
            "expected {} cubemap faces, got {}",
            CUBE_FACE_COUNT,
            faces.len()
        )));
    }
    for (index, face) in faces.iter().enumerate() {
        if face.resolution != resolution {
            return Err(GeoArError::validation(format!(
                "face {} resolution {} does not match filter resolution {}",
                index, face.resolution, resolution
            )));
        }
    }
    Ok(())
}

/// Box-filtered mip chain for one face, level 0 being the source image.
/// Produces exactly `mip_levels` levels, halving each step down to 1x1.
pub fn build_face_mip_chain(face: &CubemapFaceImage, mip_levels: u32) -> Vec<Vec<f32>> {
    let mut levels = Vec::with_capacity(mip_levels as usize);
    let mut current = face.pixels.clone();
    let mut size = face.resolution;
    levels.push(current.clone());

    for _ in 1..mip_levels {
        let next_size = (size / 2).max(1);
        current = downsample_box(&current, size, next_size);
        levels.push(current.clone());
        size = next_size;
    }

    levels
}

/// Average the source box covering each destination texel.
fn downsample_box(src: &[f32], src_size: u32, dst_size: u32) -> Vec<f32> {
    let mut dst = vec![0.0f32; (dst_size * dst_size * 4) as usize];
    let ratio = src_size as f32 / dst_size as f32;

    for dst_y in 0..dst_size {
        for dst_x in 0..dst_size {
            let x_start = (dst_x as f32 * ratio) as u32;
            let y_start = (dst_y as f32 * ratio) as u32;
            let x_end = (((dst_x + 1) as f32 * ratio).ceil() as u32).min(src_size);
            let y_end = (((dst_y + 1) as f32 * ratio).ceil() as u32).min(src_size);

            let mut rgba = [0.0f32; 4];
            let mut count = 0u32;
            for src_y in y_start..y_end {
                for src_x in x_start..x_end {
                    let idx = ((src_y * src_size + src_x) * 4) as usize;
                    rgba[0] += src[idx];
                    rgba[1] += src[idx + 1];
                    rgba[2] += src[idx + 2];
                    rgba[3] += src[idx + 3];
                    count += 1;
                }
            }

            let inv = 1.0 / count.max(1) as f32;
            let out = ((dst_y * dst_size + dst_x) * 4) as usize;
            dst[out] = rgba[0] * inv;
            dst[out + 1] = rgba[1] * inv;
            dst[out + 2] = rgba[2] * inv;
            dst[out + 3] = rgba[3] * inv;
        }
    }

    dst
}

/// Convert RGBA32F pixels to the Rgba16Float upload layout.
pub fn half_texels(rgba: &[f32]) -> Vec<u8> {
    let mut texels = Vec::with_capacity(rgba.len());
    for &value in rgba {
        texels.push(f16::from_f32(value).to_bits());
    }
    bytemuck::cast_slice(&texels).to_vec()
}

fn align_to(value: usize, alignment: usize) -> usize {
    ((value + alignment - 1) / alignment) * alignment
}

/// Pad rows out to the copy alignment required by texture uploads.
pub fn pad_image_rows(
    data: &[u8],
    width: u32,
    height: u32,
    bytes_per_pixel: usize,
) -> (Vec<u8>, u32) {
    let tight_bpr = bytes_per_pixel * width as usize;
    let padded_bpr = align_to(tight_bpr, COPY_ALIGNMENT);
    if padded_bpr == tight_bpr {
        return (data.to_vec(), tight_bpr as u32);
    }

    let mut padded = vec![0u8; padded_bpr * height as usize];
    for row in 0..height as usize {
        let src = row * tight_bpr;
        let dst = row * padded_bpr;
        padded[dst..dst + tight_bpr].copy_from_slice(&data[src..src + tight_bpr]);
    }

    (padded, padded_bpr as u32)
}
