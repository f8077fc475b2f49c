//! Discrete GGX importance sampling for cubemap pre-filtering.
//!
//! Each roughness level of the filtered environment map is a weighted sum
//! over a fixed set of tangent-space sample directions. The sets are small
//! (tens of samples), generated once per filter instance, and shared by
//! every texel of the level, so they are computed here on the CPU and handed
//! to the fragment shader as a cache.

use std::f32::consts::PI;

use glam::{vec2, vec3, Vec2, Vec3};

/// One cached sample: a tangent-space light direction, its normalized
/// weight, and the fractional source mip level to fetch.
#[derive(Debug, Clone, Copy)]
pub struct ImportanceSample {
    pub direction: Vec3,
    pub contribution: f32,
    pub level: f32,
}

/// The sample set for one roughness level of the output chain.
#[derive(Debug, Clone)]
pub struct SampleCache {
    pub perceptual_roughness: f32,
    pub roughness: f32,
    pub entries: Vec<ImportanceSample>,
}

/// Mip chain length for a square cubemap face edge.
pub fn mip_level_count(resolution: u32) -> u32 {
    resolution.ilog2() + 1
}

/// Hammersley low-discrepancy point: uniform stratum paired with the
/// bit-reversal radical inverse.
pub fn hammersley(index: u32, count: u32) -> Vec2 {
    vec2(index as f32 / count as f32, radical_inverse_vdc(index))
}

fn radical_inverse_vdc(mut bits: u32) -> f32 {
    bits = bits.rotate_right(16);
    bits = ((bits & 0x5555_5555) << 1) | ((bits & 0xAAAA_AAAA) >> 1);
    bits = ((bits & 0x3333_3333) << 2) | ((bits & 0xCCCC_CCCC) >> 2);
    bits = ((bits & 0x0F0F_0F0F) << 4) | ((bits & 0xF0F0_F0F0) >> 4);
    bits = ((bits & 0x00FF_00FF) << 8) | ((bits & 0xFF00_FF00) >> 8);
    bits as f32 * 2.328_306_4e-10
}

/// GGX-distributed half vector in tangent space (normal = +Z).
fn ggx_half_vector(xi: Vec2, roughness: f32) -> Vec3 {
    let a = roughness;
    let phi = 2.0 * PI * xi.x;
    let cos_theta = ((1.0 - xi.y) / (1.0 + (a * a - 1.0) * xi.y)).sqrt();
    let sin_theta = (1.0 - cos_theta * cos_theta).max(0.0).sqrt();
    vec3(phi.cos() * sin_theta, phi.sin() * sin_theta, cos_theta)
}

/// GGX normal distribution function.
fn ggx_distribution(no_h: f32, roughness: f32) -> f32 {
    let a2 = roughness * roughness;
    let d = no_h * no_h * (a2 - 1.0) + 1.0;
    a2 / (PI * d * d)
}

fn log4(x: f32) -> f32 {
    x.log2() * 0.5
}

/// Generate the sample cache for one output roughness level.
///
/// `level` ranges over `1..mip_levels`; level 0 of the output is the mirror
/// reflection and uses no importance sampling. Samples whose reflected
/// direction falls below the horizon (`NoL <= 0`) are rejected, so the cache
/// may hold fewer than `sample_count` entries. Contributions are normalized
/// to sum to one; a degenerate all-rejected level is left unnormalized.
pub fn generate_level_cache(
    level: u32,
    resolution: u32,
    mip_levels: u32,
    sample_count: u32,
) -> SampleCache {
    let perceptual_roughness = level as f32 / (mip_levels - 1) as f32;
    let roughness = perceptual_roughness * perceptual_roughness;

    // Solid angle of one source texel at this level's matching input mip,
    // in base-4 log so it composes with mip-level arithmetic.
    let source_resolution = (resolution >> level).max(1);
    let log4_omega_p = log4(4.0 * PI / (6.0 * (source_resolution * source_resolution) as f32));

    let mut entries = Vec::with_capacity(sample_count as usize);
    let mut weight_sum = 0.0f32;

    for index in 0..sample_count {
        let xi = hammersley(index, sample_count);
        let h = ggx_half_vector(xi, roughness);
        let no_h = h.z;
        let no_l = 2.0 * no_h * no_h - 1.0;
        if no_l <= 0.0 {
            continue;
        }

        // L = 2(N.H)H - N with N = +Z in tangent space.
        let direction = vec3(2.0 * no_h * h.x, 2.0 * no_h * h.y, no_l);

        let pdf = ggx_distribution(no_h, roughness) / 4.0;
        let omega_s = 1.0 / (sample_count as f32 * pdf);
        let source_level =
            (1.0 + log4(omega_s) - log4_omega_p).clamp(0.0, (mip_levels - 1) as f32);

        entries.push(ImportanceSample {
            direction,
            contribution: no_l,
            level: source_level,
        });
        weight_sum += no_l;
    }

    if weight_sum > 0.0 {
        for entry in &mut entries {
            entry.contribution /= weight_sum;
        }
    }

    SampleCache {
        perceptual_roughness,
        roughness,
        entries,
    }
}

/// Caches for every filtered level `1..mip_levels`, in level order.
pub fn generate_caches(resolution: u32, sample_count: u32) -> Vec<SampleCache> {
    let mip_levels = mip_level_count(resolution);
    (1..mip_levels)
        .map(|level| generate_level_cache(level, resolution, mip_levels, sample_count))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mip_level_count() {
        assert_eq!(mip_level_count(2), 2);
        assert_eq!(mip_level_count(16), 5);
        assert_eq!(mip_level_count(128), 8);
        assert_eq!(mip_level_count(256), 9);
    }

    #[test]
    fn test_radical_inverse_first_values() {
        assert!((radical_inverse_vdc(0) - 0.0).abs() < 1e-7);
        assert!((radical_inverse_vdc(1) - 0.5).abs() < 1e-7);
        assert!((radical_inverse_vdc(2) - 0.25).abs() < 1e-7);
        assert!((radical_inverse_vdc(3) - 0.75).abs() < 1e-7);
    }

    #[test]
    fn test_hammersley_in_unit_square() {
        for i in 0..64 {
            let p = hammersley(i, 64);
            assert!((0.0..1.0).contains(&p.x));
            assert!((0.0..1.0).contains(&p.y));
        }
    }

    #[test]
    fn test_half_vectors_are_unit_upper_hemisphere() {
        for i in 0..32 {
            let h = ggx_half_vector(hammersley(i, 32), 0.25);
            assert!((h.length() - 1.0).abs() < 1e-5);
            assert!(h.z >= 0.0);
        }
    }

    #[test]
    fn test_cache_directions_are_unit() {
        for cache in generate_caches(16, 32) {
            for entry in &cache.entries {
                assert!((entry.direction.length() - 1.0).abs() < 1e-4);
                assert!(entry.direction.z > 0.0);
            }
        }
    }

    #[test]
    fn test_contributions_normalized() {
        for cache in generate_caches(64, 64) {
            let sum: f32 = cache.entries.iter().map(|e| e.contribution).sum();
            assert!(
                (sum - 1.0).abs() < 1e-5,
                "level with roughness {} sums to {}",
                cache.roughness,
                sum
            );
        }
    }

    #[test]
    fn test_top_level_roughness_is_one() {
        let caches = generate_caches(16, 32);
        let top = caches.last().unwrap();
        assert!((top.perceptual_roughness - 1.0).abs() < 1e-6);
        assert!((top.roughness - 1.0).abs() < 1e-6);
    }
}
