// tests/test_specular_cache.rs
// Invariants of the GGX importance-sample caches and face chunk partition

use geoar::ibl::{generate_caches, mip_level_count, partition_faces, CUBE_FACE_COUNT};

// ============================================================================
// Cache invariants
// ============================================================================

#[test]
fn test_reference_configuration_cache_shape() {
    // 16x16 faces, 32 samples: 5 mip levels, caches for levels 1..=4.
    assert_eq!(mip_level_count(16), 5);
    let caches = generate_caches(16, 32);
    assert_eq!(caches.len(), 4);

    for (i, cache) in caches.iter().enumerate() {
        let expected = (i as f32 + 1.0) / 4.0;
        assert!(
            (cache.perceptual_roughness - expected).abs() < 1e-6,
            "level {} roughness {}",
            i + 1,
            cache.perceptual_roughness
        );
    }
    assert!((caches[3].roughness - 1.0).abs() < 1e-6);
}

#[test]
fn test_contributions_non_negative_and_normalized() {
    for (resolution, samples) in [(16u32, 32u32), (32, 64), (64, 128)] {
        for cache in generate_caches(resolution, samples) {
            let mut sum = 0.0f32;
            for entry in &cache.entries {
                assert!(entry.contribution >= 0.0);
                sum += entry.contribution;
            }
            assert!(
                (sum - 1.0).abs() < 1e-5,
                "res {} samples {} roughness {}: sum {}",
                resolution,
                samples,
                cache.roughness,
                sum
            );
        }
    }
}

#[test]
fn test_source_levels_within_chain() {
    let mip_levels = mip_level_count(64) as f32;
    for cache in generate_caches(64, 64) {
        for entry in &cache.entries {
            assert!(entry.level >= 0.0);
            assert!(entry.level <= mip_levels - 1.0);
        }
    }
}

#[test]
fn test_horizon_rejection_bounds_cache_size() {
    let caches = generate_caches(16, 32);
    for cache in &caches {
        assert!(!cache.entries.is_empty());
        assert!(cache.entries.len() <= 32);
        for entry in &cache.entries {
            // Rejected samples never make it into the cache.
            assert!(entry.direction.z > 0.0);
        }
    }
    // At full roughness half the hemisphere reflects below the horizon, so
    // rejection must actually shrink the top cache.
    assert!(caches[3].entries.len() < 32);
}

// ============================================================================
// Face chunk partition
// ============================================================================

#[test]
fn test_chunks_cover_faces_exactly_once() {
    for max_attachments in 1..=12u32 {
        let chunks = partition_faces(max_attachments);
        let mut covered = Vec::new();
        for chunk in &chunks {
            assert!(chunk.size <= max_attachments.min(CUBE_FACE_COUNT));
            for face in chunk.first_face..chunk.first_face + chunk.size {
                covered.push(face);
            }
        }
        assert_eq!(covered, (0..CUBE_FACE_COUNT).collect::<Vec<_>>());
    }
}

#[test]
fn test_chunk_counts_for_common_limits() {
    assert_eq!(partition_faces(4).len(), 2);
    assert_eq!(partition_faces(8).len(), 1);
    assert_eq!(partition_faces(1).len(), 6);
}
