// tests/test_cubemap_filter_gpu.rs
// GPU integration tests for the specular cubemap filter. Skipped (pass
// trivially) on machines without a usable adapter.

use half::f16;

use geoar::{gpu, CubemapFaceImage, DeviceCaps, SpecularCubemapFilter, SpecularFilterConfig};

const RESOLUTION: u32 = 16;

/// Per-face constant radiance, distinct per face so mixing is observable.
fn face_constants() -> [f32; 6] {
    [1.0, 0.8, 0.6, 0.4, 0.2, 0.1]
}

fn test_faces() -> Vec<CubemapFaceImage> {
    face_constants()
        .iter()
        .map(|&value| {
            let mut pixels = Vec::with_capacity((RESOLUTION * RESOLUTION * 4) as usize);
            for _ in 0..RESOLUTION * RESOLUTION {
                pixels.extend_from_slice(&[value, value * 0.5, value * 0.25, 1.0]);
            }
            CubemapFaceImage::new(RESOLUTION, pixels).unwrap()
        })
        .collect()
}

fn read_face_level0(g: &gpu::GpuContext, filter: &SpecularCubemapFilter, face: u32) -> Vec<f32> {
    let bytes_per_row = gpu::align_copy_bpr(RESOLUTION * 8);
    let buffer = g.device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("test.readback"),
        size: (bytes_per_row * RESOLUTION) as u64,
        usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });

    let mut encoder = g
        .device
        .create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("test.readback.encoder"),
        });
    encoder.copy_texture_to_buffer(
        wgpu::ImageCopyTexture {
            texture: filter.output_texture(),
            mip_level: 0,
            origin: wgpu::Origin3d { x: 0, y: 0, z: face },
            aspect: wgpu::TextureAspect::All,
        },
        wgpu::ImageCopyBuffer {
            buffer: &buffer,
            layout: wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(bytes_per_row),
                rows_per_image: Some(RESOLUTION),
            },
        },
        wgpu::Extent3d {
            width: RESOLUTION,
            height: RESOLUTION,
            depth_or_array_layers: 1,
        },
    );
    g.queue.submit(Some(encoder.finish()));

    buffer.slice(..).map_async(wgpu::MapMode::Read, |_| ());
    g.device.poll(wgpu::Maintain::Wait);

    let data = buffer.slice(..).get_mapped_range();
    let mut texels = Vec::with_capacity((RESOLUTION * RESOLUTION * 4) as usize);
    for row in 0..RESOLUTION {
        let offset = (row * bytes_per_row) as usize;
        let row_bytes = &data[offset..offset + (RESOLUTION * 8) as usize];
        for half_bits in row_bytes.chunks_exact(2) {
            let bits = u16::from_le_bytes([half_bits[0], half_bits[1]]);
            texels.push(f16::from_bits(bits).to_f32());
        }
    }
    drop(data);
    buffer.unmap();
    texels
}

#[test]
fn test_filter_construction() {
    let Some(g) = gpu::try_ctx() else {
        eprintln!("skipping: no GPU adapter available");
        return;
    };
    let caps = DeviceCaps::from_context(g);
    let filter =
        SpecularCubemapFilter::new(&g.device, &caps, SpecularFilterConfig::default()).unwrap();

    assert_eq!(filter.mip_level_count(), 5);
    assert_eq!(filter.caches().len(), 4);
    assert!(!filter.chunks().is_empty());

    let pass_count: usize = filter.chunks().len() * filter.mip_level_count() as usize;
    assert!(pass_count >= 5);
}

#[test]
fn test_invalid_config_rejected() {
    let Some(g) = gpu::try_ctx() else {
        eprintln!("skipping: no GPU adapter available");
        return;
    };
    let caps = DeviceCaps::from_context(g);

    let odd = SpecularFilterConfig {
        resolution: 17,
        sample_count: 32,
    };
    assert!(SpecularCubemapFilter::new(&g.device, &caps, odd).is_err());

    let no_samples = SpecularFilterConfig {
        resolution: 16,
        sample_count: 0,
    };
    assert!(SpecularCubemapFilter::new(&g.device, &caps, no_samples).is_err());
}

#[test]
fn test_update_filters_and_mirror_level_passes_through() {
    let Some(g) = gpu::try_ctx() else {
        eprintln!("skipping: no GPU adapter available");
        return;
    };
    let caps = DeviceCaps::from_context(g);
    let mut filter =
        SpecularCubemapFilter::new(&g.device, &caps, SpecularFilterConfig::default()).unwrap();

    let faces = test_faces();
    filter.update(&g.device, &g.queue, &faces).unwrap();

    // Level 0 mirrors the unfiltered input: interior texels of face 0 hold
    // its constant color exactly.
    let texels = read_face_level0(g, &filter, 0);
    let center = ((RESOLUTION / 2) * RESOLUTION + RESOLUTION / 2) as usize * 4;
    assert!((texels[center] - 1.0).abs() < 2e-2, "r={}", texels[center]);
    assert!(
        (texels[center + 1] - 0.5).abs() < 2e-2,
        "g={}",
        texels[center + 1]
    );

    // A second frame reuses every GPU resource.
    filter.update(&g.device, &g.queue, &faces).unwrap();
    g.device.poll(wgpu::Maintain::Wait);
}

#[test]
fn test_malformed_batch_rejected_and_output_untouched() {
    let Some(g) = gpu::try_ctx() else {
        eprintln!("skipping: no GPU adapter available");
        return;
    };
    let caps = DeviceCaps::from_context(g);
    let mut filter =
        SpecularCubemapFilter::new(&g.device, &caps, SpecularFilterConfig::default()).unwrap();

    let faces = test_faces();
    filter.update(&g.device, &g.queue, &faces).unwrap();
    let before = read_face_level0(g, &filter, 0);

    // Five faces instead of six: hard validation error.
    assert!(filter.update(&g.device, &g.queue, &faces[..5]).is_err());

    // Wrong resolution: also rejected.
    let small: Vec<_> = (0..6)
        .map(|_| CubemapFaceImage::new(8, vec![0.0; 8 * 8 * 4]).unwrap())
        .collect();
    assert!(filter.update(&g.device, &g.queue, &small).is_err());

    let after = read_face_level0(g, &filter, 0);
    assert_eq!(before, after);
}
