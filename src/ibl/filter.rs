// src/ibl/filter.rs
// GPU specular cubemap pre-filter for image-based lighting
// Converts the per-frame radiance cubemap into a roughness-indexed mipmap
// chain by summing cached GGX importance samples per texel
// RELEVANT FILES: src/ibl/sampling.rs, src/ibl/chunks.rs, src/ibl/cubemap.rs,
// src/shaders/cubemap_prefilter.wgsl

use bytemuck::{Pod, Zeroable};
use log::{info, warn};
use wgpu::util::DeviceExt;

use crate::device_caps::DeviceCaps;
use crate::error::{GeoArError, GeoArResult};
use crate::ibl::chunks::{partition_faces, FaceChunk, CUBE_FACE_COUNT};
use crate::ibl::cubemap::{
    build_face_mip_chain, half_texels, pad_image_rows, validate_face_batch, CubemapFaceImage,
    CubemapFaceSource,
};
use crate::ibl::sampling::{generate_caches, mip_level_count, SampleCache};

const OUTPUT_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba16Float;

/// Filter dimensions, loadable from host application settings.
#[derive(Debug, Clone, Copy, serde::Deserialize)]
#[serde(default)]
pub struct SpecularFilterConfig {
    /// Cube face edge length of both the input and output cubemaps
    pub resolution: u32,

    /// Importance samples drawn per roughness level before rejection
    pub sample_count: u32,
}

impl Default for SpecularFilterConfig {
    fn default() -> Self {
        Self {
            resolution: 16,
            sample_count: 32,
        }
    }
}

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
struct CacheEntryGpu {
    direction_contribution: [f32; 4],
    source_level: [f32; 4],
}

/// One render pass: a shader variant and the face views it writes.
struct PassVariant {
    level: u32,
    chunk: FaceChunk,
    pipeline: wgpu::RenderPipeline,
    targets: Vec<wgpu::TextureView>,
}

/// Pre-convolves a raw radiance cubemap into a filtered chain where mip
/// level maps to surface roughness. Construction builds the sample caches
/// and one pipeline per (mip level, face chunk); `update` runs every frame
/// with the freshly acquired faces.
pub struct SpecularCubemapFilter {
    config: SpecularFilterConfig,
    mip_levels: u32,
    caches: Vec<SampleCache>,
    chunks: Vec<FaceChunk>,
    input_texture: wgpu::Texture,
    output_texture: wgpu::Texture,
    output_view: wgpu::TextureView,
    bind_group: wgpu::BindGroup,
    variants: Vec<PassVariant>,
}

impl SpecularCubemapFilter {
    pub fn new(
        device: &wgpu::Device,
        caps: &DeviceCaps,
        config: SpecularFilterConfig,
    ) -> GeoArResult<Self> {
        if config.resolution < 2 || !config.resolution.is_power_of_two() {
            return Err(GeoArError::validation(format!(
                "cubemap resolution must be a power of two >= 2, got {}",
                config.resolution
            )));
        }
        if config.resolution > caps.max_texture_dimension_2d {
            return Err(GeoArError::device(format!(
                "cubemap resolution {} exceeds device limit {}",
                config.resolution, caps.max_texture_dimension_2d
            )));
        }
        if config.sample_count == 0 {
            return Err(GeoArError::validation(
                "importance sample count must be positive",
            ));
        }

        let mip_levels = mip_level_count(config.resolution);
        let caches = generate_caches(config.resolution, config.sample_count);

        // Both the attachment count and the per-sample byte budget bound how
        // many Rgba16Float faces one pass may write.
        let format_bytes = OUTPUT_FORMAT
            .block_copy_size(None)
            .unwrap_or(8);
        let byte_limited = (caps.max_color_attachment_bytes_per_sample / format_bytes).max(1);
        let chunks = partition_faces(caps.max_color_attachments.min(byte_limited));

        let size = wgpu::Extent3d {
            width: config.resolution,
            height: config.resolution,
            depth_or_array_layers: CUBE_FACE_COUNT,
        };

        let input_texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("cubemap_filter.input"),
            size,
            mip_level_count: mip_levels,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: OUTPUT_FORMAT,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        let output_texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("cubemap_filter.output"),
            size,
            mip_level_count: mip_levels,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: OUTPUT_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT
                | wgpu::TextureUsages::TEXTURE_BINDING
                | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });

        let input_view = input_texture.create_view(&wgpu::TextureViewDescriptor {
            label: Some("cubemap_filter.input.view"),
            format: Some(OUTPUT_FORMAT),
            dimension: Some(wgpu::TextureViewDimension::Cube),
            aspect: wgpu::TextureAspect::All,
            base_mip_level: 0,
            mip_level_count: Some(mip_levels),
            base_array_layer: 0,
            array_layer_count: Some(CUBE_FACE_COUNT),
        });

        let output_view = output_texture.create_view(&wgpu::TextureViewDescriptor {
            label: Some("cubemap_filter.output.view"),
            format: Some(OUTPUT_FORMAT),
            dimension: Some(wgpu::TextureViewDimension::Cube),
            aspect: wgpu::TextureAspect::All,
            base_mip_level: 0,
            mip_level_count: Some(mip_levels),
            base_array_layer: 0,
            array_layer_count: Some(CUBE_FACE_COUNT),
        });

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("cubemap_filter.sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        // Flatten all level caches into one buffer; each variant indexes its
        // level's slice through baked offset/count constants.
        let mut entries = Vec::new();
        let mut level_ranges = Vec::with_capacity(caches.len());
        for cache in &caches {
            let offset = entries.len() as u32;
            for entry in &cache.entries {
                entries.push(CacheEntryGpu {
                    direction_contribution: [
                        entry.direction.x,
                        entry.direction.y,
                        entry.direction.z,
                        entry.contribution,
                    ],
                    source_level: [entry.level, 0.0, 0.0, 0.0],
                });
            }
            level_ranges.push((offset, cache.entries.len() as u32));
        }
        if entries.is_empty() {
            entries.push(CacheEntryGpu::zeroed());
        }

        let cache_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("cubemap_filter.sample_cache"),
            contents: bytemuck::cast_slice(&entries),
            usage: wgpu::BufferUsages::STORAGE,
        });

        let bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("cubemap_filter.bind_layout"),
                entries: &[
                    wgpu::BindGroupLayoutEntry {
                        binding: 0,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Texture {
                            sample_type: wgpu::TextureSampleType::Float { filterable: true },
                            view_dimension: wgpu::TextureViewDimension::Cube,
                            multisampled: false,
                        },
                        count: None,
                    },
                    wgpu::BindGroupLayoutEntry {
                        binding: 1,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                        count: None,
                    },
                    wgpu::BindGroupLayoutEntry {
                        binding: 2,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Buffer {
                            ty: wgpu::BufferBindingType::Storage { read_only: true },
                            has_dynamic_offset: false,
                            min_binding_size: None,
                        },
                        count: None,
                    },
                ],
            });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("cubemap_filter.bind_group"),
            layout: &bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&input_view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&sampler),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: cache_buffer.as_entire_binding(),
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("cubemap_filter.pipeline_layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let template = include_str!("../shaders/cubemap_prefilter.wgsl");
        let mut variants = Vec::with_capacity((mip_levels as usize) * chunks.len());

        for level in 0..mip_levels {
            // Level 0 is the mirror reflection; its variants carry an empty
            // cache slice and pass the base level through.
            let (offset, count) = if level == 0 {
                (0, 0)
            } else {
                level_ranges[(level - 1) as usize]
            };

            for chunk in &chunks {
                let source = variant_source(template, chunk, offset, count);
                let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
                    label: Some(&format!(
                        "cubemap_filter.shader.mip{}.chunk{}",
                        level, chunk.index
                    )),
                    source: wgpu::ShaderSource::Wgsl(source.into()),
                });

                let color_targets = vec![
                    Some(wgpu::ColorTargetState {
                        format: OUTPUT_FORMAT,
                        blend: None,
                        write_mask: wgpu::ColorWrites::ALL,
                    });
                    chunk.size as usize
                ];

                let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                    label: Some(&format!(
                        "cubemap_filter.pipeline.mip{}.chunk{}",
                        level, chunk.index
                    )),
                    layout: Some(&pipeline_layout),
                    vertex: wgpu::VertexState {
                        module: &module,
                        entry_point: "vs_main",
                        buffers: &[],
                    },
                    fragment: Some(wgpu::FragmentState {
                        module: &module,
                        entry_point: "fs_main",
                        targets: &color_targets,
                    }),
                    primitive: wgpu::PrimitiveState::default(),
                    depth_stencil: None,
                    multisample: wgpu::MultisampleState::default(),
                    multiview: None,
                });

                let targets = (0..chunk.size)
                    .map(|i| {
                        output_texture.create_view(&wgpu::TextureViewDescriptor {
                            label: Some(&format!(
                                "cubemap_filter.target.mip{}.face{}",
                                level,
                                chunk.first_face + i
                            )),
                            format: Some(OUTPUT_FORMAT),
                            dimension: Some(wgpu::TextureViewDimension::D2),
                            aspect: wgpu::TextureAspect::All,
                            base_mip_level: level,
                            mip_level_count: Some(1),
                            base_array_layer: chunk.first_face + i,
                            array_layer_count: Some(1),
                        })
                    })
                    .collect();

                variants.push(PassVariant {
                    level,
                    chunk: *chunk,
                    pipeline,
                    targets,
                });
            }
        }

        info!(
            "specular cubemap filter ready: {}x{} faces, {} mip levels, {} chunks, {} passes",
            config.resolution,
            config.resolution,
            mip_levels,
            chunks.len(),
            variants.len()
        );

        Ok(Self {
            config,
            mip_levels,
            caches,
            chunks,
            input_texture,
            output_texture,
            output_view,
            bind_group,
            variants,
        })
    }

    /// Filter one frame's radiance faces into the output chain.
    ///
    /// A malformed batch is rejected before any upload, leaving the previous
    /// filtered output intact and reusable.
    pub fn update(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        faces: &[CubemapFaceImage],
    ) -> GeoArResult<()> {
        if let Err(err) = validate_face_batch(faces, self.config.resolution) {
            warn!("cubemap batch rejected: {err}");
            return Err(err);
        }

        for (face_index, face) in faces.iter().enumerate() {
            let chain = build_face_mip_chain(face, self.mip_levels);
            for (mip, level_pixels) in chain.iter().enumerate() {
                let mip_size = (self.config.resolution >> mip).max(1);
                let texels = half_texels(level_pixels);
                let (padded, bytes_per_row) = pad_image_rows(&texels, mip_size, mip_size, 8);
                queue.write_texture(
                    wgpu::ImageCopyTexture {
                        texture: &self.input_texture,
                        mip_level: mip as u32,
                        origin: wgpu::Origin3d {
                            x: 0,
                            y: 0,
                            z: face_index as u32,
                        },
                        aspect: wgpu::TextureAspect::All,
                    },
                    &padded,
                    wgpu::ImageDataLayout {
                        offset: 0,
                        bytes_per_row: Some(bytes_per_row),
                        rows_per_image: Some(mip_size),
                    },
                    wgpu::Extent3d {
                        width: mip_size,
                        height: mip_size,
                        depth_or_array_layers: 1,
                    },
                );
            }
        }

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("cubemap_filter.encoder"),
        });

        for variant in &self.variants {
            let color_attachments: Vec<_> = variant
                .targets
                .iter()
                .map(|view| {
                    Some(wgpu::RenderPassColorAttachment {
                        view,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                            store: wgpu::StoreOp::Store,
                        },
                    })
                })
                .collect();

            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some(&format!(
                    "cubemap_filter.pass.mip{}.chunk{}",
                    variant.level, variant.chunk.index
                )),
                color_attachments: &color_attachments,
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            pass.set_pipeline(&variant.pipeline);
            pass.set_bind_group(0, &self.bind_group, &[]);
            pass.draw(0..3, 0..1);
        }

        queue.submit(Some(encoder.finish()));
        Ok(())
    }

    /// Pull this frame's faces from a light-estimation source and filter
    /// them. Returns false on frames where the source has nothing new; the
    /// previous output stays valid.
    pub fn update_from_source(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        source: &mut dyn CubemapFaceSource,
    ) -> GeoArResult<bool> {
        match source.acquire_faces() {
            Some(faces) => {
                self.update(device, queue, &faces)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Filtered cubemap, mip level indexed by roughness.
    pub fn output_texture(&self) -> &wgpu::Texture {
        &self.output_texture
    }

    /// Cube view over the full filtered chain, for the shading stage.
    pub fn output_view(&self) -> &wgpu::TextureView {
        &self.output_view
    }

    pub fn mip_level_count(&self) -> u32 {
        self.mip_levels
    }

    /// Importance-sample caches, one per filtered level in level order.
    pub fn caches(&self) -> &[SampleCache] {
        &self.caches
    }

    pub fn chunks(&self) -> &[FaceChunk] {
        &self.chunks
    }

    pub fn config(&self) -> SpecularFilterConfig {
        self.config
    }
}

fn variant_source(template: &str, chunk: &FaceChunk, offset: u32, count: u32) -> String {
    let mut members = String::new();
    let mut writes = String::new();
    for i in 0..chunk.size {
        members.push_str(&format!("    @location({i}) face{i}: vec4<f32>,\n"));
        writes.push_str(&format!(
            "    out.face{i} = filter_face(FIRST_FACE + {i}u, st);\n"
        ));
    }

    template
        .replace("{{FIRST_FACE}}", &chunk.first_face.to_string())
        .replace("{{CACHE_OFFSET}}", &offset.to_string())
        .replace("{{CACHE_COUNT}}", &count.to_string())
        .replace("{{OUTPUT_STRUCT_MEMBERS}}\n", &members)
        .replace("{{OUTPUT_WRITES}}\n", &writes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variant_source_substitution() {
        let chunk = FaceChunk {
            index: 1,
            first_face: 4,
            size: 2,
        };
        let template = include_str!("../shaders/cubemap_prefilter.wgsl");
        let source = variant_source(template, &chunk, 96, 27);

        assert!(source.contains("const FIRST_FACE: u32 = 4u;"));
        assert!(source.contains("const CACHE_OFFSET: u32 = 96u;"));
        assert!(source.contains("const CACHE_COUNT: u32 = 27u;"));
        assert!(source.contains("@location(1) face1: vec4<f32>"));
        assert!(source.contains("filter_face(FIRST_FACE + 1u, st)"));
        assert!(!source.contains("{{"));
    }
}
