//! Device capabilities and diagnostics
//!
//! Provides structured access to GPU device capabilities and limits. The
//! cubemap filter reads `max_color_attachments` to size its face chunks.

use crate::gpu::GpuContext;

/// Device capabilities structure
#[derive(Debug, Clone)]
pub struct DeviceCaps {
    /// Backend identifier (vulkan, dx12, metal, gl)
    pub backend: String,

    /// Adapter name from driver
    pub adapter_name: String,

    /// Device type (integrated, discrete, virtual, cpu, other)
    pub device_type: String,

    /// Maximum 2D texture dimension
    pub max_texture_dimension_2d: u32,

    /// Maximum simultaneous color attachments in a render pass
    pub max_color_attachments: u32,

    /// Per-sample byte budget shared by all color attachments of a pass
    pub max_color_attachment_bytes_per_sample: u32,

    /// Maximum buffer size
    pub max_buffer_size: u64,

    /// Support for linear filtering on 32-bit float textures (e.g., R32Float)
    pub float32_filterable: bool,
}

impl DeviceCaps {
    /// Snapshot capabilities from an adapter/device pair.
    pub fn from_adapter_device(adapter: &wgpu::Adapter, device: &wgpu::Device) -> Self {
        let info = adapter.get_info();
        let limits = device.limits();

        Self {
            backend: format!("{:?}", info.backend).to_lowercase(),
            adapter_name: info.name.clone(),
            device_type: match info.device_type {
                wgpu::DeviceType::IntegratedGpu => "integrated".to_string(),
                wgpu::DeviceType::DiscreteGpu => "discrete".to_string(),
                wgpu::DeviceType::VirtualGpu => "virtual".to_string(),
                wgpu::DeviceType::Cpu => "cpu".to_string(),
                wgpu::DeviceType::Other => "other".to_string(),
            },
            max_texture_dimension_2d: limits.max_texture_dimension_2d,
            max_color_attachments: limits.max_color_attachments,
            max_color_attachment_bytes_per_sample: limits.max_color_attachment_bytes_per_sample,
            max_buffer_size: limits.max_buffer_size,
            float32_filterable: device
                .features()
                .contains(wgpu::Features::FLOAT32_FILTERABLE),
        }
    }

    /// Snapshot capabilities from the shared GPU context.
    pub fn from_context(g: &GpuContext) -> Self {
        Self::from_adapter_device(&g.adapter, &g.device)
    }
}
