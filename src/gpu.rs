use once_cell::sync::OnceCell;

pub struct GpuContext {
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub adapter: wgpu::Adapter,
}

static CTX: OnceCell<Option<GpuContext>> = OnceCell::new();

/// Shared GPU context for hosts and tests that do not bring their own device.
/// Returns None when no adapter is available on this machine.
pub fn try_ctx() -> Option<&'static GpuContext> {
    CTX.get_or_init(|| {
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: None,
            force_fallback_adapter: false,
        }))?;

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::downlevel_defaults(),
                label: Some("geoar-device"),
            },
            None,
        ))
        .ok()?;

        Some(GpuContext {
            device,
            queue,
            adapter,
        })
    })
    .as_ref()
}

pub fn ctx() -> &'static GpuContext {
    try_ctx().expect("No suitable GPU adapter")
}

/// Align to WebGPU's required bytes-per-row for copies.
#[inline]
pub fn align_copy_bpr(unpadded: u32) -> u32 {
    let a = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
    ((unpadded + a - 1) / a) * a
}
