use anyhow::{Context, Result};

/// Initialization parameters for the GPU layer.
///
/// Keep this structure stable and minimal; add flags only when a concrete
/// backend requirement exists.
#[derive(Debug, Clone)]
pub struct GpuInit {
    /// Required wgpu features. Favor an empty set for portability.
    pub required_features: wgpu::Features,

    /// Limits requested from the adapter/device.
    pub required_limits: wgpu::Limits,

    /// Prefer a discrete adapter when several are available.
    pub power_preference: wgpu::PowerPreference,
}

impl Default for GpuInit {
    fn default() -> Self {
        Self {
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::default(),
            power_preference: wgpu::PowerPreference::HighPerformance,
        }
    }
}

/// Owns the wgpu core objects for offscreen effect rendering.
pub struct Gpu {
    instance: wgpu::Instance,
    adapter: wgpu::Adapter,
    device: wgpu::Device,
    queue: wgpu::Queue,
}

impl Gpu {
    /// Creates a headless GPU context.
    ///
    /// Adapter/device acquisition is asynchronous under wgpu.
    pub async fn new(init: GpuInit) -> Result<Self> {
        // All backends so wgpu selects the optimal platform backend.
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: init.power_preference,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .context("failed to find a suitable GPU adapter")?;

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("kagami-engine device"),
                required_features: init.required_features,
                required_limits: init.required_limits,
                experimental_features: wgpu::ExperimentalFeatures::disabled(),
                memory_hints: wgpu::MemoryHints::Performance,
                trace: wgpu::Trace::Off,
            })
            .await
            .context("failed to create wgpu device/queue")?;

        Ok(Gpu { instance, adapter, device, queue })
    }

    /// Blocking variant of [`Gpu::new`] for synchronous hosts.
    pub fn new_blocking(init: GpuInit) -> Result<Self> {
        pollster::block_on(Self::new(init))
    }

    pub fn instance(&self) -> &wgpu::Instance {
        &self.instance
    }

    pub fn adapter(&self) -> &wgpu::Adapter {
        &self.adapter
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }
}
