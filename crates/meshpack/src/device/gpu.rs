use std::collections::HashMap;

use anyhow::{Context, Result};
use wgpu::util::DeviceExt;

use super::upload::{BufferKind, DeviceHandle, DeviceUpload, HandleAllocator, UploadError};
use super::GpuInit;

/// Owns wgpu core objects without a presentation surface.
///
/// Mesh upload only needs a device; windowing lives elsewhere.
pub struct Gpu {
    /// Selected adapter.
    adapter: wgpu::Adapter,

    /// Logical device.
    device: wgpu::Device,

    /// Command queue.
    queue: wgpu::Queue,
}

impl Gpu {
    /// Creates a headless GPU context.
    ///
    /// Adapter/device acquisition is asynchronous under wgpu.
    pub async fn new(init: GpuInit) -> Result<Self> {
        // Use all backends to allow wgpu to select the optimal platform backend.
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: init.power_preference,
                compatible_surface: None,
                force_fallback_adapter: init.force_fallback_adapter,
            })
            .await
            .context("failed to find a suitable GPU adapter")?;

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("meshpack device"),
                required_features: init.required_features,
                required_limits: init.required_limits,
                experimental_features: wgpu::ExperimentalFeatures::disabled(),
                memory_hints: wgpu::MemoryHints::Performance,
                trace: wgpu::Trace::Off,
            })
            .await
            .context("failed to create wgpu device/queue")?;

        log::info!("using adapter {}", adapter.get_info().name);

        Ok(Gpu {
            adapter,
            device,
            queue,
        })
    }

    /// Returns the adapter description.
    pub fn adapter_info(&self) -> wgpu::AdapterInfo {
        self.adapter.get_info()
    }

    /// Returns a reference to the logical device.
    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    /// Returns a reference to the command queue.
    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }
}

/// Upload backend that places packed mesh bytes into wgpu buffers.
///
/// Keeps a registry from opaque handles to the buffers it created so the bind
/// boundary can look them up at draw time.
pub struct WgpuDevice<'d> {
    device: &'d wgpu::Device,
    handles: HandleAllocator,
    buffers: HashMap<DeviceHandle, wgpu::Buffer>,
}

impl<'d> WgpuDevice<'d> {
    pub fn new(device: &'d wgpu::Device) -> Self {
        Self {
            device,
            handles: HandleAllocator::default(),
            buffers: HashMap::new(),
        }
    }

    /// Returns the wgpu buffer behind `handle`, if still live.
    pub fn buffer(&self, handle: DeviceHandle) -> Option<&wgpu::Buffer> {
        self.buffers.get(&handle)
    }

    /// Number of buffers not yet released.
    pub fn live_buffers(&self) -> usize {
        self.buffers.len()
    }

    fn upload(&mut self, kind: BufferKind, bytes: &[u8]) -> Result<DeviceHandle, UploadError> {
        let max = self.device.limits().max_buffer_size;
        if bytes.len() as u64 > max {
            return Err(UploadError::new(format!(
                "{kind:?} buffer of {} bytes exceeds device limit {max}",
                bytes.len()
            )));
        }

        let (label, usage) = match kind {
            BufferKind::Vertex => (
                "meshpack vertex buffer",
                wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            ),
            BufferKind::Index => (
                "meshpack index buffer",
                wgpu::BufferUsages::INDEX | wgpu::BufferUsages::COPY_DST,
            ),
        };

        let buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(label),
                contents: bytes,
                usage,
            });

        let handle = self.handles.next();
        self.buffers.insert(handle, buffer);
        Ok(handle)
    }
}

impl DeviceUpload for WgpuDevice<'_> {
    fn upload_vertex_bytes(&mut self, bytes: &[u8]) -> Result<DeviceHandle, UploadError> {
        self.upload(BufferKind::Vertex, bytes)
    }

    fn upload_index_bytes(&mut self, bytes: &[u8]) -> Result<DeviceHandle, UploadError> {
        self.upload(BufferKind::Index, bytes)
    }

    fn release_handle(&mut self, handle: DeviceHandle) {
        if let Some(buffer) = self.buffers.remove(&handle) {
            buffer.destroy();
        }
    }
}
