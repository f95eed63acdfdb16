//! Device upload boundary.
//!
//! This module is responsible for:
//! - the [`DeviceUpload`] contract the packer hands finished bytes to
//! - a host-memory backend ([`HostDevice`]) for headless use and tests
//! - a wgpu backend ([`WgpuDevice`]) plus a surface-less [`Gpu`] context

mod gpu;
mod host;
mod init;
mod upload;

pub use gpu::{Gpu, WgpuDevice};
pub use host::HostDevice;
pub use init::GpuInit;
pub use upload::{BufferKind, DeviceHandle, DeviceUpload, UploadError};
