use std::collections::HashMap;

use super::upload::{BufferKind, DeviceHandle, DeviceUpload, HandleAllocator, UploadError};

/// Upload backend that keeps "device" buffers in host memory.
///
/// Used when no GPU adapter is available and as the test backend. An optional
/// byte limit makes oversized uploads fail the way a real device would.
#[derive(Debug, Default)]
pub struct HostDevice {
    handles: HandleAllocator,
    buffers: HashMap<DeviceHandle, (BufferKind, Vec<u8>)>,
    max_buffer_size: Option<usize>,
}

impl HostDevice {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rejects any single upload larger than `max_buffer_size` bytes.
    pub fn with_max_buffer_size(max_buffer_size: usize) -> Self {
        Self {
            max_buffer_size: Some(max_buffer_size),
            ..Self::default()
        }
    }

    pub fn bytes(&self, handle: DeviceHandle) -> Option<&[u8]> {
        self.buffers.get(&handle).map(|(_, bytes)| bytes.as_slice())
    }

    pub fn kind(&self, handle: DeviceHandle) -> Option<BufferKind> {
        self.buffers.get(&handle).map(|(kind, _)| *kind)
    }

    /// Number of buffers not yet released.
    pub fn live_buffers(&self) -> usize {
        self.buffers.len()
    }

    fn upload(&mut self, kind: BufferKind, bytes: &[u8]) -> Result<DeviceHandle, UploadError> {
        if let Some(max) = self.max_buffer_size {
            if bytes.len() > max {
                return Err(UploadError::new(format!(
                    "{kind:?} buffer of {} bytes exceeds the {max} byte limit",
                    bytes.len()
                )));
            }
        }
        let handle = self.handles.next();
        self.buffers.insert(handle, (kind, bytes.to_vec()));
        Ok(handle)
    }
}

impl DeviceUpload for HostDevice {
    fn upload_vertex_bytes(&mut self, bytes: &[u8]) -> Result<DeviceHandle, UploadError> {
        self.upload(BufferKind::Vertex, bytes)
    }

    fn upload_index_bytes(&mut self, bytes: &[u8]) -> Result<DeviceHandle, UploadError> {
        self.upload(BufferKind::Index, bytes)
    }

    fn release_handle(&mut self, handle: DeviceHandle) {
        self.buffers.remove(&handle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upload_copies_bytes() {
        let mut dev = HostDevice::new();
        let h = dev.upload_vertex_bytes(&[1, 2, 3]).unwrap();
        assert_eq!(dev.bytes(h), Some(&[1u8, 2, 3][..]));
        assert_eq!(dev.kind(h), Some(BufferKind::Vertex));
    }

    #[test]
    fn release_forgets_buffer() {
        let mut dev = HostDevice::new();
        let h = dev.upload_index_bytes(&[0, 0]).unwrap();
        dev.release_handle(h);
        assert_eq!(dev.live_buffers(), 0);
        assert!(dev.bytes(h).is_none());
    }

    #[test]
    fn byte_limit_rejects_large_uploads() {
        let mut dev = HostDevice::with_max_buffer_size(4);
        assert!(dev.upload_vertex_bytes(&[0; 4]).is_ok());
        assert!(dev.upload_vertex_bytes(&[0; 5]).is_err());
    }
}
