use std::fmt;
use std::num::NonZeroU64;

/// Opaque handle to a buffer living in device memory.
///
/// Zero is never a valid handle, so `Option<DeviceHandle>` doubles as the
/// "not uploaded" state.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct DeviceHandle(NonZeroU64);

impl DeviceHandle {
    #[inline]
    pub fn from_raw(raw: u64) -> Option<Self> {
        NonZeroU64::new(raw).map(Self)
    }

    #[inline]
    pub fn raw(self) -> u64 {
        self.0.get()
    }
}

/// Role of an uploaded buffer.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum BufferKind {
    Vertex,
    Index,
}

/// Failure reported by a device upload backend. Not interpreted by the packer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadError {
    pub message: String,
}

impl UploadError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self {
            message: msg.into(),
        }
    }
}

impl fmt::Display for UploadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for UploadError {}

/// Device upload boundary.
///
/// Implementations copy packed bytes into device memory and hand back an
/// opaque handle. Handles stay valid until passed to [`release_handle`].
/// All calls happen on the thread that owns the rendering context.
///
/// [`release_handle`]: DeviceUpload::release_handle
pub trait DeviceUpload {
    fn upload_vertex_bytes(&mut self, bytes: &[u8]) -> Result<DeviceHandle, UploadError>;

    fn upload_index_bytes(&mut self, bytes: &[u8]) -> Result<DeviceHandle, UploadError>;

    /// Releases device storage. Unknown handles are ignored.
    fn release_handle(&mut self, handle: DeviceHandle);
}

/// Issues monotonically increasing non-zero handles.
#[derive(Debug, Default)]
pub(crate) struct HandleAllocator {
    issued: u64,
}

impl HandleAllocator {
    pub(crate) fn next(&mut self) -> DeviceHandle {
        self.issued += 1;
        DeviceHandle(NonZeroU64::MIN.saturating_add(self.issued - 1))
    }
}
