use std::fmt;

use crate::device::UploadError;

/// Errors raised while configuring, building or uploading a mesh buffer.
///
/// All failures are local and synchronous; nothing here is retryable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MeshError {
    /// Non-positive or out-of-range capacity, or a malformed attribute descriptor.
    InvalidArgument(String),
    /// Offset/size requested for a slot that is not registered or not enabled.
    Configuration(String),
    /// Vertex or index writes beyond the declared capacity.
    CapacityExceeded { what: &'static str, capacity: usize },
    /// Bytes written for a vertex do not match the layout stride.
    LayoutMismatch {
        vertex: usize,
        written: usize,
        stride: usize,
    },
    /// Propagated from the upload boundary.
    DeviceUpload(UploadError),
}

impl fmt::Display for MeshError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidArgument(msg) => write!(f, "invalid argument: {msg}"),
            Self::Configuration(msg) => write!(f, "configuration error: {msg}"),
            Self::CapacityExceeded { what, capacity } => {
                write!(f, "{what} capacity of {capacity} exceeded")
            }
            Self::LayoutMismatch {
                vertex,
                written,
                stride,
            } => write!(
                f,
                "vertex {vertex} wrote {written} bytes but the layout stride is {stride}"
            ),
            Self::DeviceUpload(err) => write!(f, "device upload failed: {err}"),
        }
    }
}

impl std::error::Error for MeshError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::DeviceUpload(err) => Some(err),
            _ => None,
        }
    }
}

impl From<UploadError> for MeshError {
    fn from(err: UploadError) -> Self {
        Self::DeviceUpload(err)
    }
}
