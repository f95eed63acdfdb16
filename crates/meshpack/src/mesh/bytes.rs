/// Growable byte storage that keeps its reservation across reuse.
///
/// Multi-byte values are always written little-endian regardless of host.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ByteBuffer {
    bytes: Vec<u8>,
}

impl ByteBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            bytes: Vec::with_capacity(capacity),
        }
    }

    /// Ensures room for at least `additional` more bytes without reallocating.
    #[inline]
    pub fn reserve(&mut self, additional: usize) {
        self.bytes.reserve(additional);
    }

    #[inline]
    pub fn append(&mut self, bytes: &[u8]) {
        self.bytes.extend_from_slice(bytes);
    }

    #[inline]
    pub fn push_u8(&mut self, value: u8) {
        self.bytes.push(value);
    }

    #[inline]
    pub fn push_u16(&mut self, value: u16) {
        self.append(&value.to_le_bytes());
    }

    #[inline]
    pub fn push_f32(&mut self, value: f32) {
        self.append(&value.to_le_bytes());
    }

    /// Drops the contents, keeping the allocation.
    #[inline]
    pub fn truncate_to_zero_length(&mut self) {
        self.bytes.clear();
    }

    /// Drops the contents and the allocation.
    pub fn release(&mut self) {
        self.bytes = Vec::new();
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.bytes.capacity()
    }

    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }
}

impl AsRef<[u8]> for ByteBuffer {
    fn as_ref(&self) -> &[u8] {
        self.as_slice()
    }
}
