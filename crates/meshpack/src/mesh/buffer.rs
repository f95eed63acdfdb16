use crate::device::{DeviceHandle, DeviceUpload};

use super::bytes::ByteBuffer;
use super::error::MeshError;
use super::slot::{AttributeDescriptor, AttributeMask, AttributeSlot, Topology};

/// Largest vertex count addressable by 16-bit indices.
pub const MAX_VERTICES: usize = u16::MAX as usize + 1;

/// Bytes per index (indices are little-endian u16).
pub const INDEX_SIZE: usize = 2;

const POSITION_SIZE: usize = 3 * 4;

/// Capacity and layout chosen when a mesh buffer is created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeshBufferConfig {
    pub vertex_capacity: usize,
    pub index_capacity: usize,
    pub topology: Topology,
    pub mask: AttributeMask,
    /// Shape of `Custom0`. Required iff `mask` contains `CUSTOM0`.
    pub custom_attribute: Option<AttributeDescriptor>,
}

impl MeshBufferConfig {
    /// Position-only polygon layout.
    pub fn new(vertex_capacity: usize, index_capacity: usize) -> Self {
        Self {
            vertex_capacity,
            index_capacity,
            topology: Topology::Polygons,
            mask: AttributeMask::empty(),
            custom_attribute: None,
        }
    }

    pub fn with_topology(mut self, topology: Topology) -> Self {
        self.topology = topology;
        self
    }

    pub fn with_mask(mut self, mask: AttributeMask) -> Self {
        self.mask = mask;
        self
    }

    /// Registers the custom attribute and enables `Custom0`.
    pub fn with_custom_attribute(mut self, attribute: AttributeDescriptor) -> Self {
        self.mask |= AttributeMask::CUSTOM0;
        self.custom_attribute = Some(attribute);
        self
    }

    fn validate(&self) -> Result<(), MeshError> {
        if self.vertex_capacity == 0 || self.vertex_capacity > MAX_VERTICES {
            return Err(MeshError::InvalidArgument(format!(
                "vertex capacity must be in 1..={MAX_VERTICES}, got {}",
                self.vertex_capacity
            )));
        }
        if self.index_capacity == 0 {
            return Err(MeshError::InvalidArgument(
                "index capacity must be positive".into(),
            ));
        }

        match (&self.custom_attribute, self.mask.contains(AttributeMask::CUSTOM0)) {
            (None, true) => Err(MeshError::InvalidArgument(
                "Custom0 is enabled but no custom attribute is registered".into(),
            )),
            (Some(attr), _) if attr.name.is_empty() => Err(MeshError::InvalidArgument(
                "custom attribute name is empty".into(),
            )),
            (Some(attr), _) if !(1..=4).contains(&attr.component_count) => {
                Err(MeshError::InvalidArgument(format!(
                    "custom attribute `{}` has {} components, expected 1..=4",
                    attr.name, attr.component_count
                )))
            }
            _ => Ok(()),
        }
    }
}

/// Device handles of an uploaded mesh.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct DeviceBuffers {
    pub vertex: DeviceHandle,
    pub index: DeviceHandle,
}

/// Packed interleaved vertex bytes plus 16-bit index bytes, and the layout
/// that gives them meaning.
///
/// Capacities, mask and custom attribute are fixed at construction. Contents
/// are written by one [`MeshBuilder`](super::MeshBuilder) pass and frozen at
/// finalize; [`reset`](Self::reset) empties them for reuse without giving back
/// the reservation.
///
/// Device handles are released only by [`destroy`](Self::destroy) or a later
/// upload; there is no automatic release on drop. Resetting parks the current
/// handles as stale: they no longer describe the contents and are never
/// reported by [`device_buffers`](Self::device_buffers).
#[derive(Debug)]
pub struct MeshBuffer {
    vertex_capacity: usize,
    index_capacity: usize,
    topology: Topology,
    mask: AttributeMask,
    custom: Option<AttributeDescriptor>,

    vertex_bytes: ByteBuffer,
    index_bytes: ByteBuffer,

    vertex_count: usize,
    index_count: usize,

    device: Option<DeviceBuffers>,
    stale: Option<DeviceBuffers>,
}

impl MeshBuffer {
    /// Creates an empty buffer. No storage is reserved until [`allocate`](Self::allocate).
    pub fn new(config: MeshBufferConfig) -> Result<Self, MeshError> {
        config.validate()?;

        Ok(Self {
            vertex_capacity: config.vertex_capacity,
            index_capacity: config.index_capacity,
            topology: config.topology,
            mask: config.mask,
            custom: config.custom_attribute,
            vertex_bytes: ByteBuffer::new(),
            index_bytes: ByteBuffer::new(),
            vertex_count: 0,
            index_count: 0,
            device: None,
            stale: None,
        })
    }

    /// Reserves `stride * vertex_capacity` vertex bytes and
    /// `2 * index_capacity` index bytes. Calling it again is a no-op.
    pub fn allocate(&mut self) {
        let vertex_target = self.stride() * self.vertex_capacity;
        let index_target = INDEX_SIZE * self.index_capacity;

        self.vertex_bytes
            .reserve(vertex_target.saturating_sub(self.vertex_bytes.len()));
        self.index_bytes
            .reserve(index_target.saturating_sub(self.index_bytes.len()));

        log::debug!(
            "mesh buffer allocated: stride {} bytes, {} vertex bytes, {} index bytes",
            self.stride(),
            self.vertex_bytes.capacity(),
            self.index_bytes.capacity()
        );
    }

    /// Empties both byte sequences, keeping their reservation.
    ///
    /// Uploaded handles become stale until the next upload or destroy.
    pub fn reset(&mut self) {
        if let Some(buffers) = self.device.take() {
            self.stale = Some(buffers);
        }
        self.vertex_bytes.truncate_to_zero_length();
        self.index_bytes.truncate_to_zero_length();
        self.vertex_count = 0;
        self.index_count = 0;
        log::debug!("mesh buffer reset");
    }

    // ── layout ────────────────────────────────────────────────────────────

    /// Bytes per vertex record.
    #[inline]
    pub fn stride(&self) -> usize {
        self.accumulate_until(None)
    }

    /// Byte offset of `slot` inside a vertex record.
    ///
    /// Fails for `Custom0` without a registered descriptor, and for any slot
    /// the mask does not enable.
    pub fn offset_of(&self, slot: AttributeSlot) -> Result<usize, MeshError> {
        self.check_slot(slot)?;
        Ok(self.accumulate_until(Some(slot)))
    }

    /// Byte size of `slot` inside a vertex record.
    pub fn size_of(&self, slot: AttributeSlot) -> Result<usize, MeshError> {
        self.check_slot(slot)?;
        Ok(self.slot_size(slot))
    }

    fn check_slot(&self, slot: AttributeSlot) -> Result<(), MeshError> {
        if slot == AttributeSlot::Custom0 && self.custom.is_none() {
            return Err(MeshError::Configuration(
                "no custom attribute registered for Custom0".into(),
            ));
        }
        if !self.mask.enables(slot) {
            return Err(MeshError::Configuration(format!(
                "{slot:?} is not enabled in mask {:#04x}",
                self.mask.bits()
            )));
        }
        Ok(())
    }

    /// Sums slot sizes in record order, stopping at `until`.
    ///
    /// Disabled slots contribute nothing to the slots after them. `None`
    /// runs to the end of the record.
    fn accumulate_until(&self, until: Option<AttributeSlot>) -> usize {
        if until == Some(AttributeSlot::Position) {
            return 0;
        }

        let mut offset = POSITION_SIZE;
        for slot in AttributeSlot::OPTIONAL {
            if until == Some(slot) {
                return offset;
            }
            if self.mask.enables(slot) {
                offset += self.slot_size(slot);
            }
        }
        offset
    }

    fn slot_size(&self, slot: AttributeSlot) -> usize {
        slot.fixed_size().unwrap_or_else(|| {
            self.custom
                .as_ref()
                .map_or(0, AttributeDescriptor::byte_size)
        })
    }

    // ── accessors ─────────────────────────────────────────────────────────

    #[inline]
    pub fn vertex_capacity(&self) -> usize {
        self.vertex_capacity
    }

    #[inline]
    pub fn index_capacity(&self) -> usize {
        self.index_capacity
    }

    #[inline]
    pub fn topology(&self) -> Topology {
        self.topology
    }

    #[inline]
    pub fn mask(&self) -> AttributeMask {
        self.mask
    }

    /// Registered custom attributes (at most one).
    #[inline]
    pub fn attributes(&self) -> &[AttributeDescriptor] {
        self.custom.as_slice()
    }

    /// Vertices written by the last finalized pass.
    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.vertex_count
    }

    /// Indices written by the last finalized pass.
    #[inline]
    pub fn index_count(&self) -> usize {
        self.index_count
    }

    #[inline]
    pub fn vertex_bytes(&self) -> &[u8] {
        self.vertex_bytes.as_slice()
    }

    #[inline]
    pub fn index_bytes(&self) -> &[u8] {
        self.index_bytes.as_slice()
    }

    #[inline]
    pub fn vertex_storage(&self) -> &ByteBuffer {
        &self.vertex_bytes
    }

    #[inline]
    pub fn index_storage(&self) -> &ByteBuffer {
        &self.index_bytes
    }

    /// Raw bytes of vertex record `index`.
    pub fn vertex_record(&self, index: usize) -> Option<&[u8]> {
        let stride = self.stride();
        let start = index.checked_mul(stride)?;
        let end = start.checked_add(stride)?;
        self.vertex_bytes.as_slice().get(start..end)
    }

    /// Decoded index stream.
    pub fn indices(&self) -> impl Iterator<Item = u16> + '_ {
        self.index_bytes
            .as_slice()
            .chunks_exact(INDEX_SIZE)
            .map(|b| u16::from_le_bytes([b[0], b[1]]))
    }

    pub(super) fn vertex_bytes_mut(&mut self) -> &mut ByteBuffer {
        &mut self.vertex_bytes
    }

    pub(super) fn index_bytes_mut(&mut self) -> &mut ByteBuffer {
        &mut self.index_bytes
    }

    pub(super) fn set_counts(&mut self, vertex_count: usize, index_count: usize) {
        self.vertex_count = vertex_count;
        self.index_count = index_count;
    }

    // ── device boundary ───────────────────────────────────────────────────

    /// True once the current contents live in device memory.
    #[inline]
    pub fn is_uploaded(&self) -> bool {
        self.device.is_some()
    }

    #[inline]
    pub fn device_buffers(&self) -> Option<DeviceBuffers> {
        self.device
    }

    /// True while handles from before the last reset are still held.
    #[inline]
    pub fn has_stale_device_buffers(&self) -> bool {
        self.stale.is_some()
    }

    /// Copies the packed bytes into device memory.
    ///
    /// Handles from an earlier upload, current or stale, are released first. If the index upload
    /// fails the fresh vertex handle is released before the error is returned.
    pub fn upload(&mut self, device: &mut dyn DeviceUpload) -> Result<DeviceBuffers, MeshError> {
        self.release_device(device);

        let vertex = device.upload_vertex_bytes(self.vertex_bytes.as_slice())?;
        let index = match device.upload_index_bytes(self.index_bytes.as_slice()) {
            Ok(handle) => handle,
            Err(err) => {
                device.release_handle(vertex);
                return Err(err.into());
            }
        };

        log::debug!(
            "mesh uploaded: {} vertex bytes -> {}, {} index bytes -> {}",
            self.vertex_bytes.len(),
            vertex.raw(),
            self.index_bytes.len(),
            index.raw()
        );

        let buffers = DeviceBuffers { vertex, index };
        self.device = Some(buffers);
        Ok(buffers)
    }

    /// Releases device handles and byte storage.
    pub fn destroy(&mut self, device: &mut dyn DeviceUpload) {
        self.release_device(device);
        self.vertex_bytes.release();
        self.index_bytes.release();
        self.vertex_count = 0;
        self.index_count = 0;
    }

    fn release_device(&mut self, device: &mut dyn DeviceUpload) {
        for DeviceBuffers { vertex, index } in [self.device.take(), self.stale.take()]
            .into_iter()
            .flatten()
        {
            device.release_handle(vertex);
            device.release_handle(index);
            log::debug!("mesh device buffers {} / {} released", vertex.raw(), index.raw());
        }
    }
}

impl Drop for MeshBuffer {
    fn drop(&mut self) {
        if let Some(DeviceBuffers { vertex, index }) = self.device.or(self.stale) {
            log::warn!(
                "mesh buffer dropped while holding device buffers {} / {}; call destroy first",
                vertex.raw(),
                index.raw()
            );
        }
    }
}
