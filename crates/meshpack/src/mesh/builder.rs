use std::fmt;

use crate::device::DeviceUpload;

use super::buffer::{MeshBuffer, MeshBufferConfig, MAX_VERTICES};
use super::error::MeshError;

/// Single-pass writer that packs vertices and indices into a [`MeshBuffer`].
///
/// For every vertex, call [`start_vertex`](Self::start_vertex) and then write
/// the enabled slots exactly once each, in record order:
/// position, normal, colour, texcoord0, custom0. The byte count of each vertex
/// is checked against the layout stride at the next `start_vertex` and at
/// [`finalize`](Self::finalize).
///
/// The builder owns the target buffer for the duration of the pass and hands
/// it back from `finalize` (or [`abandon`](Self::abandon)).
#[derive(Debug)]
pub struct MeshBuilder {
    buffer: MeshBuffer,
    stride: usize,
    vertex_counter: usize,
    index_counter: usize,
}

impl MeshBuilder {
    /// Starts a pass into a freshly created buffer.
    pub fn new(config: MeshBufferConfig) -> Result<Self, MeshError> {
        Ok(Self::reuse(MeshBuffer::new(config)?))
    }

    /// Starts a pass into an existing buffer.
    ///
    /// Previous contents are dropped; the reserved storage is kept.
    pub fn reuse(mut buffer: MeshBuffer) -> Self {
        buffer.reset();
        buffer.allocate();
        let stride = buffer.stride();
        Self {
            buffer,
            stride,
            vertex_counter: 0,
            index_counter: 0,
        }
    }

    /// Begins a new vertex and returns its index.
    ///
    /// Indices are handed out in increasing order starting at 0.
    pub fn start_vertex(&mut self) -> Result<u16, MeshError> {
        self.check_layout()?;

        if self.vertex_counter >= self.buffer.vertex_capacity() {
            return Err(MeshError::CapacityExceeded {
                what: "vertex",
                capacity: self.buffer.vertex_capacity(),
            });
        }
        let index = u16::try_from(self.vertex_counter).map_err(|_| MeshError::CapacityExceeded {
            what: "vertex",
            capacity: MAX_VERTICES,
        })?;

        self.vertex_counter += 1;
        Ok(index)
    }

    pub fn add_position(&mut self, x: f32, y: f32, z: f32) -> &mut Self {
        self.push_floats(&[x, y, z])
    }

    pub fn add_normal(&mut self, x: f32, y: f32, z: f32) -> &mut Self {
        self.push_floats(&[x, y, z])
    }

    pub fn add_colour(&mut self, r: u8, g: u8, b: u8, a: u8) -> &mut Self {
        self.buffer.vertex_bytes_mut().append(&[r, g, b, a]);
        self
    }

    pub fn add_tex_coord(&mut self, u: f32, v: f32) -> &mut Self {
        self.push_floats(&[u, v])
    }

    /// Writes a two-component custom attribute.
    pub fn add_attr2f(&mut self, u: f32, v: f32) -> &mut Self {
        self.push_floats(&[u, v])
    }

    /// Writes the custom attribute, one f32 per component.
    pub fn add_attr(&mut self, components: &[f32]) -> &mut Self {
        self.push_floats(components)
    }

    fn push_floats(&mut self, values: &[f32]) -> &mut Self {
        let bytes = self.buffer.vertex_bytes_mut();
        for &v in values {
            bytes.push_f32(v);
        }
        self
    }

    /// Appends one triangle.
    pub fn add_indices3(&mut self, a: u16, b: u16, c: u16) -> Result<(), MeshError> {
        self.push_indices(&[a, b, c])
    }

    /// Appends one quad. Expansion to triangles is left to the renderer.
    pub fn add_indices4(&mut self, a: u16, b: u16, c: u16, d: u16) -> Result<(), MeshError> {
        self.push_indices(&[a, b, c, d])
    }

    fn push_indices(&mut self, indices: &[u16]) -> Result<(), MeshError> {
        let capacity = self.buffer.index_capacity();
        if self.index_counter + indices.len() > capacity {
            return Err(MeshError::CapacityExceeded {
                what: "index",
                capacity,
            });
        }

        let bytes = self.buffer.index_bytes_mut();
        for &i in indices {
            bytes.push_u16(i);
        }
        self.index_counter += indices.len();
        Ok(())
    }

    /// True until the first index is written.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.index_counter == 0
    }

    /// Vertices started so far.
    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.vertex_counter
    }

    /// Indices written so far.
    #[inline]
    pub fn index_count(&self) -> usize {
        self.index_counter
    }

    #[inline]
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Freezes counts and returns the finished buffer, uploading it first
    /// when a device is given.
    ///
    /// On failure the builder comes back inside the error so the buffer and
    /// any device handles it holds can still be destroyed.
    pub fn finalize(
        mut self,
        device: Option<&mut dyn DeviceUpload>,
    ) -> Result<MeshBuffer, FinalizeError> {
        if let Err(error) = self.check_layout() {
            return Err(FinalizeError { error, builder: self });
        }
        self.buffer.set_counts(self.vertex_counter, self.index_counter);

        log::debug!(
            "mesh finalized: {} vertices ({} bytes), {} indices",
            self.vertex_counter,
            self.buffer.vertex_bytes().len(),
            self.index_counter
        );

        if let Some(device) = device {
            if let Err(error) = self.buffer.upload(device) {
                return Err(FinalizeError { error, builder: self });
            }
        }
        Ok(self.buffer)
    }

    /// Ends the pass without finalizing. The buffer keeps whatever was written
    /// and must be reset before reuse.
    pub fn abandon(self) -> MeshBuffer {
        self.buffer
    }

    /// Verifies every started vertex wrote exactly one stride of bytes.
    fn check_layout(&self) -> Result<(), MeshError> {
        let written = self.buffer.vertex_bytes().len();
        let expected = self.vertex_counter * self.stride;
        if written == expected {
            return Ok(());
        }

        let vertex = self.vertex_counter.saturating_sub(1);
        Err(MeshError::LayoutMismatch {
            vertex,
            written: written.saturating_sub(vertex * self.stride),
            stride: self.stride,
        })
    }
}

/// A failed [`MeshBuilder::finalize`], carrying the builder back.
#[derive(Debug)]
pub struct FinalizeError {
    error: MeshError,
    builder: MeshBuilder,
}

impl FinalizeError {
    pub fn error(&self) -> &MeshError {
        &self.error
    }

    /// Recovers the builder; [`MeshBuilder::abandon`] then yields the buffer.
    pub fn into_builder(self) -> MeshBuilder {
        self.builder
    }
}

impl fmt::Display for FinalizeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "finalize failed: {}", self.error)
    }
}

impl std::error::Error for FinalizeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

impl From<FinalizeError> for MeshError {
    fn from(e: FinalizeError) -> Self {
        e.error
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::HostDevice;
    use crate::mesh::{AttributeDescriptor, AttributeMask, AttributeSlot};

    fn read_f32(bytes: &[u8], at: usize) -> f32 {
        f32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
    }

    fn full_config() -> MeshBufferConfig {
        MeshBufferConfig::new(3, 3)
            .with_mask(AttributeMask::NORMAL | AttributeMask::COLOUR | AttributeMask::TEX_COORD0)
            .with_custom_attribute(AttributeDescriptor::new("wind", 2))
    }

    // ── packing ───────────────────────────────────────────────────────────

    #[test]
    fn packed_record_reads_back_bit_exact() {
        let mut b = MeshBuilder::new(full_config()).unwrap();
        let values: [(f32, u8); 3] = [(0.1, 10), (-2.5, 200), (f32::MAX, 255)];

        for (f, c) in values {
            b.start_vertex().unwrap();
            b.add_position(f, f + 1.0, f + 2.0)
                .add_normal(-f, 0.0, 1.0)
                .add_colour(c, c / 2, 0, 255)
                .add_tex_coord(f * 0.5, 1.0 - f)
                .add_attr2f(f, -f);
        }
        b.add_indices3(0, 1, 2).unwrap();

        let buf = b.finalize(None).unwrap();
        let stride = buf.stride();
        let bytes = buf.vertex_bytes();
        let off = |s| buf.offset_of(s).unwrap();

        for (i, (f, c)) in values.into_iter().enumerate() {
            let base = i * stride;
            let pos = base + off(AttributeSlot::Position);
            assert_eq!(read_f32(bytes, pos).to_bits(), f.to_bits());
            assert_eq!(read_f32(bytes, pos + 4).to_bits(), (f + 1.0).to_bits());
            assert_eq!(read_f32(bytes, pos + 8).to_bits(), (f + 2.0).to_bits());

            let nrm = base + off(AttributeSlot::Normal);
            assert_eq!(read_f32(bytes, nrm).to_bits(), (-f).to_bits());

            let col = base + off(AttributeSlot::Colour);
            assert_eq!(&bytes[col..col + 4], &[c, c / 2, 0, 255]);

            let uv = base + off(AttributeSlot::TexCoord0);
            assert_eq!(read_f32(bytes, uv).to_bits(), (f * 0.5).to_bits());
            assert_eq!(read_f32(bytes, uv + 4).to_bits(), (1.0 - f).to_bits());

            let custom = base + off(AttributeSlot::Custom0);
            assert_eq!(read_f32(bytes, custom).to_bits(), f.to_bits());
            assert_eq!(read_f32(bytes, custom + 4).to_bits(), (-f).to_bits());
        }
    }

    #[test]
    fn position_bytes_are_little_endian() {
        let mut b = MeshBuilder::new(MeshBufferConfig::new(1, 3)).unwrap();
        b.start_vertex().unwrap();
        b.add_position(1.0, -2.0, 0.5);
        let buf = b.finalize(None).unwrap();

        assert_eq!(
            buf.vertex_bytes(),
            &[0, 0, 0x80, 0x3f, 0, 0, 0, 0xc0, 0, 0, 0, 0x3f]
        );
    }

    #[test]
    fn indices_are_u16_little_endian() {
        let mut b = MeshBuilder::new(MeshBufferConfig::new(1, 4)).unwrap();
        b.start_vertex().unwrap();
        b.add_position(0.0, 0.0, 0.0);
        b.add_indices4(0, 1, 0x0102, u16::MAX).unwrap();
        let buf = b.finalize(None).unwrap();

        assert_eq!(buf.index_bytes(), &[0, 0, 1, 0, 2, 1, 0xff, 0xff]);
        assert_eq!(buf.indices().collect::<Vec<_>>(), vec![0, 1, 0x0102, u16::MAX]);
    }

    // ── counters ──────────────────────────────────────────────────────────

    #[test]
    fn vertex_indices_are_sequential() {
        let mut b = MeshBuilder::new(MeshBufferConfig::new(3, 3)).unwrap();
        for expected in 0..3u16 {
            assert_eq!(b.start_vertex().unwrap(), expected);
            b.add_position(0.0, 0.0, 0.0);
        }
        assert_eq!(b.vertex_count(), 3);
    }

    #[test]
    fn counts_are_frozen_at_finalize() {
        let mut b = MeshBuilder::new(MeshBufferConfig::new(4, 7)).unwrap();
        for _ in 0..4 {
            b.start_vertex().unwrap();
            b.add_position(0.0, 0.0, 0.0);
        }
        assert!(b.is_empty());
        b.add_indices3(0, 1, 2).unwrap();
        b.add_indices4(0, 1, 2, 3).unwrap();
        assert!(!b.is_empty());

        let buf = b.finalize(None).unwrap();
        assert_eq!(buf.vertex_count(), 4);
        assert_eq!(buf.index_count(), 7);
        assert_eq!(buf.vertex_bytes().len(), 4 * 12);
        assert_eq!(buf.index_bytes().len(), 7 * 2);
    }

    // ── capacity ──────────────────────────────────────────────────────────

    #[test]
    fn vertex_overrun_fails_at_the_offending_call() {
        let mut b = MeshBuilder::new(MeshBufferConfig::new(1, 3)).unwrap();
        b.start_vertex().unwrap();
        b.add_position(0.0, 0.0, 0.0);

        assert_eq!(
            b.start_vertex(),
            Err(MeshError::CapacityExceeded {
                what: "vertex",
                capacity: 1
            })
        );
        assert_eq!(b.vertex_count(), 1);
    }

    #[test]
    fn index_overrun_writes_nothing() {
        let mut b = MeshBuilder::new(MeshBufferConfig::new(4, 5)).unwrap();
        b.add_indices3(0, 1, 2).unwrap();

        assert!(matches!(
            b.add_indices3(0, 1, 2),
            Err(MeshError::CapacityExceeded { what: "index", .. })
        ));
        assert_eq!(b.index_count(), 3);
    }

    #[test]
    fn full_16_bit_range_is_addressable() {
        let mut b = MeshBuilder::new(MeshBufferConfig::new(MAX_VERTICES, 3)).unwrap();
        let mut last = 0;
        for _ in 0..MAX_VERTICES {
            last = b.start_vertex().unwrap();
            b.add_position(0.0, 0.0, 0.0);
        }
        assert_eq!(last, u16::MAX);
        assert!(matches!(
            b.start_vertex(),
            Err(MeshError::CapacityExceeded { .. })
        ));
    }

    // ── layout checks ─────────────────────────────────────────────────────

    #[test]
    fn missing_slot_is_reported_at_next_vertex() {
        let config = MeshBufferConfig::new(2, 3).with_mask(AttributeMask::TEX_COORD0);
        let mut b = MeshBuilder::new(config).unwrap();
        b.start_vertex().unwrap();
        b.add_position(0.0, 0.0, 0.0);

        assert_eq!(
            b.start_vertex(),
            Err(MeshError::LayoutMismatch {
                vertex: 0,
                written: 12,
                stride: 20
            })
        );
    }

    #[test]
    fn extra_slot_is_reported_at_finalize() {
        let mut b = MeshBuilder::new(MeshBufferConfig::new(1, 3)).unwrap();
        b.start_vertex().unwrap();
        b.add_position(0.0, 0.0, 0.0).add_normal(0.0, 1.0, 0.0);

        let err = b.finalize(None).unwrap_err();
        assert!(matches!(
            err.error(),
            MeshError::LayoutMismatch { written: 24, stride: 12, .. }
        ));
        assert_eq!(err.into_builder().vertex_count(), 1);
    }

    #[test]
    fn write_before_first_vertex_is_reported() {
        let mut b = MeshBuilder::new(MeshBufferConfig::new(1, 3)).unwrap();
        b.add_position(0.0, 0.0, 0.0);
        assert!(matches!(
            b.start_vertex(),
            Err(MeshError::LayoutMismatch { vertex: 0, .. })
        ));
    }

    // ── reuse ─────────────────────────────────────────────────────────────

    #[test]
    fn reuse_leaves_no_residue_and_keeps_capacity() {
        let config = MeshBufferConfig::new(4, 6).with_mask(AttributeMask::COLOUR);
        let mut b = MeshBuilder::new(config).unwrap();
        for i in 0..4 {
            b.start_vertex().unwrap();
            b.add_position(i as f32, 0.0, 0.0).add_colour(9, 9, 9, 9);
        }
        b.add_indices3(0, 1, 2).unwrap();
        b.add_indices3(2, 3, 0).unwrap();
        let first = b.finalize(None).unwrap();
        let vcap = first.vertex_storage().capacity();
        let icap = first.index_storage().capacity();

        let mut b = MeshBuilder::reuse(first);
        assert_eq!(b.vertex_count(), 0);
        assert!(b.is_empty());
        b.start_vertex().unwrap();
        b.add_position(7.0, 7.0, 7.0).add_colour(1, 2, 3, 4);
        b.add_indices3(0, 0, 0).unwrap();
        let second = b.finalize(None).unwrap();

        assert_eq!(second.vertex_count(), 1);
        assert_eq!(second.index_count(), 3);
        assert_eq!(second.vertex_bytes().len(), 16);
        assert_eq!(second.index_bytes().len(), 6);
        assert_eq!(&second.vertex_bytes()[12..], &[1, 2, 3, 4]);
        assert_eq!(second.vertex_storage().capacity(), vcap);
        assert_eq!(second.index_storage().capacity(), icap);
    }

    #[test]
    fn abandoned_pass_can_be_reused() {
        let mut b = MeshBuilder::new(MeshBufferConfig::new(2, 3)).unwrap();
        b.start_vertex().unwrap();
        b.add_position(1.0, 1.0, 1.0);
        let partial = b.abandon();
        assert_eq!(partial.vertex_bytes().len(), 12);

        let b = MeshBuilder::reuse(partial);
        let buf = b.finalize(None).unwrap();
        assert!(buf.vertex_bytes().is_empty());
        assert_eq!(buf.vertex_count(), 0);
    }

    // ── upload ────────────────────────────────────────────────────────────

    #[test]
    fn finalize_with_device_uploads_exact_bytes() {
        let mut dev = HostDevice::new();
        let mut b = MeshBuilder::new(MeshBufferConfig::new(1, 3)).unwrap();
        b.start_vertex().unwrap();
        b.add_position(1.0, 2.0, 3.0);
        b.add_indices3(0, 0, 0).unwrap();

        let mut buf = b.finalize(Some(&mut dev)).unwrap();
        let handles = buf.device_buffers().unwrap();
        assert_eq!(dev.bytes(handles.vertex), Some(buf.vertex_bytes()));
        assert_eq!(dev.bytes(handles.index), Some(buf.index_bytes()));

        buf.destroy(&mut dev);
        assert_eq!(dev.live_buffers(), 0);
    }

    #[test]
    fn upload_failure_propagates_from_finalize() {
        let mut dev = HostDevice::with_max_buffer_size(8);
        let mut b = MeshBuilder::new(MeshBufferConfig::new(1, 3)).unwrap();
        b.start_vertex().unwrap();
        b.add_position(1.0, 2.0, 3.0);

        let err = b.finalize(Some(&mut dev)).unwrap_err();
        assert!(matches!(err.error(), MeshError::DeviceUpload(_)));
        assert_eq!(dev.live_buffers(), 0);
    }

    fn uploaded_triangle(dev: &mut HostDevice) -> MeshBuffer {
        let mut b = MeshBuilder::new(MeshBufferConfig::new(3, 6)).unwrap();
        b.start_vertex().unwrap();
        b.add_position(0.0, 0.0, 0.0);
        b.add_indices3(0, 0, 0).unwrap();
        b.finalize(Some(dev)).unwrap()
    }

    #[test]
    fn reuse_without_device_drops_old_handles_from_view() {
        let mut dev = HostDevice::new();
        let first = uploaded_triangle(&mut dev);
        assert!(first.is_uploaded());

        let mut b = MeshBuilder::reuse(first);
        for x in [0.0, 1.0, 2.0] {
            b.start_vertex().unwrap();
            b.add_position(x, 0.0, 0.0);
        }
        b.add_indices3(0, 1, 2).unwrap();
        b.add_indices3(2, 1, 0).unwrap();
        let mut second = b.finalize(None).unwrap();

        assert_eq!(second.vertex_count(), 3);
        assert_eq!(second.index_count(), 6);
        assert!(!second.is_uploaded());
        assert!(second.device_buffers().is_none());
        assert!(second.has_stale_device_buffers());

        second.destroy(&mut dev);
        assert_eq!(dev.live_buffers(), 0);
    }

    #[test]
    fn reuse_with_device_replaces_old_handles() {
        let mut dev = HostDevice::new();
        let first = uploaded_triangle(&mut dev);
        let old = first.device_buffers().unwrap();

        let mut b = MeshBuilder::reuse(first);
        for x in [0.0, 1.0, 2.0] {
            b.start_vertex().unwrap();
            b.add_position(x, 0.0, 0.0);
        }
        b.add_indices3(0, 1, 2).unwrap();
        let mut second = b.finalize(Some(&mut dev)).unwrap();

        let handles = second.device_buffers().unwrap();
        assert_ne!(handles, old);
        assert_eq!(dev.live_buffers(), 2);
        assert!(dev.bytes(old.vertex).is_none());
        assert_eq!(dev.bytes(handles.vertex), Some(second.vertex_bytes()));
        assert_eq!(dev.bytes(handles.index), Some(second.index_bytes()));

        second.destroy(&mut dev);
        assert_eq!(dev.live_buffers(), 0);
    }

    #[test]
    fn failed_finalize_hands_back_held_handles() {
        let mut dev = HostDevice::new();
        let first = uploaded_triangle(&mut dev);

        let mut b = MeshBuilder::reuse(first);
        b.start_vertex().unwrap();
        b.add_position(0.0, 0.0, 0.0).add_normal(0.0, 0.0, 1.0);
        let err = b.finalize(None).unwrap_err();
        assert!(matches!(err.error(), MeshError::LayoutMismatch { .. }));
        assert_eq!(dev.live_buffers(), 2);

        let mut buf = err.into_builder().abandon();
        buf.destroy(&mut dev);
        assert_eq!(dev.live_buffers(), 0);
    }
}
