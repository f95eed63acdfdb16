use crate::mesh::{AttributeSlot, MeshBuffer, MeshError, Topology};

/// Index format of every packed mesh.
pub const INDEX_FORMAT: wgpu::IndexFormat = wgpu::IndexFormat::Uint16;

/// wgpu view of a mesh buffer's record layout.
///
/// Built from the same offset function used while packing, so binding can
/// never disagree with what the builder wrote.
#[derive(Debug, Clone, PartialEq)]
pub struct MeshLayout {
    array_stride: u64,
    attributes: Vec<wgpu::VertexAttribute>,
    topology: Topology,
}

impl MeshLayout {
    pub fn new(buffer: &MeshBuffer) -> Result<Self, MeshError> {
        let slots = std::iter::once(AttributeSlot::Position).chain(AttributeSlot::OPTIONAL);

        let mut attributes = Vec::new();
        for slot in slots.filter(|s| buffer.mask().enables(*s)) {
            attributes.push(wgpu::VertexAttribute {
                format: vertex_format(buffer, slot)?,
                offset: buffer.offset_of(slot)? as u64,
                shader_location: slot.shader_location(),
            });
        }

        Ok(Self {
            array_stride: buffer.stride() as u64,
            attributes,
            topology: buffer.topology(),
        })
    }

    #[inline]
    pub fn array_stride(&self) -> u64 {
        self.array_stride
    }

    #[inline]
    pub fn attributes(&self) -> &[wgpu::VertexAttribute] {
        &self.attributes
    }

    pub fn vertex_buffer_layout(&self) -> wgpu::VertexBufferLayout<'_> {
        wgpu::VertexBufferLayout {
            array_stride: self.array_stride,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &self.attributes,
        }
    }

    pub fn primitive_topology(&self) -> wgpu::PrimitiveTopology {
        match self.topology {
            Topology::Polygons => wgpu::PrimitiveTopology::TriangleList,
            Topology::Strip => wgpu::PrimitiveTopology::TriangleStrip,
        }
    }

    /// Primitive state for a pipeline drawing this mesh.
    pub fn primitive_state(&self) -> wgpu::PrimitiveState {
        let strip_index_format = match self.topology {
            Topology::Strip => Some(INDEX_FORMAT),
            Topology::Polygons => None,
        };
        wgpu::PrimitiveState {
            topology: self.primitive_topology(),
            strip_index_format,
            ..Default::default()
        }
    }
}

fn vertex_format(
    buffer: &MeshBuffer,
    slot: AttributeSlot,
) -> Result<wgpu::VertexFormat, MeshError> {
    Ok(match slot {
        AttributeSlot::Position | AttributeSlot::Normal => wgpu::VertexFormat::Float32x3,
        AttributeSlot::Colour => wgpu::VertexFormat::Unorm8x4,
        AttributeSlot::TexCoord0 => wgpu::VertexFormat::Float32x2,
        AttributeSlot::Custom0 => match buffer.size_of(slot)? / 4 {
            1 => wgpu::VertexFormat::Float32,
            2 => wgpu::VertexFormat::Float32x2,
            3 => wgpu::VertexFormat::Float32x3,
            4 => wgpu::VertexFormat::Float32x4,
            n => {
                return Err(MeshError::Configuration(format!(
                    "custom attribute with {n} components has no vertex format"
                )));
            }
        },
    })
}
