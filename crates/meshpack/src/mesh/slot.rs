use bitflags::bitflags;

use super::error::MeshError;

/// Attribute channel inside one vertex record.
///
/// Variants are declared in record order. `Position` is always present and
/// always first; the rest are selected by an [`AttributeMask`].
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum AttributeSlot {
    /// 3 x f32.
    Position,
    /// 3 x f32.
    Normal,
    /// 4 x u8 (r, g, b, a).
    Colour,
    /// 2 x f32.
    TexCoord0,
    /// N x f32, N taken from the registered [`AttributeDescriptor`].
    Custom0,
}

impl AttributeSlot {
    /// Optional slots in record order (everything after `Position`).
    pub const OPTIONAL: [AttributeSlot; 4] = [
        AttributeSlot::Normal,
        AttributeSlot::Colour,
        AttributeSlot::TexCoord0,
        AttributeSlot::Custom0,
    ];

    /// Mask bit controlling this slot. `Position` has none.
    #[inline]
    pub fn mask_bit(self) -> AttributeMask {
        match self {
            AttributeSlot::Position => AttributeMask::empty(),
            AttributeSlot::Normal => AttributeMask::NORMAL,
            AttributeSlot::Colour => AttributeMask::COLOUR,
            AttributeSlot::TexCoord0 => AttributeMask::TEX_COORD0,
            AttributeSlot::Custom0 => AttributeMask::CUSTOM0,
        }
    }

    /// Fixed byte size of the slot, or `None` for `Custom0` whose size
    /// depends on the registered descriptor.
    #[inline]
    pub const fn fixed_size(self) -> Option<usize> {
        match self {
            AttributeSlot::Position => Some(3 * 4),
            AttributeSlot::Normal => Some(3 * 4),
            AttributeSlot::Colour => Some(4),
            AttributeSlot::TexCoord0 => Some(2 * 4),
            AttributeSlot::Custom0 => None,
        }
    }

    /// Shader location used by the bind boundary.
    #[inline]
    pub const fn shader_location(self) -> u32 {
        match self {
            AttributeSlot::Position => 0,
            AttributeSlot::Normal => 1,
            AttributeSlot::Colour => 2,
            AttributeSlot::TexCoord0 => 3,
            AttributeSlot::Custom0 => 4,
        }
    }
}

bitflags! {
    /// Selects the optional slots present in a vertex record.
    ///
    /// Bit values match the historical `BUF_*` constants so masks can be
    /// stored or exchanged as plain integers.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct AttributeMask: u8 {
        const NORMAL = 1 << 0;
        const COLOUR = 1 << 1;
        const TEX_COORD0 = 1 << 2;
        const CUSTOM0 = 1 << 3;
    }
}

impl AttributeMask {
    /// Returns true if `slot` is part of a record with this mask.
    #[inline]
    pub fn enables(self, slot: AttributeSlot) -> bool {
        match slot {
            AttributeSlot::Position => true,
            other => self.contains(other.mask_bit()),
        }
    }

    /// Parses raw bits, rejecting any bit outside the known slots.
    pub fn from_bits_checked(bits: u8) -> Result<Self, MeshError> {
        Self::from_bits(bits).ok_or_else(|| {
            MeshError::InvalidArgument(format!(
                "attribute mask {bits:#04x} has unknown bits"
            ))
        })
    }
}

/// Shape of the custom attribute slot (`Custom0`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AttributeDescriptor {
    pub name: String,
    /// Number of f32 components per vertex.
    pub component_count: usize,
}

impl AttributeDescriptor {
    pub fn new(name: impl Into<String>, component_count: usize) -> Self {
        Self {
            name: name.into(),
            component_count,
        }
    }

    /// Bytes occupied per vertex.
    #[inline]
    pub fn byte_size(&self) -> usize {
        4 * self.component_count
    }
}

/// Draw-primitive hint. Carried, never interpreted by the packer.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub enum Topology {
    #[default]
    Polygons,
    Strip,
}
