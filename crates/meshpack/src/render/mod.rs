//! Draw/bind boundary.
//!
//! Translates a finalized [`MeshBuffer`](crate::mesh::MeshBuffer) into the wgpu
//! descriptions a pipeline needs, and binds uploaded buffers for a draw.
//!
//! Convention:
//! - one interleaved vertex buffer in slot 0, stepped per vertex
//! - shader locations follow record order (position = 0 ... custom0 = 4)
//! - indices are always `Uint16`

mod draw;
mod layout;

pub use draw::draw_mesh;
pub use layout::{MeshLayout, INDEX_FORMAT};
