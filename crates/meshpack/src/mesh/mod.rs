//! Interleaved mesh buffer packing.
//!
//! A [`MeshBuffer`] owns tightly packed vertex records and a 16-bit index
//! stream; a [`MeshBuilder`] fills it in one pass.
//!
//! Record layout is a pure function of the [`AttributeMask`] and the optional
//! custom [`AttributeDescriptor`]:
//!
//! | Slot        | Size      | Present          |
//! |-------------|-----------|------------------|
//! | `Position`  | 3 x f32   | always, first    |
//! | `Normal`    | 3 x f32   | `NORMAL`         |
//! | `Colour`    | 4 x u8    | `COLOUR`         |
//! | `TexCoord0` | 2 x f32   | `TEX_COORD0`     |
//! | `Custom0`   | N x f32   | `CUSTOM0`        |
//!
//! All multi-byte values are little-endian.

mod buffer;
mod builder;
mod bytes;
mod error;
mod slot;

pub mod shapes;

pub use buffer::{DeviceBuffers, MeshBuffer, MeshBufferConfig, INDEX_SIZE, MAX_VERTICES};
pub use builder::{FinalizeError, MeshBuilder};
pub use bytes::ByteBuffer;
pub use error::MeshError;
pub use slot::{AttributeDescriptor, AttributeMask, AttributeSlot, Topology};
