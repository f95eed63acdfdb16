//! Meshpack crate.
//!
//! Packs per-vertex attributes into interleaved little-endian vertex records
//! plus a 16-bit index stream, and hands the result to a device upload
//! boundary and a wgpu bind/draw boundary.
//!
//! # Structure
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`mesh`] | `MeshBuffer`, `MeshBuilder`, layout types, canned shapes |
//! | [`device`] | `DeviceUpload`, `HostDevice`, `WgpuDevice`, headless `Gpu` |
//! | [`render`] | `MeshLayout`, `draw_mesh` |
//! | [`logging`] | `init_logging` |
//!
//! # Quick start
//!
//! ```rust
//! use meshpack::mesh::{AttributeMask, MeshBufferConfig, MeshBuilder};
//!
//! let config = MeshBufferConfig::new(3, 3).with_mask(AttributeMask::COLOUR);
//! let mut b = MeshBuilder::new(config).unwrap();
//! for (x, y) in [(0.0, 0.0), (1.0, 0.0), (0.0, 1.0)] {
//!     b.start_vertex().unwrap();
//!     b.add_position(x, y, 0.0).add_colour(255, 0, 0, 255);
//! }
//! b.add_indices3(0, 1, 2).unwrap();
//!
//! let mesh = b.finalize(None).unwrap();
//! assert_eq!(mesh.stride(), 16);
//! assert_eq!(mesh.index_count(), 3);
//! ```

pub mod device;
pub mod logging;
pub mod mesh;
pub mod render;
