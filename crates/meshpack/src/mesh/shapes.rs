//! Canned meshes built through [`MeshBuilder`].

use crate::device::DeviceUpload;

use super::{AttributeMask, MeshBuffer, MeshBufferConfig, MeshBuilder, MeshError};

/// Axis-aligned box centred on the origin, positions only.
///
/// 8 shared corners, 12 triangles.
pub fn cube(
    half_extents: [f32; 3],
    device: Option<&mut dyn DeviceUpload>,
) -> Result<MeshBuffer, MeshError> {
    let [hx, hy, hz] = half_extents;
    let mut b = MeshBuilder::new(MeshBufferConfig::new(8, 36))?;

    //   7----6
    //  /|   /|
    // 4----5 |
    // | |  | |
    // | 3--|-2
    // |/   |/
    // 0----1
    let corners = [
        [-hx, -hy, -hz],
        [hx, -hy, -hz],
        [hx, hy, -hz],
        [-hx, hy, -hz],
        [-hx, -hy, hz],
        [hx, -hy, hz],
        [hx, hy, hz],
        [-hx, hy, hz],
    ];

    let mut i = [0u16; 8];
    for (slot, [x, y, z]) in i.iter_mut().zip(corners) {
        *slot = b.start_vertex()?;
        b.add_position(x, y, z);
    }

    let faces = [
        [0, 1, 5, 4],
        [1, 2, 6, 5],
        [6, 2, 3, 7],
        [3, 0, 4, 7],
        [4, 5, 6, 7],
        [0, 3, 2, 1],
    ];
    for [a, c, d, e] in faces {
        b.add_indices3(i[a], i[c], i[d])?;
        b.add_indices3(i[d], i[e], i[a])?;
    }

    Ok(b.finalize(device)?)
}

/// Unit quad in the XY plane with texture coordinates, two triangles.
pub fn sprite_quad(device: Option<&mut dyn DeviceUpload>) -> Result<MeshBuffer, MeshError> {
    let config = MeshBufferConfig::new(4, 6).with_mask(AttributeMask::TEX_COORD0);
    let mut b = MeshBuilder::new(config)?;

    let i0 = b.start_vertex()?;
    b.add_position(-0.5, -0.5, 0.0).add_tex_coord(0.0, 0.0);

    let i1 = b.start_vertex()?;
    b.add_position(0.5, -0.5, 0.0).add_tex_coord(1.0, 0.0);

    let i2 = b.start_vertex()?;
    b.add_position(0.5, 0.5, 0.0).add_tex_coord(1.0, 1.0);

    let i3 = b.start_vertex()?;
    b.add_position(-0.5, 0.5, 0.0).add_tex_coord(0.0, 1.0);

    b.add_indices3(i0, i1, i2)?;
    b.add_indices3(i2, i3, i0)?;

    Ok(b.finalize(device)?)
}
