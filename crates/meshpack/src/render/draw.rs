use crate::device::WgpuDevice;
use crate::mesh::{MeshBuffer, MeshError, INDEX_SIZE};

use super::layout::INDEX_FORMAT;

/// Binds an uploaded mesh to vertex slot 0 and draws all of its indices.
///
/// The pipeline set on `rpass` must have been built from this mesh's
/// [`MeshLayout`](super::MeshLayout).
pub fn draw_mesh(
    rpass: &mut wgpu::RenderPass<'_>,
    mesh: &MeshBuffer,
    device: &WgpuDevice<'_>,
) -> Result<(), MeshError> {
    let handles = mesh
        .device_buffers()
        .ok_or_else(|| MeshError::Configuration("mesh has not been uploaded".into()))?;

    let (Some(vbo), Some(ibo)) = (device.buffer(handles.vertex), device.buffer(handles.index))
    else {
        return Err(MeshError::Configuration(format!(
            "device buffers {} / {} are no longer live",
            handles.vertex.raw(),
            handles.index.raw()
        )));
    };

    check_sizes(mesh, vbo.size(), ibo.size())?;

    if mesh.index_count() == 0 {
        return Ok(());
    }

    rpass.set_vertex_buffer(0, vbo.slice(..));
    rpass.set_index_buffer(ibo.slice(..), INDEX_FORMAT);
    rpass.draw_indexed(0..mesh.index_count() as u32, 0, 0..1);
    Ok(())
}

/// Rejects device buffers smaller than the mesh's current contents.
fn check_sizes(mesh: &MeshBuffer, vertex_size: u64, index_size: u64) -> Result<(), MeshError> {
    let vertex_needed = (mesh.vertex_count() * mesh.stride()) as u64;
    let index_needed = (mesh.index_count() * INDEX_SIZE) as u64;
    if vertex_size < vertex_needed || index_size < index_needed {
        return Err(MeshError::Configuration(format!(
            "device buffers hold {vertex_size} / {index_size} bytes, mesh needs \
             {vertex_needed} / {index_needed}"
        )));
    }
    Ok(())
}
