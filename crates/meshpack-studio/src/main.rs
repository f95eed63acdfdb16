use anyhow::{Context, Result};
use meshpack::device::{DeviceUpload, Gpu, GpuInit, HostDevice, WgpuDevice};
use meshpack::logging::{init_logging, LoggingConfig};
use meshpack::mesh::{
    shapes, AttributeDescriptor, AttributeMask, AttributeSlot, MeshBuffer, MeshBufferConfig,
    MeshBuilder, MeshError, Topology,
};
use meshpack::render::MeshLayout;

fn main() -> Result<()> {
    init_logging(LoggingConfig::default());

    println!();
    println!("  ╔════════════════════════════════════════╗");
    println!("  ║          MESHPACK STUDIO v0.1          ║");
    println!("  ║   interleaved buffers  ·  wgpu upload  ║");
    println!("  ╚════════════════════════════════════════╝");
    println!();

    match pollster::block_on(Gpu::new(GpuInit::default())) {
        Ok(gpu) => {
            println!("  Device   >  {}", gpu.adapter_info().name);
            let mut device = WgpuDevice::new(gpu.device());
            run(&mut device)
        }
        Err(err) => {
            log::warn!("no GPU available ({err:#}); uploading to host memory instead");
            println!("  Device   >  host memory");
            let mut device = HostDevice::new();
            run(&mut device)
        }
    }
}

fn run(device: &mut dyn DeviceUpload) -> Result<()> {
    let cube = shapes::cube([0.5; 3], Some(&mut *device)).context("building cube")?;
    let sprite = shapes::sprite_quad(Some(&mut *device)).context("building sprite")?;
    let ribbon = ribbon(Some(&mut *device)).context("building ribbon")?;

    let mut meshes = vec![("cube", cube), ("sprite", sprite), ("ribbon", ribbon)];
    for (name, mesh) in &meshes {
        report(name, mesh)?;
    }

    // Repack the cube's storage as a single triangle.
    let (_, cube) = meshes.remove(0);
    let reserved = cube.vertex_storage().capacity();
    let mut b = MeshBuilder::reuse(cube);
    for (x, y) in [(0.0, 0.0), (1.0, 0.0), (0.0, 1.0)] {
        b.start_vertex()?;
        b.add_position(x, y, 0.0);
    }
    b.add_indices3(0, 1, 2)?;
    let triangle = b.finalize(Some(&mut *device)).context("repacking cube storage")?;
    println!(
        "  Reuse    >  {} bytes packed into {} reserved (was {})",
        triangle.vertex_bytes().len(),
        triangle.vertex_storage().capacity(),
        reserved
    );
    println!();
    meshes.push(("triangle", triangle));

    for (_, mesh) in &mut meshes {
        mesh.destroy(device);
    }
    Ok(())
}

const RIBBON_SEGMENTS: u16 = 3;

/// Lit, coloured strip with a one-component sway weight per vertex.
fn ribbon(device: Option<&mut dyn DeviceUpload>) -> Result<MeshBuffer, MeshError> {
    let segments = RIBBON_SEGMENTS;
    let vertices = usize::from(segments + 1) * 2;
    let config = MeshBufferConfig::new(vertices, vertices)
        .with_topology(Topology::Strip)
        .with_mask(AttributeMask::NORMAL | AttributeMask::COLOUR | AttributeMask::TEX_COORD0)
        .with_custom_attribute(AttributeDescriptor::new("sway", 1));
    let mut b = MeshBuilder::new(config)?;

    let mut strip = Vec::with_capacity(vertices);
    for s in 0..=segments {
        let t = f32::from(s) / f32::from(segments);
        let shade = (t * 255.0) as u8;
        for side in [0.0f32, 1.0] {
            strip.push(b.start_vertex()?);
            b.add_position(t * 4.0 - 2.0, side - 0.5, 0.0)
                .add_normal(0.0, 0.0, 1.0)
                .add_colour(shade, 128, 255 - shade, 255)
                .add_tex_coord(t, side)
                .add_attr(&[side * t]);
        }
    }
    // An odd segment count keeps the vertex count a multiple of four.
    for quad in strip.chunks_exact(4) {
        b.add_indices4(quad[0], quad[1], quad[2], quad[3])?;
    }

    Ok(b.finalize(device)?)
}

fn report(name: &str, mesh: &MeshBuffer) -> Result<()> {
    let layout = MeshLayout::new(mesh)?;

    println!("  [{name}]  {:?}", mesh.topology());
    println!(
        "    vertices {:>3} / {:<3}  indices {:>3} / {:<3}  stride {} bytes",
        mesh.vertex_count(),
        mesh.vertex_capacity(),
        mesh.index_count(),
        mesh.index_capacity(),
        mesh.stride()
    );
    for slot in std::iter::once(AttributeSlot::Position).chain(AttributeSlot::OPTIONAL) {
        if !mesh.mask().enables(slot) {
            continue;
        }
        println!(
            "    {:<10} offset {:>2}  size {:>2}",
            format!("{slot:?}"),
            mesh.offset_of(slot)?,
            mesh.size_of(slot)?
        );
    }
    if let Some(handles) = mesh.device_buffers() {
        println!(
            "    device   vertex #{}  index #{}  ({} attributes bound)",
            handles.vertex.raw(),
            handles.index.raw(),
            layout.attributes().len()
        );
    }
    println!();
    Ok(())
}
