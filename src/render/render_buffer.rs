use color_eyre::Result;
use color_eyre::eyre::ensure;
use log::debug;
use wgpu::util::DeviceExt;

use super::geometry::Mesh;

/// Vertex and index buffers of one mesh, written once at creation and only
/// read by draw calls afterwards.
pub struct RenderBuffer {
    vertices: wgpu::Buffer,
    indices: wgpu::Buffer,
    num_indices: u32,
}

impl RenderBuffer {
    /// Fails before any upload if either buffer would exceed the device limit.
    pub fn new(device: &wgpu::Device, mesh: &Mesh) -> Result<Self> {
        Self::check_limits(mesh, &device.limits())?;

        let vertices = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("sphere vertex buffer"),
            contents: mesh.vertex_data(),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let indices = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("sphere index buffer"),
            contents: mesh.index_data(),
            usage: wgpu::BufferUsages::INDEX,
        });

        debug!(
            "uploaded {} vertices ({} bytes) and {} indices ({} bytes)",
            mesh.vertex_count(),
            mesh.vertex_data().len(),
            mesh.index_count(),
            mesh.index_data().len()
        );

        Ok(Self {
            vertices,
            indices,
            num_indices: mesh.index_count() as u32,
        })
    }

    pub fn check_limits(mesh: &Mesh, limits: &wgpu::Limits) -> Result<()> {
        Self::check_buffer_size("vertex", mesh.vertex_data().len() as u64, limits)?;
        Self::check_buffer_size("index", mesh.index_data().len() as u64, limits)
    }

    fn check_buffer_size(kind: &str, bytes: u64, limits: &wgpu::Limits) -> Result<()> {
        ensure!(
            bytes <= limits.max_buffer_size,
            "sphere {kind} buffer needs {bytes} bytes, the device allows at most {}",
            limits.max_buffer_size
        );

        Ok(())
    }

    pub fn draw<'a>(&self, render_pass: &mut wgpu::RenderPass<'a>) {
        render_pass.set_vertex_buffer(0, self.vertices.slice(..));
        render_pass.set_index_buffer(self.indices.slice(..), wgpu::IndexFormat::Uint32);
        render_pass.draw_indexed(0..self.num_indices, 0, 0..1);
    }
}
