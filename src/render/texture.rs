use wgpu::TextureView;

use crate::common::data::Size;

pub struct Texture {
    view: TextureView,
    size: wgpu::Extent3d,
}

impl Texture {
    pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

    pub fn get_view(&self) -> &TextureView {
        &self.view
    }

    pub fn get_size(&self) -> Size<u32> {
        (self.size.width, self.size.height).into()
    }

    pub fn create_depth_texture(
        device: &wgpu::Device,
        target_size: Size<u32>,
        label: &str,
    ) -> Self {
        let size = wgpu::Extent3d {
            width: target_size.width.max(1),
            height: target_size.height.max(1),
            depth_or_array_layers: 1,
        };
        let desc = wgpu::TextureDescriptor {
            label: Some(label),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: Self::DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        };
        let texture = device.create_texture(&desc);

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        Self { view, size }
    }
}
