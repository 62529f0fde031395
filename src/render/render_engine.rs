use std::iter;
use std::sync::Arc;
use std::time::{Duration, Instant};

use color_eyre::Result;
use color_eyre::eyre::{OptionExt, WrapErr};
use glam::Vec3;
use log::{debug, info};
use winit::{dpi::PhysicalSize, window::Window};

use crate::common::{data::Size, settings::Settings};

use super::{
    camera::Camera, data::Uniforms, geometry::Mesh, pipeline::Pipeline,
    render_buffer::RenderBuffer, shader::ShaderProgram, texture::Texture,
};

/// Model rotation about +Y, advanced by a fixed step every frame.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Rotation {
    angle: f32,
    step: f32,
}

impl Rotation {
    pub fn new(step: f32) -> Self {
        Self { angle: 0.0, step }
    }

    pub fn advance(&mut self) -> f32 {
        self.angle += self.step;
        self.angle
    }

    pub fn angle(&self) -> f32 {
        self.angle
    }
}

#[derive(Copy, Clone, Debug)]
pub struct FrameStats {
    since: Instant,
    frames: u32,
}

impl FrameStats {
    const PERIOD: Duration = Duration::from_secs(1);

    pub fn new(now: Instant) -> Self {
        Self {
            since: now,
            frames: 0,
        }
    }

    /// Counts a frame, returns frames per second once a full period elapsed.
    pub fn tick(&mut self, now: Instant) -> Option<f32> {
        self.frames += 1;
        let elapsed = now.saturating_duration_since(self.since);
        if elapsed < Self::PERIOD {
            return None;
        }

        let fps = self.frames as f32 / elapsed.as_secs_f32();
        *self = Self::new(now);
        Some(fps)
    }
}

/// Owns every GPU object of the scene. Dropping it releases them.
pub struct RenderEngine {
    window: Arc<Window>,
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    size: PhysicalSize<u32>,
    pipeline: Pipeline,
    render_buffer: RenderBuffer,
    depth_texture: Texture,
    camera: Camera,
    light_direction: Vec3,
    clear_color: wgpu::Color,
    rotation: Rotation,
    frame_stats: FrameStats,
}

impl RenderEngine {
    pub async fn new(window: Arc<Window>, settings: &Settings, mesh: &Mesh) -> Result<Self> {
        let size = window.inner_size();
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY | wgpu::Backends::GL,
            ..Default::default()
        });
        let surface = instance
            .create_surface(window.clone())
            .wrap_err("failed to create a rendering surface")?;
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .wrap_err("no graphics adapter can present to the window")?;
        info!("using adapter {:?}", adapter.get_info());
        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: None,
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::downlevel_defaults(),
                memory_hints: Default::default(),
                trace: wgpu::Trace::Off,
                experimental_features: Default::default(),
            })
            .await
            .wrap_err("failed to open the graphics device")?;

        let surface_caps = surface.get_capabilities(&adapter);
        // Vertex colors are written as-is, like a framebuffer without sRGB
        // conversion, so prefer a linear surface format.
        let format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|format| !format.is_srgb())
            .or_else(|| surface_caps.formats.first().copied())
            .ok_or_eyre("surface reports no supported formats")?;

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: surface_caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![format],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let program = ShaderProgram::sphere()?;
        let pipeline = Pipeline::create_sphere_pipeline(&device, format, &program)?;
        let render_buffer = RenderBuffer::new(&device, mesh)?;
        let depth_texture = Texture::create_depth_texture(&device, size.into(), "depth_texture");

        let camera = Camera::from(settings.camera);
        let [r, g, b] = settings.lighting.clear_color;

        debug!(
            "Finished RenderEngine::new(), format {format:?}, eye {}, fov {}",
            camera.eye(),
            camera.fov_y()
        );

        Ok(Self {
            window,
            surface,
            device,
            queue,
            config,
            size,
            pipeline,
            render_buffer,
            depth_texture,
            camera,
            light_direction: settings.lighting.direction(),
            clear_color: wgpu::Color { r, g, b, a: 1.0 },
            rotation: Rotation::new(settings.animation.rotation_step),
            frame_stats: FrameStats::new(Instant::now()),
        })
    }

    pub fn window(&self) -> &Window {
        &self.window
    }

    pub fn size(&self) -> PhysicalSize<u32> {
        self.size
    }

    pub fn rotation(&self) -> Rotation {
        self.rotation
    }

    /// Returns false while the surface has no area to draw into.
    pub fn resize(&mut self, new_size: PhysicalSize<u32>) -> bool {
        let target_size: Size<u32> = new_size.into();
        if target_size.is_empty() {
            return false;
        }

        self.config.width = new_size.width;
        self.config.height = new_size.height;
        self.surface.configure(&self.device, &self.config);
        self.size = new_size;

        if self.depth_texture.get_size() != target_size {
            self.depth_texture =
                Texture::create_depth_texture(&self.device, target_size, "depth_texture");
        }
        debug!("surface configured for {}x{}", new_size.width, new_size.height);

        true
    }

    pub fn update(&mut self) {
        let angle = self.rotation.advance();
        let aspect_ratio = Size::from(self.size).aspect_ratio();
        let uniforms = Uniforms::new(&self.camera, self.light_direction, angle, aspect_ratio);

        self.queue.write_buffer(
            self.pipeline.get_uniforms(),
            0,
            bytemuck::bytes_of(&uniforms),
        );
    }

    pub fn render(&mut self) -> std::result::Result<(), wgpu::SurfaceError> {
        let output = self.surface.get_current_texture()?;
        let view = output.texture.create_view(&wgpu::TextureViewDescriptor {
            format: Some(self.config.format),
            ..Default::default()
        });

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("sphere.pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.clear_color),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: self.depth_texture.get_view(),
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });

            render_pass.set_pipeline(self.pipeline.get_pipeline());
            render_pass.set_bind_group(0, self.pipeline.get_uniform_bind_group(), &[]);
            self.render_buffer.draw(&mut render_pass);
        }

        self.queue.submit(iter::once(encoder.finish()));
        self.window.pre_present_notify();
        output.present();

        if let Some(fps) = self.frame_stats.tick(Instant::now()) {
            debug!("{fps:.1} FPS, rotation {:.2} rad", self.rotation.angle());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn rotation_advances_before_first_frame() {
        let mut rotation = Rotation::new(0.05);

        assert_relative_eq!(rotation.angle(), 0.0);
        assert_relative_eq!(rotation.advance(), 0.05);
        assert_relative_eq!(rotation.advance(), 0.1);
        assert_relative_eq!(rotation.angle(), 0.1);
    }

    #[test]
    fn frame_stats_report_once_per_period() {
        let start = Instant::now();
        let mut stats = FrameStats::new(start);

        for frame in 1..60 {
            assert_eq!(stats.tick(start + Duration::from_millis(frame * 16)), None);
        }

        let fps = stats.tick(start + Duration::from_secs(1)).unwrap();
        assert_relative_eq!(fps, 60.0);
        assert_eq!(stats.tick(start + Duration::from_millis(1100)), None);
    }
}
