use std::sync::Arc;

use color_eyre::eyre::WrapErr;
use color_eyre::{Report, Result};
use log::{debug, info};
use winit::{
    application::ApplicationHandler,
    dpi::LogicalSize,
    event::{ElementState, KeyEvent, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowAttributes, WindowId},
};

use crate::{
    common::settings::{Settings, WindowSettings},
    render::{
        geometry::{Mesh, generate_sphere},
        render_engine::RenderEngine,
    },
};

/// Process exit status for a failed startup, -1 as seen by the shell. Covers
/// windowing and graphics setup as well as settings that fail to load.
pub const INIT_FAILURE_EXIT_CODE: u8 = 255;

pub fn window_attributes(settings: &WindowSettings) -> WindowAttributes {
    Window::default_attributes()
        .with_title(settings.title.clone())
        .with_inner_size(LogicalSize::new(
            settings.width as f64,
            settings.height as f64,
        ))
}

fn is_close_request(event: &WindowEvent) -> bool {
    matches!(
        event,
        WindowEvent::CloseRequested
            | WindowEvent::KeyboardInput {
                event: KeyEvent {
                    physical_key: PhysicalKey::Code(KeyCode::Escape),
                    state: ElementState::Pressed,
                    ..
                },
                ..
            }
    )
}

struct Application {
    engine: Option<RenderEngine>,
    settings: Settings,
    mesh: Mesh,
    surface_configured: bool,
    failure: Option<Report>,
}

impl Application {
    fn new(settings: Settings, mesh: Mesh) -> Self {
        Self {
            engine: None,
            settings,
            mesh,
            surface_configured: false,
            failure: None,
        }
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, err: Report) {
        self.failure = Some(err);
        event_loop.exit();
    }

    fn initialize(&self, event_loop: &ActiveEventLoop) -> Result<RenderEngine> {
        let window = Arc::new(
            event_loop
                .create_window(window_attributes(&self.settings.window))
                .wrap_err("failed to create the window")?,
        );

        pollster::block_on(RenderEngine::new(window, &self.settings, &self.mesh))
            .wrap_err("failed to initialize graphics")
    }
}

impl ApplicationHandler for Application {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.engine.is_some() {
            return;
        }

        match self.initialize(event_loop) {
            Ok(mut engine) => {
                self.surface_configured = engine.resize(engine.size());
                engine.window().request_redraw();
                self.engine = Some(engine);
            }
            Err(err) => self.fail(event_loop, err),
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        let Some(engine) = &mut self.engine else {
            return;
        };

        if is_close_request(&event) {
            event_loop.exit();
            return;
        }

        match event {
            WindowEvent::Resized(physical_size) => {
                self.surface_configured = engine.resize(physical_size);
                // On macos the window needs to be redrawn manually after resizing
                engine.window().request_redraw();
            }
            WindowEvent::RedrawRequested => {
                engine.window().request_redraw();

                if !self.surface_configured {
                    return;
                }

                engine.update();
                match engine.render() {
                    Ok(_) => {}
                    // Reconfigure the surface if it's lost or outdated
                    Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                        self.surface_configured = engine.resize(engine.size());
                    }
                    // The system is out of memory, we should probably quit
                    Err(wgpu::SurfaceError::OutOfMemory | wgpu::SurfaceError::Other) => {
                        log::error!("OutOfMemory");
                        event_loop.exit()
                    }
                    // This happens when the a frame takes too long to present
                    Err(wgpu::SurfaceError::Timeout) => {
                        log::warn!("Surface timeout")
                    }
                }
            }
            _ => {}
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(engine) = self.engine.take() {
            debug!(
                "releasing GPU resources after {:.2} rad of rotation",
                engine.rotation().angle()
            );
        }
    }
}

/// Generates the sphere, opens the window and renders until it is closed.
///
/// Fails on mesh parameters rejected by [`generate_sphere`], a mesh larger
/// than the device's buffer limit, and any window or graphics setup error.
pub fn run_app(settings: Settings) -> Result<()> {
    let mesh = generate_sphere(&settings.sphere.into())?;
    info!(
        "generated sphere: {} vertices, {} indices",
        mesh.vertex_count(),
        mesh.index_count()
    );

    let event_loop = EventLoop::new().wrap_err("failed to initialize the windowing system")?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = Application::new(settings, mesh);
    event_loop.run_app(&mut app)?;

    match app.failure {
        Some(err) => Err(err),
        None => Ok(()),
    }
}
