use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use glam::Mat4;
use winit::application::ApplicationHandler;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowAttributes, WindowId};

use crate::camera::Camera;
use crate::color::Color;
use crate::geometry::{Geometry, GeometryError};
use crate::gpu::{GpuContext, GpuError};
use crate::input::Input;
use crate::registry::{DrawableId, DrawableRegistry};
use crate::scene_pass::{DrawCall, ScenePass};
use crate::shader::{ShaderError, ShaderProgram};

/// Errors that end a run.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("event loop failed: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),
    #[error("failed to create window: {0}")]
    Os(#[from] winit::error::OsError),
    #[error(transparent)]
    Gpu(#[from] GpuError),
    #[error(transparent)]
    Shader(#[from] ShaderError),
    #[error(transparent)]
    Geometry(#[from] GeometryError),
    #[error("surface error: {0}")]
    Surface(#[from] wgpu::SurfaceError),
}

/// Context provided during app setup.
pub struct SetupContext<'a> {
    pub gpu: &'a GpuContext,
    registry: &'a mut DrawableRegistry,
    camera: &'a mut Camera,
}

impl SetupContext<'_> {
    /// Uploads geometry and returns a handle for [`Frame::draw`].
    pub fn create_drawable(&mut self, geometry: Geometry) -> DrawableId {
        self.registry.create(self.gpu, &geometry)
    }

    /// Sets the camera the first frame starts with.
    pub fn camera(&mut self, camera: Camera) -> &mut Self {
        *self.camera = camera;
        self
    }
}

/// Context handed to the frame closure once per loop iteration.
pub struct Frame<'a> {
    pub input: &'a Input,
    pub camera: &'a mut Camera,
    /// Seconds since the loop started.
    pub time: f32,
    /// Seconds since the previous frame.
    pub dt: f32,
    aspect: f32,
    draws: &'a mut Vec<DrawCall>,
    quit: &'a mut bool,
}

impl Frame<'_> {
    /// Queues one draw; the MVP is composed from the camera as it is now.
    pub fn draw(&mut self, drawable: DrawableId, model: Mat4) {
        let mvp = self.camera.view_projection(self.aspect) * model;
        self.draws.push(DrawCall { drawable, mvp });
    }

    /// Closes the window after this frame.
    pub fn quit(&mut self) {
        *self.quit = true;
    }
}

/// Configuration for the app window.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub clear_color: Color,
    pub vertex_shader: PathBuf,
    pub fragment_shader: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            title: "Pocket Arcade".to_string(),
            width: 800,
            height: 600,
            clear_color: Color::BLACK,
            vertex_shader: PathBuf::from("Sample_GL.vert"),
            fragment_shader: PathBuf::from("Sample_GL.frag"),
        }
    }
}

impl AppConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn clear_color(mut self, color: Color) -> Self {
        self.clear_color = color;
        self
    }

    /// Paths of the vertex and fragment GLSL sources.
    pub fn shaders(mut self, vertex: impl Into<PathBuf>, fragment: impl Into<PathBuf>) -> Self {
        self.vertex_shader = vertex.into();
        self.fragment_shader = fragment.into();
        self
    }
}

/// Opens the window, runs `setup` once, then calls its frame closure until
/// the window closes or the closure quits.
///
/// # Example
/// ```ignore
/// pocket_arcade::run_with_config(AppConfig::new().title("Demo"), |ctx| {
///     let cube = ctx.create_drawable(shapes::cube()?);
///     Ok(move |frame: &mut Frame| frame.draw(cube, Mat4::IDENTITY))
/// })?;
/// ```
pub fn run_with_config<S, F>(config: AppConfig, setup: S) -> Result<(), AppError>
where
    S: FnOnce(&mut SetupContext) -> Result<F, AppError> + 'static,
    F: FnMut(&mut Frame) + 'static,
{
    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = ArcadeApp {
        state: AppState::Pending {
            config,
            setup: Some(Box::new(move |ctx: &mut SetupContext| {
                setup(ctx).map(|frame_fn| Box::new(frame_fn) as Box<dyn FnMut(&mut Frame)>)
            })),
        },
        error: None,
    };

    event_loop.run_app(&mut app)?;

    match app.error.take() {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

type SetupFn = Box<dyn FnOnce(&mut SetupContext) -> Result<Box<dyn FnMut(&mut Frame)>, AppError>>;

struct ArcadeApp {
    state: AppState,
    error: Option<AppError>,
}

enum AppState {
    Pending {
        config: AppConfig,
        setup: Option<SetupFn>,
    },
    Running(Box<Running>),
    Finished,
}

struct Running {
    window: Arc<Window>,
    gpu: GpuContext,
    scene: ScenePass,
    registry: DrawableRegistry,
    clear_color: Color,
    camera: Camera,
    input: Input,
    frame_fn: Box<dyn FnMut(&mut Frame)>,
    draws: Vec<DrawCall>,
    start_time: Instant,
    last_frame: Instant,
}

impl ArcadeApp {
    /// Parks the error for `run_with_config` and stops the loop.
    fn fail(&mut self, event_loop: &ActiveEventLoop, err: AppError) {
        log::error!("{err}");
        self.error = Some(err);
        self.state = AppState::Finished;
        event_loop.exit();
    }
}

fn start(
    event_loop: &ActiveEventLoop,
    config: &AppConfig,
    setup: SetupFn,
) -> Result<Running, AppError> {
    let window_attrs = WindowAttributes::default()
        .with_title(&config.title)
        .with_inner_size(winit::dpi::LogicalSize::new(config.width, config.height));

    let window = Arc::new(event_loop.create_window(window_attrs)?);
    let gpu = GpuContext::new(window.clone())?;

    let program = ShaderProgram::load(&gpu, &config.vertex_shader, &config.fragment_shader)?;
    let scene = ScenePass::new(&gpu, program);

    let mut registry = DrawableRegistry::new();
    let mut camera = Camera::new();
    let frame_fn = setup(&mut SetupContext {
        gpu: &gpu,
        registry: &mut registry,
        camera: &mut camera,
    })?;
    log::info!("setup complete: {} drawables", registry.len());

    window.request_redraw();

    Ok(Running {
        window,
        gpu,
        scene,
        registry,
        clear_color: config.clear_color,
        camera,
        input: Input::new(),
        frame_fn,
        draws: Vec::new(),
        start_time: Instant::now(),
        last_frame: Instant::now(),
    })
}

impl ApplicationHandler for ArcadeApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        let AppState::Pending { config, setup } = &mut self.state else {
            return;
        };
        let Some(setup) = setup.take() else {
            return;
        };

        match start(event_loop, config, setup) {
            Ok(running) => self.state = AppState::Running(Box::new(running)),
            Err(err) => self.fail(event_loop, err),
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        let AppState::Running(app) = &mut self.state else {
            return;
        };

        app.input.handle_event(&event);

        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                app.gpu.resize(size.width, size.height);
            }
            WindowEvent::RedrawRequested => {
                if let Err(err) = app.redraw(event_loop) {
                    self.fail(event_loop, err);
                }
            }
            _ => {}
        }
    }
}

impl Running {
    fn redraw(&mut self, event_loop: &ActiveEventLoop) -> Result<(), AppError> {
        let now = Instant::now();
        let time = self.start_time.elapsed().as_secs_f32();
        let dt = now.duration_since(self.last_frame).as_secs_f32();
        self.last_frame = now;

        self.draws.clear();
        let mut quit = false;
        let mut frame = Frame {
            input: &self.input,
            camera: &mut self.camera,
            time,
            dt,
            aspect: self.gpu.aspect(),
            draws: &mut self.draws,
            quit: &mut quit,
        };
        (self.frame_fn)(&mut frame);
        self.input.begin_frame();

        if quit {
            log::info!("quit requested");
            event_loop.exit();
            return Ok(());
        }

        let output = match self.gpu.surface.get_current_texture() {
            Ok(output) => output,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                log::debug!("surface lost or outdated; reconfiguring");
                self.gpu.reconfigure();
                self.window.request_redraw();
                return Ok(());
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                return Err(wgpu::SurfaceError::OutOfMemory.into());
            }
            Err(err) => {
                log::warn!("skipping frame: {err}");
                self.window.request_redraw();
                return Ok(());
            }
        };

        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = self
            .gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Frame Encoder"),
            });

        self.scene.render(
            &self.gpu,
            &mut encoder,
            &view,
            self.clear_color,
            &self.registry,
            &self.draws,
        );

        self.gpu.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        self.window.request_redraw();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults_to_shipped_shaders() {
        let config = AppConfig::new();
        assert_eq!(config.vertex_shader, PathBuf::from("Sample_GL.vert"));
        assert_eq!(config.fragment_shader, PathBuf::from("Sample_GL.frag"));
    }

    #[test]
    fn config_builder_overrides_fields() {
        let config = AppConfig::new()
            .title("Maze")
            .size(1366, 768)
            .clear_color(Color::rgb8(235, 95, 250))
            .shaders("a.vert", "b.frag");
        assert_eq!(config.title, "Maze");
        assert_eq!((config.width, config.height), (1366, 768));
        assert_eq!(config.clear_color, Color::rgb8(235, 95, 250));
        assert_eq!(config.vertex_shader, PathBuf::from("a.vert"));
        assert_eq!(config.fragment_shader, PathBuf::from("b.frag"));
    }
}
