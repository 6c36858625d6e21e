//! # Viewer — A Window Around the Frame Loop
//!
//! [`Viewer`] is the winit host. It owns the event loop, creates the window
//! and the [`WgpuBackend`] on `resumed`, builds the [`Stage`] from a
//! [`ViewerConfig`], and then routes window events:
//!
//! ```text
//!  winit event                     →  lykta
//!  ─────────────────────────────────────────────────────────────
//!  Resized / ScaleFactorChanged    →  ResizeReconciler::reconcile
//!  KeyboardInput / MouseInput      →  InputState (+ on_key callback)
//!  CursorMoved / MouseWheel        →  InputState
//!  double click (< 300 ms)         →  toggle borderless fullscreen
//!  RedrawRequested                 →  FrameLoop::tick → request_redraw
//!  CloseRequested                  →  FrameLoop::cancel, exit
//! ```
//!
//! Errors from setup, resize or a frame stop the event loop and are
//! returned from [`Viewer::run`].
//!
//! ## Usage
//!
//! ```ignore
//! Viewer::new(ViewerConfig::default())
//!     .setup(|stage, frame_loop, _panel| {
//!         let mesh = Mesh::new(Arc::new(Geometry::cuboid(1.0, 1.0, 1.0)), Arc::new(Material::default()));
//!         let cube = stage.scene.spawn(Node::mesh("cube", mesh));
//!         frame_loop.add_animation(move |scene, time| {
//!             if let Some(node) = scene.get_mut(cube) {
//!                 node.transform.set_euler(0.0, time.elapsed_secs(), 0.0);
//!             }
//!         });
//!         Ok(())
//!     })
//!     .run()
//! ```

use std::sync::Arc;
use std::time::{Duration, Instant};

use winit::application::ApplicationHandler;
use winit::event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent};
use winit::event_loop::{ActiveEventLoop, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Fullscreen, Window, WindowId};

use crate::config::ViewerConfig;
use crate::error::{Error, Result};
use crate::frame_loop::{FrameLoop, RedrawScheduler};
use crate::gpu::WgpuBackend;
use crate::logging;
use crate::panel::{ParamKind, ParameterPanel};
use crate::render::RenderTarget;
use crate::resize::{ResizeEvent, ResizeReconciler};
use crate::scene::{Node, Scene};
use crate::stage::Stage;
use crate::surface::SurfaceState;

const DOUBLE_CLICK: Duration = Duration::from_millis(300);

/// Pixels of touchpad scroll counted as one wheel line.
const PIXELS_PER_LINE: f64 = 40.0;

type SetupFn = Box<dyn FnOnce(&mut Stage, &mut FrameLoop, &mut ParameterPanel) -> Result<()>>;
type KeyFn = Box<dyn FnMut(KeyCode, &mut Stage, &mut ParameterPanel) -> Result<()>>;

impl RedrawScheduler for Arc<Window> {
    fn schedule_next_frame(&mut self) {
        self.request_redraw();
    }
}

/// Builder and entry point for a windowed viewer.
pub struct Viewer {
    config: ViewerConfig,
    frame_loop: FrameLoop,
    panel: ParameterPanel,
    setup: Option<SetupFn>,
    on_key: Option<KeyFn>,
}

impl Viewer {
    pub fn new(config: ViewerConfig) -> Self {
        Self {
            config,
            frame_loop: FrameLoop::new(),
            panel: ParameterPanel::new(),
            setup: None,
            on_key: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.config.window.title = title.into();
        self
    }

    /// Runs once, after the window and stage exist and before the first frame.
    pub fn setup(
        mut self,
        setup: impl FnOnce(&mut Stage, &mut FrameLoop, &mut ParameterPanel) -> Result<()> + 'static,
    ) -> Self {
        self.setup = Some(Box::new(setup));
        self
    }

    /// Called on every key press, after [`InputState`](crate::input::InputState)
    /// has recorded it.
    pub fn on_key(
        mut self,
        handler: impl FnMut(KeyCode, &mut Stage, &mut ParameterPanel) -> Result<()> + 'static,
    ) -> Self {
        self.on_key = Some(Box::new(handler));
        self
    }

    /// Run until the window closes or an error stops the loop.
    pub fn run(self) -> Result<()> {
        logging::init_logger(self.config.log_filter.as_deref());
        self.config.validate()?;

        let event_loop = EventLoop::new().map_err(|e| Error::EventLoop(e.to_string()))?;
        let mut app = ViewerApp {
            config: self.config,
            frame_loop: self.frame_loop,
            panel: self.panel,
            setup: self.setup,
            on_key: self.on_key,
            reconciler: ResizeReconciler::new(),
            window: None,
            stage: None,
            last_click: None,
            error: None,
        };
        event_loop
            .run_app(&mut app)
            .map_err(|e| Error::EventLoop(e.to_string()))?;

        match app.error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

struct ViewerApp {
    config: ViewerConfig,
    frame_loop: FrameLoop,
    panel: ParameterPanel,
    setup: Option<SetupFn>,
    on_key: Option<KeyFn>,
    reconciler: ResizeReconciler,
    window: Option<Arc<Window>>,
    stage: Option<Stage>,
    last_click: Option<Instant>,
    error: Option<Error>,
}

impl ViewerApp {
    fn start(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let title = &self.config.window.title;
        let attrs = Window::default_attributes()
            .with_title(title)
            .with_inner_size(winit::dpi::LogicalSize::new(
                self.config.window.width as f64,
                self.config.window.height as f64,
            ));
        let window = Arc::new(
            event_loop
                .create_window(attrs)
                .map_err(|e| Error::Surface(format!("create window: {e}")))?,
        );

        let backend = WgpuBackend::new(Arc::clone(&window))?;

        let scale = window.scale_factor();
        let size = window.inner_size();
        let ResizeEvent { width, height, pixel_ratio } = ResizeEvent::from_physical(size.width, size.height, scale);
        let surface = SurfaceState::new(width, height, pixel_ratio, self.config.max_pixel_ratio)?;

        let mut target = RenderTarget::new(Box::new(backend), &surface);
        target.set_clear_color(self.config.clear_color);
        target.set_shadows_enabled(self.config.shadows.enabled);
        target.set_shadow_filter(self.config.shadows.filter);

        let mut scene = Scene::new();
        let camera = self.config.camera.build(surface.aspect())?;
        let camera = scene.spawn(Node::camera("camera", camera));
        match self.config.camera.target() {
            Some(target) => scene.place_looking_at(camera, self.config.camera.position(), target)?,
            None => scene.node_mut(camera)?.transform.translation = self.config.camera.position(),
        }

        let mut stage = Stage::new(scene, camera, target, surface)?;
        if let Some(setup) = self.setup.take() {
            setup(&mut stage, &mut self.frame_loop, &mut self.panel)?;
        }
        log_panel(&self.panel);

        log::info!("viewer '{title}' started at {width}x{height} @{scale}");
        window.request_redraw();
        self.window = Some(window);
        self.stage = Some(stage);
        Ok(())
    }

    fn handle(&mut self, event_loop: &ActiveEventLoop, event: WindowEvent) -> Result<()> {
        let (Some(window), Some(stage)) = (&self.window, &mut self.stage) else {
            return Ok(());
        };

        match event {
            WindowEvent::CloseRequested => {
                log::info!("window close requested");
                self.frame_loop.cancel();
                event_loop.exit();
            }

            WindowEvent::Resized(size) => {
                if size.width > 0 && size.height > 0 {
                    let event = ResizeEvent::from_physical(size.width, size.height, window.scale_factor());
                    self.reconciler.reconcile(stage, event)?;
                }
            }

            WindowEvent::ScaleFactorChanged { scale_factor, .. } => {
                let size = window.inner_size();
                if size.width > 0 && size.height > 0 {
                    let event = ResizeEvent::from_physical(size.width, size.height, scale_factor);
                    self.reconciler.reconcile(stage, event)?;
                }
            }

            WindowEvent::KeyboardInput { event, .. } => {
                if let PhysicalKey::Code(code) = event.physical_key {
                    match event.state {
                        ElementState::Pressed => {
                            stage.input.keys.press(code);
                            if !event.repeat
                                && let Some(handler) = &mut self.on_key
                            {
                                handler(code, stage, &mut self.panel)?;
                            }
                        }
                        ElementState::Released => stage.input.keys.release(code),
                    }
                }
            }

            WindowEvent::MouseInput { button, state, .. } => match state {
                ElementState::Pressed => {
                    stage.input.mouse.press(button);
                    if button == MouseButton::Left {
                        let now = Instant::now();
                        if self.last_click.is_some_and(|t| now - t < DOUBLE_CLICK) {
                            toggle_fullscreen(window);
                            self.last_click = None;
                        } else {
                            self.last_click = Some(now);
                        }
                    }
                }
                ElementState::Released => stage.input.mouse.release(button),
            },

            WindowEvent::CursorMoved { position, .. } => {
                let logical = position.to_logical::<f64>(window.scale_factor());
                stage.input.cursor_moved(logical.x as f32, logical.y as f32);
            }

            WindowEvent::CursorLeft { .. } => stage.input.cursor_left(),

            WindowEvent::MouseWheel { delta, .. } => {
                let lines = match delta {
                    MouseScrollDelta::LineDelta(_, y) => y,
                    MouseScrollDelta::PixelDelta(p) => (p.y / PIXELS_PER_LINE) as f32,
                };
                stage.input.add_wheel(lines);
            }

            WindowEvent::RedrawRequested => {
                let mut scheduler = Arc::clone(window);
                self.frame_loop.tick(stage, &mut scheduler)?;
            }

            _ => {}
        }
        Ok(())
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, error: Error) {
        log::error!("{error}");
        self.frame_loop.cancel();
        self.error = Some(error);
        event_loop.exit();
    }
}

impl ApplicationHandler for ViewerApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_none()
            && let Err(e) = self.start(event_loop)
        {
            self.fail(event_loop, e);
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        if let Err(e) = self.handle(event_loop, event) {
            self.fail(event_loop, e);
        }
    }
}

fn toggle_fullscreen(window: &Window) {
    if window.fullscreen().is_some() {
        window.set_fullscreen(None);
    } else {
        window.set_fullscreen(Some(Fullscreen::Borderless(None)));
    }
}

fn log_panel(panel: &ParameterPanel) {
    for d in panel.descriptors() {
        let folder = d.folder.as_deref().unwrap_or("-");
        match d.kind {
            ParamKind::Number { min, max, step } => {
                log::debug!("panel [{folder}] {}: number {min}..{max} step {step}", d.name)
            }
            kind => log::debug!("panel [{folder}] {}: {kind:?}", d.name),
        }
    }
}
