//! Windowed app: winit event loop driving a [`Session`] and the renderer.

use std::sync::Arc;

use winit::application::ApplicationHandler;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

use crate::config::TinselConfig;
use crate::error::AppError;
use crate::gpu::GpuState;
use crate::input::{Input, InputAction, InputEvent};
use crate::mode::{InteractionMode, ManualSignal};
use crate::session::{ProviderFactory, Session};
use crate::time::FrameClock;

/// Open the window and run until it closes.
///
/// `factory` builds the landmark provider for each detection attempt;
/// `None` runs with manual controls only.
pub fn run(config: TinselConfig, factory: Option<ProviderFactory>) -> Result<(), AppError> {
    config.validate()?;

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let session = Session::new(&config, factory);
    let mut app = App::new(config, session);
    event_loop.run_app(&mut app)?;

    match app.error.take() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

struct App {
    config: TinselConfig,
    session: Session,
    window: Option<Arc<Window>>,
    gpu_state: Option<GpuState>,
    input: Input,
    clock: FrameClock,
    title: String,
    last_fps_log: u64,
    error: Option<AppError>,
}

impl App {
    fn new(config: TinselConfig, session: Session) -> Self {
        Self {
            config,
            session,
            window: None,
            gpu_state: None,
            input: Input::new(),
            clock: FrameClock::new(),
            title: String::new(),
            last_fps_log: 0,
            error: None,
        }
    }

    fn init(&mut self, event_loop: &ActiveEventLoop) -> Result<(), AppError> {
        let window_attrs = Window::default_attributes()
            .with_title(self.config.window.title.clone())
            .with_inner_size(winit::dpi::LogicalSize::new(
                self.config.window.width,
                self.config.window.height,
            ));

        let window = Arc::new(event_loop.create_window(window_attrs)?);
        let gpu_state = pollster::block_on(GpuState::new(window.clone(), self.session.field(), &self.config))?;

        self.window = Some(window);
        self.gpu_state = Some(gpu_state);
        self.clock.resync();
        Ok(())
    }

    fn apply(&mut self, action: InputAction, event_loop: &ActiveEventLoop) {
        match action {
            InputAction::Manual(ManualSignal::Press) => {
                self.session.press();
            }
            InputAction::Manual(ManualSignal::Release) => {
                self.session.release();
            }
            InputAction::Orbit(delta) => {
                if let Some(gpu_state) = &mut self.gpu_state {
                    gpu_state.camera.orbit(delta);
                }
            }
            InputAction::Zoom(steps) => {
                if let Some(gpu_state) = &mut self.gpu_state {
                    gpu_state.camera.zoom(steps);
                }
            }
            InputAction::Retry => {
                self.session.retry();
            }
            InputAction::Dismiss => {
                self.session.dismiss();
            }
            InputAction::Quit => event_loop.exit(),
        }
    }

    fn update_title(&mut self) {
        let Some(window) = &self.window else {
            return;
        };
        let mut title = format!("{} | {}", self.config.window.title, self.session.hint());
        if let Some(message) = self.session.status().message() {
            title.push_str(" | ");
            title.push_str(message);
        }
        if title != self.title {
            window.set_title(&title);
            self.title = title;
        }
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let dt = self.clock.tick();
        let frame = self.session.frame(dt);

        let frame_count = self.clock.frame();
        if frame_count >= self.last_fps_log + 60 {
            log::debug!("FPS: {:.1}", self.clock.fps());
            self.last_fps_log = frame_count;
        }

        if let Some(gpu_state) = &mut self.gpu_state {
            if frame.mode == InteractionMode::Assembled {
                gpu_state.camera.auto_rotate(dt);
            }
            match gpu_state.render(&frame) {
                Ok(()) => {}
                Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                    gpu_state.resize(winit::dpi::PhysicalSize {
                        width: gpu_state.config.width,
                        height: gpu_state.config.height,
                    })
                }
                Err(wgpu::SurfaceError::OutOfMemory) => {
                    log::error!("GPU out of memory");
                    event_loop.exit();
                }
                Err(e) => log::warn!("Render error: {:?}", e),
            }
        }

        self.update_title();
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        if let Err(e) = self.init(event_loop) {
            log::error!("{}", e);
            self.error = Some(e);
            event_loop.exit();
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(physical_size) => {
                if let Some(gpu_state) = &mut self.gpu_state {
                    gpu_state.resize(physical_size);
                }
            }
            WindowEvent::RedrawRequested => self.redraw(event_loop),
            other => {
                let Some(input) = InputEvent::from_window_event(&other) else {
                    return;
                };
                let gesture_active = self.session.status().is_gesture_active();
                if let Some(action) = self.input.handle(input, gesture_active) {
                    self.apply(action, event_loop);
                }
            }
        }
    }
}
