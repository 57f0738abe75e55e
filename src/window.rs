//! Desktop window hosting the hero scene.
//!
//! [`Showcase`] is the `winit` application: it owns the [`Shell`], the
//! [`GpuState`] and the frame clock, feeds cursor input to the backdrop and
//! drag input to the globe camera, and shows the headline in the title bar.

use std::sync::Arc;

use winit::{
    application::ApplicationHandler,
    event::{ElementState, MouseButton, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    window::{Window, WindowId},
};

use crate::config::{ShowcaseConfig, WindowConfig};
use crate::error::ShowcaseError;
use crate::gpu::GpuState;
use crate::input::Pointer;
use crate::shell::{Fragment, Shell, ShellFrame};
use crate::time::FrameClock;

/// Open a window and run the scene until it is closed.
pub fn run(config: ShowcaseConfig) -> Result<(), ShowcaseError> {
    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = Showcase::new(config);
    event_loop.run_app(&mut app)?;

    match app.error.take() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

pub struct Showcase {
    window_config: WindowConfig,
    window: Option<Arc<Window>>,
    gpu_state: Option<GpuState>,
    shell: Shell,
    clock: FrameClock,
    pointer: Pointer,
    mouse_pressed: bool,
    last_mouse_pos: Option<(f64, f64)>,
    title: String,
    error: Option<ShowcaseError>,
}

impl Showcase {
    pub fn new(config: ShowcaseConfig) -> Self {
        let shell = Shell::new(&config);
        Self {
            pointer: Pointer::new(config.window.width, config.window.height),
            window_config: config.window,
            window: None,
            gpu_state: None,
            shell,
            clock: FrameClock::new(),
            mouse_pressed: false,
            last_mouse_pos: None,
            title: String::new(),
            error: None,
        }
    }

    fn init(&mut self, event_loop: &ActiveEventLoop) -> Result<(), ShowcaseError> {
        let window_attrs = Window::default_attributes()
            .with_title(self.window_config.title.clone())
            .with_inner_size(winit::dpi::LogicalSize::new(
                self.window_config.width,
                self.window_config.height,
            ));

        let window = Arc::new(event_loop.create_window(window_attrs)?);
        let size = window.inner_size();
        self.pointer.set_window_size(size.width, size.height);

        let gpu_state = pollster::block_on(GpuState::new(
            window.clone(),
            self.shell.backdrop(),
            self.window_config.vsync,
        ))?;

        self.window = Some(window);
        self.gpu_state = Some(gpu_state);
        self.clock = FrameClock::new();
        self.shell.mount(self.clock.elapsed_ms());
        Ok(())
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let Some(gpu_state) = &mut self.gpu_state else {
            return;
        };

        let (_, delta) = self.clock.tick();
        let half = gpu_state.backdrop_half_extents();
        let input = ShellFrame {
            now_ms: self.clock.elapsed_ms(),
            delta,
            pointer: self.pointer.to_world(half.extend(0.0)),
            viewport_half: half,
        };

        let mut draw_globe = false;
        let mut status = None;
        let mut headline = String::new();
        for fragment in self.shell.frame(&input) {
            match fragment {
                Fragment::Backdrop(_) => {}
                Fragment::Hero(globe) => {
                    gpu_state.prepare_globe(globe, delta);
                    draw_globe = true;
                }
                Fragment::Loading => status = Some("loading globe"),
                Fragment::Fallback(message) => status = Some(message),
                Fragment::Headline(text) => headline.push_str(text),
            }
        }

        if let Some(textures) = self.shell.take_textures() {
            self.shell
                .guard_globe(|globe| gpu_state.load_globe(globe.shells(), &textures));
        }

        gpu_state.upload_backdrop(self.shell.backdrop_mut());

        match gpu_state.render(draw_globe && gpu_state.has_globe()) {
            Ok(report) => {
                if let Some(e) = report.globe_error {
                    self.shell.guard_globe(|_| Err::<(), _>(e));
                }
            }
            Err(wgpu::SurfaceError::Lost) => gpu_state.reconfigure(),
            Err(wgpu::SurfaceError::OutOfMemory) => event_loop.exit(),
            Err(e) => log::warn!("Render error: {:?}", e),
        }

        let title = match status {
            Some(status) => format!("{} | {}", headline, status),
            None => headline,
        };
        if title != self.title {
            if let Some(window) = &self.window {
                window.set_title(&title);
            }
            self.title = title;
        }
    }
}

impl ApplicationHandler for Showcase {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_none() {
            if let Err(e) = self.init(event_loop) {
                log::error!("Failed to start showcase: {}", e);
                self.error = Some(e);
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        self.pointer.handle_event(&event);

        match event {
            WindowEvent::CloseRequested => {
                self.shell.unmount();
                event_loop.exit();
            }
            WindowEvent::Resized(physical_size) => {
                if let Some(gpu_state) = &mut self.gpu_state {
                    gpu_state.resize(physical_size);
                }
            }
            WindowEvent::MouseInput { state, button, .. } => {
                if button == MouseButton::Left {
                    self.mouse_pressed = state == ElementState::Pressed;
                    if !self.mouse_pressed {
                        self.last_mouse_pos = None;
                    }
                    if let Some(gpu_state) = &mut self.gpu_state {
                        gpu_state.globe_camera.set_dragging(self.mouse_pressed);
                    }
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                if self.mouse_pressed {
                    if let Some((last_x, last_y)) = self.last_mouse_pos {
                        let dx = (position.x - last_x) as f32;
                        let dy = (position.y - last_y) as f32;
                        if let Some(gpu_state) = &mut self.gpu_state {
                            gpu_state.globe_camera.drag(dx, dy);
                        }
                    }
                    self.last_mouse_pos = Some((position.x, position.y));
                }
            }
            WindowEvent::RedrawRequested => {
                self.redraw(event_loop);
                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }
            _ => {}
        }
    }
}
