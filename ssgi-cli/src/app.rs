//! Windowed runner: one non-resizable window, one frame every 16 ms.

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

use ssgi_wgpu::{Extent, Renderer, RendererConfig, SceneAssets, WgpuDevice};

const WINDOW_TITLE: &str = "SSGI Demo";
const FRAME_INTERVAL: Duration = Duration::from_millis(16);

struct DemoApp {
    config: RendererConfig,
    max_frames: Option<u64>,
    window: Option<Arc<Window>>,
    renderer: Option<Renderer<WgpuDevice>>,
    next_frame: Instant,
    error: Option<anyhow::Error>,
}

impl DemoApp {
    fn new(config: RendererConfig, max_frames: Option<u64>) -> Self {
        Self {
            config,
            max_frames,
            window: None,
            renderer: None,
            next_frame: Instant::now(),
            error: None,
        }
    }

    fn init(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let attrs = Window::default_attributes()
            .with_title(WINDOW_TITLE)
            .with_inner_size(PhysicalSize::new(self.config.width, self.config.height))
            .with_resizable(false);
        let window = Arc::new(
            event_loop
                .create_window(attrs)
                .context("failed to create window")?,
        );

        let extent = Extent::new(self.config.width, self.config.height);
        let device = WgpuDevice::new(window.clone(), extent)?;
        let renderer = Renderer::new(device, self.config.clone(), &SceneAssets::demo())?;

        self.window = Some(window);
        self.renderer = Some(renderer);
        Ok(())
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, error: anyhow::Error) {
        log::error!("{error:#}");
        self.error = Some(error);
        event_loop.exit();
    }

    fn tick(&mut self, event_loop: &ActiveEventLoop) {
        let Some(renderer) = self.renderer.as_mut() else {
            return;
        };
        match renderer.render_frame() {
            Ok(report) => {
                if let Some(max) = self.max_frames {
                    if report.frame_index + 1 >= max {
                        renderer.request_shutdown();
                    }
                }
            }
            // A failed frame is skipped; the next tick tries again.
            Err(e) if !e.is_fatal_at_init() => log::warn!("frame skipped: {e}"),
            Err(e) => {
                self.fail(event_loop, e.into());
                return;
            }
        }
        if renderer.shutdown_requested() {
            event_loop.exit();
        }
    }
}

impl ApplicationHandler for DemoApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        if let Err(e) = self.init(event_loop) {
            self.fail(event_loop, e.context("renderer initialization failed"));
            return;
        }
        self.next_frame = Instant::now();
        event_loop.set_control_flow(ControlFlow::WaitUntil(self.next_frame));
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested | WindowEvent::Destroyed => {
                if let Some(renderer) = self.renderer.as_mut() {
                    renderer.request_shutdown();
                }
                event_loop.exit();
            }
            WindowEvent::RedrawRequested => self.tick(event_loop),
            _ => {}
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        let now = Instant::now();
        if now >= self.next_frame {
            if let Some(window) = &self.window {
                window.request_redraw();
            }
            self.next_frame = now + FRAME_INTERVAL;
        }
        event_loop.set_control_flow(ControlFlow::WaitUntil(self.next_frame));
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(renderer) = self.renderer.take() {
            drop(renderer.shutdown());
        }
    }
}

pub fn run(max_frames: Option<u64>) -> Result<()> {
    let event_loop = EventLoop::new().context("failed to create event loop")?;
    let mut app = DemoApp::new(RendererConfig::default(), max_frames);
    event_loop
        .run_app(&mut app)
        .context("event loop terminated with error")?;
    match app.error.take() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
