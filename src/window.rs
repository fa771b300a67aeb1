//! winit event loop driving the frame pipeline

use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::{ElementState, KeyEvent, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::PhysicalKey,
    window::{Window, WindowId},
};

use crate::config::AppConfig;
use crate::error::FrameError;
use crate::frame::{FrameLoop, KeyAction};
use crate::gpu::GpuBackend;

/// Application handler for winit event loop
struct ComputeViewApp {
    config: AppConfig,
    frame: Option<FrameLoop<GpuBackend>>,
    last_tick: Option<Instant>,
    // First fatal error; returned from `run` once the loop exits
    error: Option<anyhow::Error>,
}

impl ComputeViewApp {
    fn new(config: AppConfig) -> Self {
        Self {
            config,
            frame: None,
            last_tick: None,
            error: None,
        }
    }

    fn create_frame_loop(&self, event_loop: &ActiveEventLoop) -> anyhow::Result<FrameLoop<GpuBackend>> {
        let (width, height) = self.config.screen_size();
        let window_attrs = Window::default_attributes()
            .with_title(&self.config.title)
            .with_inner_size(PhysicalSize::new(width, height))
            .with_resizable(false);

        let window = Arc::new(
            event_loop
                .create_window(window_attrs)
                .context("failed to create window")?,
        );

        log::info!("Loading shaders from {}", self.config.shader_dir.display());
        let backend = GpuBackend::new(window, &self.config)?;
        let mut frame = FrameLoop::new(backend, self.config.screen_size());

        if self.config.warmup_steps > 0 {
            warm_up(&mut frame, self.config.warmup_steps)?;
        }

        Ok(frame)
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, err: anyhow::Error) {
        log::error!("{:#}", err);
        if self.error.is_none() {
            self.error = Some(err);
        }
        event_loop.exit();
    }
}

/// Iterate the double-buffered compute state before the first frame
fn warm_up(frame: &mut FrameLoop<GpuBackend>, steps: u32) -> Result<(), FrameError> {
    let uniforms = frame.frame_uniforms();
    let mut last = None;
    for _ in 0..steps {
        match frame.backend_mut().run_compute(&uniforms)? {
            Some(state) => last = Some(state),
            None => {
                log::warn!("Compute is disabled, skipping {} warmup steps", steps);
                return Ok(());
            }
        }
    }

    if let Some(state) = last {
        let mean = state.iter().sum::<f32>() / state.len().max(1) as f32;
        log::info!("Warmed up compute state over {} steps (mean {:.4})", steps, mean);
    }
    Ok(())
}

impl ApplicationHandler for ComputeViewApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.frame.is_some() {
            return;
        }

        match self.create_frame_loop(event_loop) {
            Ok(frame) => {
                println!("=== Compute Shader Viewer ===");
                println!("Controls:");
                println!("  Q          - Quit");
                println!();

                self.frame = Some(frame);
            }
            Err(e) => self.fail(event_loop, e.context("failed to start")),
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        let frame = match &mut self.frame {
            Some(f) => f,
            None => return,
        };

        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }

            WindowEvent::Resized(size) => {
                frame.backend_mut().ctx.resize((size.width, size.height));
            }

            WindowEvent::KeyboardInput {
                event: KeyEvent {
                    physical_key: PhysicalKey::Code(key),
                    state: ElementState::Pressed,
                    repeat: false,
                    ..
                },
                ..
            } => {
                if frame.key_pressed(key) == KeyAction::Quit {
                    event_loop.exit();
                }
            }

            WindowEvent::RedrawRequested => {
                if let Err(e) = frame.draw() {
                    self.fail(event_loop, anyhow::Error::new(e).context("render error"));
                }
            }

            _ => {}
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        let Some(frame) = self.frame.as_mut() else {
            return;
        };
        if frame.close_requested() {
            return;
        }

        let now = Instant::now();
        let delta = self
            .last_tick
            .map_or(0.0, |last| now.duration_since(last).as_secs_f64());
        self.last_tick = Some(now);

        if let Err(e) = frame.update(delta) {
            self.fail(event_loop, anyhow::Error::new(e).context("update error"));
            return;
        }

        // Request continuous redraw
        frame.backend().ctx.request_redraw();
    }
}

/// Open the window and run until it closes
pub fn run(config: AppConfig) -> anyhow::Result<()> {
    let event_loop = EventLoop::new().context("failed to create event loop")?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = ComputeViewApp::new(config);
    event_loop.run_app(&mut app).context("event loop error")?;

    match app.error.take() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
