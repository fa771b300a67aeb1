//! Per-frame driver: elapsed time, compute dispatch, present, quit key
//!
//! `FrameLoop` knows nothing about wgpu or winit windows. It sequences a
//! [`FrameBackend`], which is the GPU resource set in the app and a mock in tests.

use winit::keyboard::KeyCode;

use crate::error::FrameError;
use crate::uniforms::{UniformName, UniformSet, UniformValue};

/// Key that asks the window to close
pub const QUIT_KEY: KeyCode = KeyCode::KeyQ;

/// GPU-side operations the frame loop drives
pub trait FrameBackend {
    /// Whether a compute program was loaded at construction
    fn compute_enabled(&self) -> bool;

    /// Write `u_time` into the render program
    fn set_render_time(&mut self, time: f32) -> Result<(), FrameError>;

    /// Bind output image and storage buffer, apply uniforms, dispatch.
    /// Must be a no-op when compute is disabled.
    fn dispatch_compute(&mut self, uniforms: &UniformSet) -> Result<(), FrameError>;

    /// Draw the output texture full-screen and present it
    fn present(&mut self) -> Result<(), FrameError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    /// Close the window
    Quit,
    Ignored,
}

pub struct FrameLoop<B> {
    backend: B,
    elapsed: f64,
    resolution: (u32, u32),
    close_requested: bool,
}

impl<B: FrameBackend> FrameLoop<B> {
    pub fn new(backend: B, resolution: (u32, u32)) -> Self {
        Self {
            backend,
            elapsed: 0.0,
            resolution,
            close_requested: false,
        }
    }

    /// Advance the elapsed-time accumulator by `delta` seconds.
    ///
    /// Any non-negative delta is accepted, including 0 and very large values.
    /// Negative or non-finite deltas are dropped.
    pub fn update(&mut self, delta: f64) -> Result<(), FrameError> {
        if delta.is_finite() && delta >= 0.0 {
            self.elapsed += delta;
        } else {
            log::warn!("Ignoring invalid frame delta {}", delta);
        }
        self.backend.set_render_time(self.elapsed as f32)
    }

    /// Run compute (if enabled) then present
    pub fn draw(&mut self) -> Result<(), FrameError> {
        if self.backend.compute_enabled() {
            let uniforms = self.frame_uniforms();
            self.backend.dispatch_compute(&uniforms)?;
        }
        self.backend.present()
    }

    pub fn key_pressed(&mut self, key: KeyCode) -> KeyAction {
        if key == QUIT_KEY && !self.close_requested {
            log::info!("Quit key pressed, closing window");
            self.close_requested = true;
            KeyAction::Quit
        } else {
            KeyAction::Ignored
        }
    }

    /// Uniforms the compute program receives this frame
    pub fn frame_uniforms(&self) -> UniformSet {
        UniformSet::new()
            .with(UniformName::Time, UniformValue::Float(self.elapsed as f32))
            .with(
                UniformName::Resolution,
                UniformValue::Vec2([self.resolution.0 as f32, self.resolution.1 as f32]),
            )
    }

    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    pub fn close_requested(&self) -> bool {
        self.close_requested
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }
}
