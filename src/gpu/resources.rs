//! The GPU resource set and its `FrameBackend` implementation

use std::sync::Arc;

use winit::window::Window;

use super::compute::ComputeStage;
use super::context::GpuContext;
use super::display::DisplayPipeline;
use super::render::RenderProgram;
use super::texture::OutputTexture;
use crate::config::AppConfig;
use crate::error::FrameError;
use crate::frame::FrameBackend;
use crate::shader::{load_compute_source, load_source};
use crate::uniforms::UniformSet;

/// Programs and the output texture, one of each, for the life of the context
pub struct GpuResources {
    pub render: RenderProgram,
    pub display: DisplayPipeline,
    pub compute: Option<ComputeStage>,
    // Bound by the display and compute bind groups
    _output: OutputTexture,
}

impl GpuResources {
    /// Load shaders from `config.shader_dir` and build everything.
    ///
    /// A missing compute shader disables compute; every other failure aborts.
    pub fn new(ctx: &GpuContext, config: &AppConfig) -> Result<Self, FrameError> {
        let fragment_source = load_source(&config.fragment_path())?;
        let compute_source = load_compute_source(&config.compute_path(), config.workgroups)?;

        let render = RenderProgram::new(ctx, &fragment_source)?;
        let output = OutputTexture::new(&ctx.device, config.width, config.height);
        let display = DisplayPipeline::new(ctx, &output)?;

        let compute = compute_source
            .map(|source| ComputeStage::new(&ctx.device, &source, &output, config.workgroups))
            .transpose()?;

        Ok(Self {
            render,
            display,
            compute,
            _output: output,
        })
    }
}

/// Owns the context together with the resources built on it
pub struct GpuBackend {
    pub ctx: GpuContext,
    pub resources: GpuResources,
}

impl GpuBackend {
    pub fn new(window: Arc<Window>, config: &AppConfig) -> Result<Self, FrameError> {
        let ctx = GpuContext::new(window)?;
        let resources = GpuResources::new(&ctx, config)?;
        Ok(Self { ctx, resources })
    }

    /// Double-buffered compute step returning the new front buffer.
    /// `None` when compute is disabled.
    pub fn run_compute(&mut self, uniforms: &UniformSet) -> Result<Option<Vec<f32>>, FrameError> {
        match self.resources.compute.as_mut() {
            Some(stage) => stage.run_compute(&self.ctx.device, &self.ctx.queue, uniforms).map(Some),
            None => Ok(None),
        }
    }
}

impl FrameBackend for GpuBackend {
    fn compute_enabled(&self) -> bool {
        self.resources.compute.is_some()
    }

    fn set_render_time(&mut self, time: f32) -> Result<(), FrameError> {
        self.resources.render.set_time(&self.ctx, time)
    }

    fn dispatch_compute(&mut self, uniforms: &UniformSet) -> Result<(), FrameError> {
        match self.resources.compute.as_mut() {
            Some(stage) => stage.dispatch(&self.ctx.device, &self.ctx.queue, uniforms),
            None => Ok(()),
        }
    }

    fn present(&mut self) -> Result<(), FrameError> {
        match self.resources.display.render(&self.ctx) {
            Ok(()) => Ok(()),
            // Surface went stale; reconfigure and draw next frame
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                log::warn!("Surface lost or outdated, reconfiguring");
                self.ctx.reconfigure();
                Ok(())
            }
            Err(wgpu::SurfaceError::Timeout) => {
                log::warn!("Surface timeout, skipping frame");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }
}
