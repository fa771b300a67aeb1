//! Render program built from the user's fragment shader

use super::context::GpuContext;
use super::program::{QUAD_VERTEX_GLSL, compile_glsl, validated};
use super::quad;
use crate::error::FrameError;
use crate::shader::{ShaderInterface, reflect};
use crate::uniforms::{FrameParams, UniformName, UniformSet, UniformValue};

const PROGRAM: &str = "render";

/// Vertex + fragment program that receives `u_time` every update.
///
/// It is compiled and fed each tick; the frame itself shows the compute output.
pub struct RenderProgram {
    _pipeline: wgpu::RenderPipeline,
    uniform_buffer: wgpu::Buffer,
    _bind_group: wgpu::BindGroup,
    interface: ShaderInterface,
    params: FrameParams,
}

impl RenderProgram {
    pub fn new(ctx: &GpuContext, fragment_source: &str) -> Result<Self, FrameError> {
        let interface = reflect(PROGRAM, fragment_source, naga::ShaderStage::Fragment)?;
        // u_time is the one uniform this program is driven with
        UniformSet::new()
            .with(UniformName::Time, UniformValue::Float(0.0))
            .validate(PROGRAM, &interface)?;

        let device = &ctx.device;
        let params = FrameParams::default();

        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Render Uniform Buffer"),
            size: std::mem::size_of::<FrameParams>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Render Bind Group Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Render Bind Group"),
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        let pipeline = validated(device, PROGRAM, || {
            let vertex = compile_glsl(device, "Render Vertex Shader", QUAD_VERTEX_GLSL, naga::ShaderStage::Vertex);
            let fragment = compile_glsl(device, "Render Fragment Shader", fragment_source, naga::ShaderStage::Fragment);

            let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("Render Pipeline Layout"),
                bind_group_layouts: &[&bind_group_layout],
                push_constant_ranges: &[],
            });

            device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some("Render Pipeline"),
                layout: Some(&layout),
                vertex: wgpu::VertexState {
                    module: &vertex,
                    entry_point: Some("main"),
                    buffers: &[quad::vertex_layout()],
                    compilation_options: Default::default(),
                },
                fragment: Some(wgpu::FragmentState {
                    module: &fragment,
                    entry_point: Some("main"),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: ctx.format(),
                        blend: Some(wgpu::BlendState::REPLACE),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                    compilation_options: Default::default(),
                }),
                primitive: wgpu::PrimitiveState::default(),
                depth_stencil: None,
                multisample: wgpu::MultisampleState::default(),
                multiview: None,
                cache: None,
            })
        })?;

        Ok(Self {
            _pipeline: pipeline,
            uniform_buffer,
            _bind_group: bind_group,
            interface,
            params,
        })
    }

    /// Write `u_time`
    pub fn set_time(&mut self, ctx: &GpuContext, time: f32) -> Result<(), FrameError> {
        let uniforms = UniformSet::new().with(UniformName::Time, UniformValue::Float(time));
        uniforms.validate(PROGRAM, &self.interface)?;
        uniforms.apply_to(&mut self.params);
        ctx.queue
            .write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(&self.params));
        Ok(())
    }
}
