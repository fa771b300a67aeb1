//! Compute dispatch stage: output image + double-buffered storage state

use super::ping_pong::PingPong;
use super::program::{compile_glsl, validated};
use super::storage::{create_storage_buffer, read_f32_buffer, seed_ramp};
use super::texture::{OUTPUT_FORMAT, OutputTexture};
use crate::config::WorkgroupSize;
use crate::error::FrameError;
use crate::shader::{ShaderInterface, reflect};
use crate::uniforms::{FrameParams, UniformName, UniformSet, UniformValue};

const PROGRAM: &str = "compute";

// Binding points shared with compute.glsl
const IMAGE_BINDING: u32 = 0;
const STATE_OUT_BINDING: u32 = 1;
const STATE_IN_BINDING: u32 = 2;
const PARAMS_BINDING: u32 = 3;

/// Pixels reached by a `groups` dispatch of `local`-sized workgroups
fn covered_pixels(local: [u32; 3], groups: WorkgroupSize) -> (u32, u32) {
    (
        local[0].saturating_mul(groups.x),
        local[1].saturating_mul(groups.y),
    )
}

pub struct ComputeStage {
    pipeline: wgpu::ComputePipeline,
    uniform_buffer: wgpu::Buffer,

    // State buffers. The front is read (binding 2), the back written (binding 1).
    state: PingPong<wgpu::Buffer>,
    // bind_groups[i] reads slot i and writes the other one
    bind_groups: [wgpu::BindGroup; 2],

    interface: ShaderInterface,
    params: FrameParams,
    workgroups: WorkgroupSize,
}

impl ComputeStage {
    /// Compile the (already substituted) compute source and allocate its buffers
    pub fn new(
        device: &wgpu::Device,
        source: &str,
        output: &OutputTexture,
        workgroups: WorkgroupSize,
    ) -> Result<Self, FrameError> {
        let interface = reflect(PROGRAM, source, naga::ShaderStage::Compute)?;

        let limit = device.limits().max_compute_invocations_per_workgroup;
        let local = interface.workgroup_size().unwrap_or([1, 1, 1]);
        let requested = local.iter().fold(1u32, |acc, n| acc.saturating_mul(*n));
        if requested > limit {
            return Err(FrameError::WorkgroupTooLarge { requested, limit });
        }

        let resolution = output.size();
        let covered = covered_pixels(local, workgroups);
        if covered.0 < resolution.0 || covered.1 < resolution.1 {
            log::warn!(
                "Compute grid covers {}x{} pixels of the {}x{} output; the rest keeps its previous contents",
                covered.0,
                covered.1,
                resolution.0,
                resolution.1
            );
        }

        let params = FrameParams::new(resolution);
        // Fail at startup rather than on the first frame
        UniformSet::new()
            .with(UniformName::Time, UniformValue::Float(0.0))
            .with(UniformName::Resolution, UniformValue::Vec2(params.resolution))
            .validate(PROGRAM, &interface)?;

        let storage_entry = |binding: u32, read_only: bool| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::COMPUTE,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Storage { read_only },
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        };

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Compute Bind Group Layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: IMAGE_BINDING,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::StorageTexture {
                        access: wgpu::StorageTextureAccess::WriteOnly,
                        format: OUTPUT_FORMAT,
                        view_dimension: wgpu::TextureViewDimension::D2,
                    },
                    count: None,
                },
                storage_entry(STATE_OUT_BINDING, false),
                storage_entry(STATE_IN_BINDING, true),
                wgpu::BindGroupLayoutEntry {
                    binding: PARAMS_BINDING,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
            ],
        });

        let pipeline = validated(device, PROGRAM, || {
            let module = compile_glsl(device, "Compute Shader", source, naga::ShaderStage::Compute);

            let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("Compute Pipeline Layout"),
                bind_group_layouts: &[&bind_group_layout],
                push_constant_ranges: &[],
            });

            device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
                label: Some("Compute Pipeline"),
                layout: Some(&pipeline_layout),
                module: &module,
                entry_point: Some("main"),
                compilation_options: Default::default(),
                cache: None,
            })
        })?;

        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Compute Uniform Buffer"),
            size: std::mem::size_of::<FrameParams>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        // Both slots start from the same ramp so either generation is a valid input
        let seed = seed_ramp(resolution.0 as usize * resolution.1 as usize * 4);
        let state = PingPong::new(
            create_storage_buffer(device, "Compute State A", &seed),
            create_storage_buffer(device, "Compute State B", &seed),
        );

        let create_bind_group = |label: &str, input: &wgpu::Buffer, output_buf: &wgpu::Buffer| {
            device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some(label),
                layout: &bind_group_layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: IMAGE_BINDING,
                        resource: wgpu::BindingResource::TextureView(output.view()),
                    },
                    wgpu::BindGroupEntry {
                        binding: STATE_OUT_BINDING,
                        resource: output_buf.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: STATE_IN_BINDING,
                        resource: input.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: PARAMS_BINDING,
                        resource: uniform_buffer.as_entire_binding(),
                    },
                ],
            })
        };

        // Slot 0 is the front while front_index() == 0
        let bind_groups = [
            create_bind_group("Compute Bind Group (A -> B)", state.front(), state.back()),
            create_bind_group("Compute Bind Group (B -> A)", state.back(), state.front()),
        ];

        log::info!(
            "Compute enabled: local size {:?}, dispatch {}x{} groups, uniforms {:?}",
            local,
            workgroups.x,
            workgroups.y,
            interface
                .uniforms()
                .filter_map(UniformName::from_glsl)
                .collect::<Vec<_>>()
        );

        Ok(Self {
            pipeline,
            uniform_buffer,
            state,
            bind_groups,
            interface,
            params,
            workgroups,
        })
    }

    fn write_uniforms(&mut self, queue: &wgpu::Queue, uniforms: &UniformSet) -> Result<(), FrameError> {
        uniforms.validate(PROGRAM, &self.interface)?;
        uniforms.apply_to(&mut self.params);
        queue.write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(&self.params));
        Ok(())
    }

    fn encode_dispatch(&self, device: &wgpu::Device, queue: &wgpu::Queue) {
        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Compute Encoder"),
        });

        {
            let mut compute_pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("Compute Pass"),
                timestamp_writes: None,
            });

            compute_pass.set_pipeline(&self.pipeline);
            compute_pass.set_bind_group(0, &self.bind_groups[self.state.front_index()], &[]);

            // Fixed grid; covering the resolution is up to the configured size
            compute_pass.dispatch_workgroups(self.workgroups.x, self.workgroups.y, 1);
        }

        queue.submit(std::iter::once(encoder.finish()));
    }

    /// Per-frame dispatch. Reads the front state and never swaps, so repeated
    /// draws with the same uniforms write the same texture.
    pub fn dispatch(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        uniforms: &UniformSet,
    ) -> Result<(), FrameError> {
        self.write_uniforms(queue, uniforms)?;
        self.encode_dispatch(device, queue);
        Ok(())
    }

    /// Iterative dispatch: read front, write back, swap, and return the new
    /// front read back to the host.
    pub fn run_compute(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        uniforms: &UniformSet,
    ) -> Result<Vec<f32>, FrameError> {
        self.write_uniforms(queue, uniforms)?;
        self.encode_dispatch(device, queue);
        self.state.swap();
        self.read_front(device, queue)
    }

    /// Contents of the buffer the next dispatch will read
    pub fn read_front(&self, device: &wgpu::Device, queue: &wgpu::Queue) -> Result<Vec<f32>, FrameError> {
        read_f32_buffer(device, queue, self.state.front())
    }
}
