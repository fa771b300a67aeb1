//! GLSL compilation shared by the render, display and compute programs

use std::borrow::Cow;

use crate::error::ShaderError;

/// Vertex stage for the full-screen quad, shared by render and display programs
pub const QUAD_VERTEX_GLSL: &str = r"#version 450
layout(location = 0) in vec2 in_vert;
layout(location = 1) in vec2 in_uv;
layout(location = 0) out vec2 uv;

void main() {
    gl_Position = vec4(in_vert, 0.0, 1.0);
    uv = in_uv;
}
";

/// Compile GLSL through wgpu's naga front end
pub fn compile_glsl(
    device: &wgpu::Device,
    label: &str,
    source: &str,
    stage: naga::ShaderStage,
) -> wgpu::ShaderModule {
    device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(label),
        source: wgpu::ShaderSource::Glsl {
            shader: Cow::Owned(source.to_string()),
            stage,
            defines: Default::default(),
        },
    })
}

/// Run `build` inside a validation error scope.
///
/// wgpu reports shader and pipeline errors asynchronously; this turns them into
/// a startup error for `program` instead of the default panic handler.
pub fn validated<T>(
    device: &wgpu::Device,
    program: &str,
    build: impl FnOnce() -> T,
) -> Result<T, ShaderError> {
    device.push_error_scope(wgpu::ErrorFilter::Validation);
    let built = build();
    match pollster::block_on(device.pop_error_scope()) {
        None => Ok(built),
        Some(err) => Err(ShaderError::Compile {
            program: program.to_string(),
            message: err.to_string(),
        }),
    }
}
