//! Error types for shader loading, uniform binding and the frame pipeline

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ShaderError {
    #[error("shader not found at {0}")]
    NotFound(PathBuf),

    #[error("failed to read shader {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {program} shader: {message}")]
    Parse { program: String, message: String },

    #[error("failed to compile {program} shader: {message}")]
    Compile { program: String, message: String },
}

#[derive(Debug, Error, PartialEq)]
pub enum UniformError {
    #[error("{program} program has no uniform named `{name}`")]
    NotFound { program: String, name: &'static str },

    #[error("uniform `{name}` expects a {expected}, got a {actual}")]
    TypeMismatch {
        name: &'static str,
        expected: &'static str,
        actual: &'static str,
    },
}

#[derive(Debug, Error)]
pub enum ContextError {
    #[error("failed to create surface: {0}")]
    Surface(#[from] wgpu::CreateSurfaceError),

    #[error("no suitable GPU adapter found")]
    NoAdapter,

    #[error("adapter {0} does not support compute shaders")]
    ComputeUnsupported(String),

    #[error("failed to create device: {0}")]
    Device(#[from] wgpu::RequestDeviceError),
}

#[derive(Debug, Error)]
pub enum FrameError {
    #[error(transparent)]
    Context(#[from] ContextError),

    #[error(transparent)]
    Shader(#[from] ShaderError),

    #[error(transparent)]
    Uniform(#[from] UniformError),

    #[error("workgroup of {requested} invocations exceeds the device limit of {limit}")]
    WorkgroupTooLarge { requested: u32, limit: u32 },

    #[error("surface error: {0}")]
    Surface(#[from] wgpu::SurfaceError),

    #[error("storage buffer readback failed: {0}")]
    Readback(#[from] wgpu::BufferAsyncError),

    #[error("storage buffer readback was dropped before completing")]
    ReadbackDisconnected,
}
