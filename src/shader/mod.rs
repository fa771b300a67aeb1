//! Shader source loading and uniform reflection

pub mod reflect;
pub mod source;

pub use reflect::{ShaderInterface, reflect};
pub use source::{load_compute_source, load_source};
