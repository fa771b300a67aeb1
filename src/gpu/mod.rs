//! GPU side of the frame pipeline using wgpu
//!
//! Context setup, the three programs, the output texture and the
//! double-buffered compute state.

pub mod compute;
pub mod context;
pub mod display;
pub mod ping_pong;
pub mod program;
pub mod quad;
pub mod render;
pub mod resources;
pub mod storage;
pub mod texture;

pub use resources::GpuBackend;
