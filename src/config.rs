//! Application configuration and command-line overrides

use std::path::{Path, PathBuf};

use clap::Parser;

pub const SCREEN_WIDTH: u32 = 800;
pub const SCREEN_HEIGHT: u32 = 600;
pub const SCREEN_TITLE: &str = "Compute Shader Minimal";

pub const FRAGMENT_SHADER_FILE: &str = "fragment.glsl";
pub const COMPUTE_SHADER_FILE: &str = "compute.glsl";

/// Workgroup grid used both for the shader's local size tokens and the dispatch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkgroupSize {
    pub x: u32,
    pub y: u32,
}

impl WorkgroupSize {
    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }
}

impl Default for WorkgroupSize {
    fn default() -> Self {
        Self::new(32, 32)
    }
}

/// Everything needed to open the window and build the GPU resources
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Window and output texture width in pixels
    pub width: u32,
    /// Window and output texture height in pixels
    pub height: u32,
    pub title: String,
    /// Directory holding `fragment.glsl` and the optional `compute.glsl`
    pub shader_dir: PathBuf,
    pub workgroups: WorkgroupSize,
    /// Double-buffered compute steps to run before the first frame
    pub warmup_steps: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            width: SCREEN_WIDTH,
            height: SCREEN_HEIGHT,
            title: SCREEN_TITLE.to_string(),
            shader_dir: default_shader_dir(),
            workgroups: WorkgroupSize::default(),
            warmup_steps: 0,
        }
    }
}

impl AppConfig {
    pub fn fragment_path(&self) -> PathBuf {
        self.shader_dir.join(FRAGMENT_SHADER_FILE)
    }

    pub fn compute_path(&self) -> PathBuf {
        self.shader_dir.join(COMPUTE_SHADER_FILE)
    }

    pub fn screen_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

impl From<Cli> for AppConfig {
    fn from(cli: Cli) -> Self {
        let mut config = AppConfig::default();
        if let Some(dir) = cli.shader_dir {
            config.shader_dir = dir;
        }
        config.workgroups = WorkgroupSize::new(cli.group_x, cli.group_y);
        config.warmup_steps = cli.warmup_steps;
        config
    }
}

/// `shaders/` next to the executable, or the crate's own `shaders/` during development
pub fn default_shader_dir() -> PathBuf {
    let beside_exe = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join("shaders")));

    match beside_exe {
        Some(dir) if dir.is_dir() => dir,
        _ => Path::new(env!("CARGO_MANIFEST_DIR")).join("shaders"),
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "computeview",
    version,
    about = "Runs a compute shader every frame and shows its output texture"
)]
pub struct Cli {
    /// Directory containing fragment.glsl and (optionally) compute.glsl
    #[arg(long, value_name = "DIR")]
    pub shader_dir: Option<PathBuf>,

    /// Workgroup size / dispatch count along X
    #[arg(long, value_name = "COUNT", default_value_t = 32, value_parser = clap::value_parser!(u32).range(1..))]
    pub group_x: u32,

    /// Workgroup size / dispatch count along Y
    #[arg(long, value_name = "COUNT", default_value_t = 32, value_parser = clap::value_parser!(u32).range(1..))]
    pub group_y: u32,

    /// Iterate the compute state this many times (swapping buffers) before the first frame
    #[arg(long, value_name = "STEPS", default_value_t = 0)]
    pub warmup_steps: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_window_parameters() {
        let config = AppConfig::default();
        assert_eq!(config.screen_size(), (800, 600));
        assert_eq!(config.title, "Compute Shader Minimal");
        assert_eq!(config.workgroups, WorkgroupSize::new(32, 32));
        assert_eq!(config.warmup_steps, 0);
        assert!(config.fragment_path().ends_with("fragment.glsl"));
        assert!(config.compute_path().ends_with("compute.glsl"));
    }

    #[test]
    fn cli_overrides_shader_dir_and_groups() {
        let cli = Cli::try_parse_from([
            "computeview",
            "--shader-dir",
            "/tmp/custom",
            "--group-x",
            "16",
            "--group-y",
            "8",
            "--warmup-steps",
            "3",
        ])
        .unwrap();
        let config = AppConfig::from(cli);
        assert_eq!(config.shader_dir, PathBuf::from("/tmp/custom"));
        assert_eq!(config.workgroups, WorkgroupSize::new(16, 8));
        assert_eq!(config.warmup_steps, 3);
    }

    #[test]
    fn cli_rejects_zero_group_size() {
        assert!(Cli::try_parse_from(["computeview", "--group-x", "0"]).is_err());
    }
}
