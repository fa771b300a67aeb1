mod config;
mod error;
mod frame;
mod gpu;
mod shader;
mod uniforms;
mod window;

#[cfg(test)]
mod tests;

use clap::Parser;

use crate::config::{AppConfig, Cli};

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let config = AppConfig::from(Cli::parse());
    log::info!(
        "Opening {}x{} window, workgroups {}x{}",
        config.width,
        config.height,
        config.workgroups.x,
        config.workgroups.y
    );

    window::run(config)
}
