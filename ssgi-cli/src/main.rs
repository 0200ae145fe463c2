mod app;
mod capture;
mod cli;

use anyhow::Result;
use clap::Parser;
use ssgi_wgpu::{init_logging, LoggingConfig};

use cli::{Cli, Command};

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(LoggingConfig {
        env_filter: cli.log_level.map(|level| level.as_filter().to_string()),
        ..Default::default()
    });

    match cli.command {
        None => app::run(None),
        Some(Command::Window { frames }) => app::run(frames),
        Some(Command::Capture {
            frames,
            out,
            width,
            height,
            buffers,
            strength,
            no_blur,
        }) => capture::run(capture::CaptureOptions {
            frames,
            out,
            width,
            height,
            buffers,
            strength,
            blur: !no_blur,
        }),
    }
}
