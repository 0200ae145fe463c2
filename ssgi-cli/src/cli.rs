use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(
    name = "ssgi-demo",
    about = "Screen-space global illumination demo renderer",
    version
)]
pub struct Cli {
    /// Log level used when RUST_LOG is not set
    #[arg(long, global = true, value_enum)]
    pub log_level: Option<LogLevel>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Open the 1600x900 demo window (default)
    Window {
        /// Close after this many frames
        #[arg(long)]
        frames: Option<u64>,
    },
    /// Render frames on the CPU device and write PNGs
    Capture {
        /// Number of frames to render; the last one is written
        #[arg(long, default_value_t = 1)]
        frames: u64,
        /// Output directory
        #[arg(short, long, default_value = "capture")]
        out: PathBuf,
        #[arg(long, default_value_t = 1600)]
        width: u32,
        #[arg(long, default_value_t = 900)]
        height: u32,
        /// Also write color, depth, position and AO buffers
        #[arg(long)]
        buffers: bool,
        /// Override the composite strength
        #[arg(long)]
        strength: Option<f32>,
        /// Skip the two blur passes
        #[arg(long)]
        no_blur: bool,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_filter(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_capture_arguments() {
        let cli = Cli::try_parse_from([
            "ssgi-demo",
            "capture",
            "--frames",
            "3",
            "--out",
            "shots",
            "--buffers",
            "--strength",
            "0.5",
        ])
        .unwrap();
        match cli.command {
            Some(Command::Capture {
                frames,
                out,
                buffers,
                strength,
                width,
                ..
            }) => {
                assert_eq!(frames, 3);
                assert_eq!(out, PathBuf::from("shots"));
                assert!(buffers);
                assert_eq!(strength, Some(0.5));
                assert_eq!(width, 1600);
            }
            _ => panic!("expected capture"),
        }
    }

    #[test]
    fn test_no_subcommand_is_window() {
        let cli = Cli::try_parse_from(["ssgi-demo", "--log-level", "debug"]).unwrap();
        assert!(cli.command.is_none());
        assert!(matches!(cli.log_level, Some(LogLevel::Debug)));
    }
}
