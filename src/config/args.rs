//! CLI argument parsing using clap

use clap::{Parser, Subcommand};

/// rtbridge - realtime audio callback bridge
///
/// Drive host callbacks through the dummy driver backend
#[derive(Parser, Debug)]
#[command(name = "rtbridge")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Verbose output (can be repeated for more verbosity)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode - only show errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Log output to file
    #[arg(long, global = true)]
    pub log: Option<String>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// List all audio devices
    List {
        /// Show channel capabilities per device
        #[arg(long)]
        show_channels: bool,
    },

    /// Show detailed device information
    Info {
        /// Device index to show info for
        device_id: u32,
    },

    /// Open a render stream and play a generated tone through the bridge
    Run {
        /// Config file path (default: standard config locations)
        #[arg(short, long)]
        config: Option<String>,

        /// Output device index (default: driver default output)
        #[arg(short, long)]
        device: Option<u32>,

        /// Sample rate in Hz
        #[arg(short = 'r', long, default_value = "44100")]
        sample_rate: u32,

        /// Frames per buffer
        #[arg(short, long, default_value = "512")]
        frames: u32,

        /// Sample format (sint8, sint16, sint24, sint32, float32, float64)
        #[arg(long, default_value = "float32")]
        format: String,

        /// Seconds to run (default: until Ctrl+C)
        #[arg(short = 't', long)]
        seconds: Option<f64>,
    },
}

impl Args {
    /// Get the log level based on verbose/quiet flags
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else {
            match self.verbose {
                0 => tracing::Level::INFO,
                1 => tracing::Level::DEBUG,
                _ => tracing::Level::TRACE,
            }
        }
    }
}

impl Default for Command {
    fn default() -> Self {
        Command::List {
            show_channels: false,
        }
    }
}
