//! Configuration: CLI arguments, config file, parameter translation

mod args;
mod file;
pub mod params;

pub use args::{Args, Command};
pub use file::BridgeConfig;
