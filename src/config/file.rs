//! Config file support for the demo binary

use crate::config::params;
use crate::driver::StreamParams;
use crate::error::{BridgeError, Result};
use crate::format::SampleFormat;
use serde::{Deserialize, Serialize};
use std::path::Path;
use toml::value::Table;

/// Stream configuration loaded from a TOML file.
///
/// The per-direction `output`/`input` entries stay as raw tables; they go
/// through the parameter translator like any other loose record.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Sample rate in Hz
    pub sample_rate: u32,

    /// Frames per buffer
    pub frames_per_buffer: u32,

    /// Sample format name (sint8, sint16, sint24, sint32, float32, float64)
    pub format: String,

    /// Output-side parameter record
    #[serde(default)]
    pub output: Option<Table>,

    /// Input-side parameter record
    #[serde(default)]
    pub input: Option<Table>,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44100,
            frames_per_buffer: 512,
            format: "float32".to_string(),
            output: None,
            input: None,
        }
    }
}

impl BridgeConfig {
    /// Load configuration from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            BridgeError::config(format!("failed to read '{}': {}", path.display(), e))
        })?;

        toml::from_str(&content).map_err(|e| {
            BridgeError::config(format!("failed to parse '{}': {}", path.display(), e))
        })
    }

    /// Load configuration from default locations.
    ///
    /// Searches the executable directory for rtbridge.toml, then the user
    /// config directory for rtbridge/config.toml. Falls back to defaults.
    pub fn load_default() -> Result<Self> {
        if let Ok(exe_path) = std::env::current_exe() {
            if let Some(exe_dir) = exe_path.parent() {
                let config_path = exe_dir.join("rtbridge.toml");
                if config_path.exists() {
                    return Self::load(&config_path);
                }
            }
        }

        if let Some(config_dir) = dirs::config_dir() {
            let config_path = config_dir.join("rtbridge").join("config.toml");
            if config_path.exists() {
                return Self::load(&config_path);
            }
        }

        Ok(Self::default())
    }

    /// Save configuration to a TOML file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let content = toml::to_string_pretty(self)
            .map_err(|e| BridgeError::config(format!("failed to serialize config: {}", e)))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                BridgeError::config(format!("failed to create '{}': {}", parent.display(), e))
            })?;
        }

        std::fs::write(path, content).map_err(|e| {
            BridgeError::config(format!("failed to write '{}': {}", path.display(), e))
        })
    }

    /// Parse the configured sample format
    pub fn sample_format(&self) -> Result<SampleFormat> {
        self.format.parse()
    }

    /// Translate the output-side record, if present
    pub fn output_params(&self) -> Result<Option<StreamParams>> {
        self.output.as_ref().map(params::from_table).transpose()
    }

    /// Translate the input-side record, if present
    pub fn input_params(&self) -> Result<Option<StreamParams>> {
        self.input.as_ref().map(params::from_table).transpose()
    }

    /// Generate a sample configuration file content
    pub fn sample_config() -> String {
        r#"# rtbridge stream configuration

# Sample rate in Hz (default: 44100)
sample_rate = 44100

# Frames per buffer (default: 512)
frames_per_buffer = 512

# Sample format: sint8, sint16, sint24, sint32, float32, float64
format = "float32"

# Output-side stream parameters. Remove the section for capture-only use.
[output]
device_id = 0
channels = 2
first_channel = 0

# Input-side stream parameters. Uncomment for capture or duplex streams.
# [input]
# device_id = 1
# channels = 2
# first_channel = 0
"#
        .to_string()
    }
}
