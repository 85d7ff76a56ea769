//! Session configuration
//!
//! Values come from, in order of precedence: command-line arguments, an
//! optional TOML file, built-in defaults. A config file looks like:
//!
//! ```toml
//! device = "/dev/ttyUSB0"
//! baud = 57600
//! write_backoff_ms = 200
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::{Result, TermError};
use crate::relay::DEFAULT_WRITE_BACKOFF;
use crate::serial::{BaudRate, PortConfig};

/// Contents of a config file. Every key is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub device: Option<PathBuf>,
    pub baud: Option<u32>,
    pub write_backoff_ms: Option<u64>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|source| TermError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse_content(&content, path)
    }

    pub fn parse_content(content: &str, path: &Path) -> Result<Self> {
        toml::from_str(content).map_err(|source| TermError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Fully resolved settings for one session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TermConfig {
    pub port: PortConfig,
    pub write_backoff: Duration,
}

impl Default for TermConfig {
    fn default() -> Self {
        Self {
            port: PortConfig::default(),
            write_backoff: DEFAULT_WRITE_BACKOFF,
        }
    }
}

impl TermConfig {
    /// Merge command-line values over the file over defaults.
    ///
    /// Fails with [`TermError::UnsupportedBaud`] before anything is opened
    /// if the effective baud rate is not supported.
    pub fn resolve(device: Option<PathBuf>, baud: Option<u32>, file: FileConfig) -> Result<Self> {
        let defaults = Self::default();

        let baud_rate = match baud.or(file.baud) {
            Some(requested) => BaudRate::try_from(requested)?,
            None => defaults.port.baud_rate,
        };
        let port_path = device.or(file.device).unwrap_or(defaults.port.port_path);
        let write_backoff = file
            .write_backoff_ms
            .map(Duration::from_millis)
            .unwrap_or(defaults.write_backoff);

        Ok(Self {
            port: PortConfig::new(port_path).with_baud_rate(baud_rate),
            write_backoff,
        })
    }
}
