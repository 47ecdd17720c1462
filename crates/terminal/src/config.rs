//! Terminal configuration
//!
//! Loaded from an optional TOML file (`serial-term.toml` in the working
//! directory unless a path is given) with `SERTERM__` environment overrides,
//! e.g. `SERTERM__BAUD_RATE=921600` or `SERTERM__SESSION__BUFFER_CAPACITY=1048576`.

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use session::SessionConfig;
use std::path::{Path, PathBuf};

/// Default config file name, looked up when no path is given
const DEFAULT_CONFIG_NAME: &str = "serial-term";

/// Terminal configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerminalConfig {
    /// Port opened at startup, if any
    pub port: Option<String>,

    /// Baud rate for startup and for `open` without a baud argument
    pub baud_rate: u32,

    /// Capture file used by `log on` without a file argument
    pub log_path: PathBuf,

    /// Tracing level (error, warn, info, debug, trace)
    pub log_level: String,

    /// Byte count for `dump` without an argument
    pub dump_default: usize,

    /// Buffer and worker settings
    pub session: SessionConfig,
}

impl Default for TerminalConfig {
    fn default() -> Self {
        Self {
            port: None,
            baud_rate: serial_link::DEFAULT_BAUD_RATE,
            log_path: PathBuf::from("serial.log"),
            log_level: "info".to_string(),
            dump_default: 256,
            session: SessionConfig::default(),
        }
    }
}

impl TerminalConfig {
    /// Load from `path` (required if given) plus environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let file = match path {
            Some(path) => File::from(path).required(true),
            None => File::with_name(DEFAULT_CONFIG_NAME).required(false),
        };

        Config::builder()
            .add_source(file)
            .add_source(
                Environment::with_prefix("SERTERM")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use session::ViewMode;

    #[test]
    fn test_defaults() {
        let config = TerminalConfig::default();
        assert_eq!(config.baud_rate, 115_200);
        assert_eq!(config.dump_default, 256);
        assert_eq!(config.log_path, PathBuf::from("serial.log"));
        assert!(config.port.is_none());
    }

    #[test]
    fn test_load_file_with_partial_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("term.toml");
        std::fs::write(
            &path,
            r#"
port = "/dev/ttyACM0"
baud_rate = 921600

[session]
buffer_capacity = 1024
view = "hex"
live = false
"#,
        )
        .unwrap();

        let config = TerminalConfig::load(Some(&path)).unwrap();
        assert_eq!(config.port.as_deref(), Some("/dev/ttyACM0"));
        assert_eq!(config.baud_rate, 921_600);
        assert_eq!(config.session.buffer_capacity, 1024);
        assert_eq!(config.session.view, ViewMode::Hex);
        assert!(!config.session.live);
        assert_eq!(config.session.read_chunk, 4096);
        assert_eq!(config.dump_default, 256);
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(TerminalConfig::load(Some(&dir.path().join("absent.toml"))).is_err());
    }
}
