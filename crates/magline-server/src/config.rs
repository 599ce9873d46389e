//! Server Options
//!
//! Host/port options for the magline server, loadable from TOML or JSON.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default listen host
pub const DEFAULT_HOST: &str = "localhost";

/// Default listen port
pub const DEFAULT_PORT: u16 = 9757;

/// Server options
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Options {
    /// Host to serve on
    pub host: String,

    /// Port to serve on
    pub port: u16,

    /// PEM file holding the server's X25519 private key
    /// (a fresh key is generated per run if unset)
    pub private_key_path: Option<PathBuf>,

    /// Log level
    pub log_level: String,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            private_key_path: None,
            log_level: "info".to_string(),
        }
    }
}

/// On-disk formats understood by [`Options::load_from_file`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionsFormat {
    Toml,
    Json,
}

impl OptionsFormat {
    /// Pick the format from a file extension
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("toml") => Ok(Self::Toml),
            Some(ext) if ext.eq_ignore_ascii_case("json") => Ok(Self::Json),
            _ => Err(ConfigError::UnsupportedFormat(path.display().to_string())),
        }
    }
}

impl Options {
    /// Create a new options builder
    pub fn builder() -> OptionsBuilder {
        OptionsBuilder::default()
    }

    /// Load options from a `.toml` or `.json` file
    ///
    /// Fields missing from the file keep their defaults.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let format = OptionsFormat::from_path(path)?;
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::IoError(e.to_string()))?;

        let options = Self::parse(&content, format)?;
        options.validate()?;
        Ok(options)
    }

    /// Parse options from a string in the given format
    pub fn parse(content: &str, format: OptionsFormat) -> Result<Self, ConfigError> {
        match format {
            OptionsFormat::Toml => {
                toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))
            }
            OptionsFormat::Json => {
                serde_json::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))
            }
        }
    }

    /// Save options to a `.toml` or `.json` file
    pub fn save_to_file(&self, path: &Path) -> Result<(), ConfigError> {
        let content = match OptionsFormat::from_path(path)? {
            OptionsFormat::Toml => toml::to_string_pretty(self)
                .map_err(|e| ConfigError::SerializeError(e.to_string()))?,
            OptionsFormat::Json => serde_json::to_string_pretty(self)
                .map_err(|e| ConfigError::SerializeError(e.to_string()))?,
        };

        std::fs::write(path, content).map_err(|e| ConfigError::IoError(e.to_string()))
    }

    /// `host:port`
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Validate options
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.host.trim().is_empty() {
            return Err(ConfigError::InvalidValue("host cannot be empty".into()));
        }

        if self.port == 0 {
            return Err(ConfigError::InvalidValue("port cannot be 0".into()));
        }

        Ok(())
    }
}

/// Options builder
#[derive(Default)]
pub struct OptionsBuilder {
    options: Options,
}

impl OptionsBuilder {
    /// Start from existing options instead of the defaults
    pub fn from_options(options: Options) -> Self {
        Self { options }
    }

    /// Set host
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.options.host = host.into();
        self
    }

    /// Set port
    pub fn port(mut self, port: u16) -> Self {
        self.options.port = port;
        self
    }

    /// Set private key path
    pub fn private_key_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.options.private_key_path = Some(path.into());
        self
    }

    /// Set log level
    pub fn log_level(mut self, level: impl Into<String>) -> Self {
        self.options.log_level = level.into();
        self
    }

    /// Build the options
    pub fn build(self) -> Result<Options, ConfigError> {
        self.options.validate()?;
        Ok(self.options)
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Serialize error: {0}")]
    SerializeError(String),

    #[error("Invalid value: {0}")]
    InvalidValue(String),

    #[error("Unsupported options file (expected .toml or .json): {0}")]
    UnsupportedFormat(String),
}
