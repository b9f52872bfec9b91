use crate::config::api_config::{ApiConfig, Header};
use crate::error::{FunifierError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Application settings read from `config.toml`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api: ApiSettings,
    pub export: ExportSettings,
    pub display: DisplaySettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiSettings {
    /// Host of the Funifier service, without scheme
    pub base_url: String,

    /// API version prefix, e.g. "v3"
    pub version: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub accept: Option<String>,

    /// Range header, controls how many items the aggregate endpoints return
    #[serde(skip_serializing_if = "Option::is_none")]
    pub range: Option<String>,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportSettings {
    /// Directory for CSV files (current directory when unset)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplaySettings {
    /// Print the result table to the terminal
    pub show_table: bool,

    /// Rows printed before the table is truncated
    pub max_display_rows: usize,

    pub use_colors: bool,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: "eu1.service.funifier.com".to_string(),
            version: "v3".to_string(),
            content_type: Some("application/json".to_string()),
            accept: None,
            range: Some("items=0-1000000".to_string()),
            timeout_secs: 60,
        }
    }
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            show_table: true,
            max_display_rows: 50,
            use_colors: true,
        }
    }
}

impl ApiSettings {
    pub fn header(&self) -> Header {
        Header {
            content_type: self.content_type.clone(),
            accept: self.accept.clone(),
            range: self.range.clone(),
        }
        .normalized()
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }

    /// Combine these settings with user-supplied credentials
    pub fn api_config(&self, api_key: &str, app_secret: &str) -> Result<ApiConfig> {
        Ok(ApiConfig::new(api_key, app_secret, &self.base_url, &self.version)?
            .with_header(self.header()))
    }
}

impl Config {
    /// Load config from the default location, falling back to defaults when
    /// no file exists yet
    pub fn load() -> Result<Self> {
        let config_path = Self::get_config_path()?;
        Self::load_from(&config_path)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!("No config file at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path).map_err(|e| {
            FunifierError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        toml::from_str(&contents)
            .map_err(|e| FunifierError::Config(format!("invalid {}: {}", path.display(), e)))
    }

    /// Get the default config file path
    pub fn get_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir().ok_or_else(|| {
            FunifierError::Config("could not determine config directory".to_string())
        })?;

        Ok(config_dir.join("funifier-lottery").join("config.toml"))
    }

    /// Create a default config file with comments
    pub fn create_default_with_comments() -> String {
        r#"# Funifier Lottery Configuration File
# Location: ~/.config/funifier-lottery/config.toml (Linux)
#           ~/Library/Application Support/funifier-lottery/config.toml (macOS)
#           %APPDATA%\funifier-lottery\config.toml (Windows)

[api]
# Host of the Funifier service (no scheme, https is used)
base_url = "eu1.service.funifier.com"

# API version prefix used in every route
version = "v3"

content_type = "application/json"

# accept = "application/json"

# Items requested from aggregate endpoints
range = "items=0-1000000"

# Request timeout in seconds
timeout_secs = 60

[export]
# Directory for CSV files (leave commented to use the current directory)
# output_dir = "/path/to/exports"

[display]
# Print results as a table before exporting
show_table = true

# Rows shown in the terminal (the CSV always contains every row)
max_display_rows = 50

use_colors = true
"#
        .to_string()
    }
}
