//! Configuration file support

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Configuration for litrev
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Review service base URL
    pub api_url: Option<String>,
    /// Model the service should use for new reviews
    pub model: Option<String>,
    /// Papers per review
    pub num_papers: Option<u32>,
    /// Color theme (dark, light)
    pub theme: Option<String>,
    /// Whether to use TUI mode by default
    pub tui: Option<bool>,
    /// Wait before opening a review stream, in milliseconds
    pub subscribe_delay_ms: Option<u64>,
    /// Timeout for the JSON endpoints, in seconds
    pub request_timeout_secs: Option<u64>,
    /// Directory holding the persisted session
    pub session_dir: Option<String>,
}

impl Config {
    /// Get the config directory
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("litrev")
    }

    /// Get the config file path, honoring `LITREV_CONFIG_PATH`
    pub fn config_path() -> PathBuf {
        if let Ok(path) = std::env::var("LITREV_CONFIG_PATH") {
            return PathBuf::from(path);
        }
        Self::config_dir().join("config.toml")
    }

    /// Directory for the persisted session and theme
    pub fn data_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("litrev")
    }

    /// Load config from the default location
    pub fn load() -> Self {
        Self::load_from(&Self::config_path())
    }

    /// Load config from `path`; missing or broken files yield defaults
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }

        match fs::read_to_string(path) {
            Ok(content) => match toml::from_str(&content) {
                Ok(config) => config,
                Err(e) => {
                    eprintln!("Warning: Failed to parse config file: {}", e);
                    Self::default()
                }
            },
            Err(e) => {
                eprintln!("Warning: Failed to read config file: {}", e);
                Self::default()
            }
        }
    }

    /// Save config to `path`
    pub fn save_to(&self, path: &Path) -> std::io::Result<()> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }
        let content = toml::to_string_pretty(self).map_err(std::io::Error::other)?;
        fs::write(path, content)
    }

    /// Create a default config file if it doesn't exist
    pub fn init() -> std::io::Result<PathBuf> {
        let path = Self::config_path();
        if path.exists() {
            return Ok(path);
        }

        let default_config = Config {
            api_url: Some(litrev_api::DEFAULT_API_URL.to_string()),
            model: Some(crate::form::DEFAULT_MODEL.to_string()),
            num_papers: Some(crate::form::DEFAULT_NUM_PAPERS),
            theme: Some("dark".to_string()),
            tui: Some(true),
            subscribe_delay_ms: Some(0),
            request_timeout_secs: Some(litrev_api::DEFAULT_REQUEST_TIMEOUT.as_secs()),
            session_dir: None,
        };

        default_config.save_to(&path)?;
        Ok(path)
    }

    /// Session directory from config, or the platform data directory
    pub fn session_dir(&self) -> PathBuf {
        self.session_dir
            .as_ref()
            .map(PathBuf::from)
            .unwrap_or_else(Self::data_dir)
    }
}

/// Generate example config content
pub fn example_config() -> &'static str {
    r#"# litrev configuration file
# Place at ~/.config/litrev/config.toml (Linux) or set LITREV_CONFIG_PATH

# Review service base URL
api_url = "http://localhost:8000"

# Model used for new reviews (gpt-4o-mini, gpt-4o, gpt-4-turbo)
model = "gpt-4o-mini"

# Number of papers per review
num_papers = 5

# Color theme (dark, light)
theme = "dark"

# Whether to use TUI mode by default
# Set to false for line-oriented output
tui = true

# Wait this long before opening a review stream (milliseconds)
subscribe_delay_ms = 0

# Timeout for regular API requests (seconds); streams never time out
request_timeout_secs = 30

# Where the last review session is kept (optional)
# session_dir = "~/.local/share/litrev"
"#
}
