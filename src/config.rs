//! Per-user developer configuration
//!
//! An optional TOML document at `~/.html2exe/config.toml`:
//!
//! ```toml
//! [window]
//! width = 1280
//! height = 800
//!
//! [build]
//! debug = true
//! ```
//!
//! Values are looked up by dotted path (`window.width`). A missing file
//! yields the built-in defaults; an unreadable one is logged and ignored.

use crate::pipeline::{DEFAULT_HEIGHT, DEFAULT_WIDTH};
use crate::{PackError, PackResult};
use std::path::{Path, PathBuf};
use toml::{Table, Value};

/// Directory under the home directory holding the config file
pub const CONFIG_DIR: &str = ".html2exe";

/// Config file name
pub const CONFIG_FILE: &str = "config.toml";

/// Developer configuration document
#[derive(Debug, Clone, Default)]
pub struct DevConfig {
    path: Option<PathBuf>,
    data: Table,
}

impl DevConfig {
    /// Default location of the config file
    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(CONFIG_DIR).join(CONFIG_FILE))
    }

    /// Load from the default location
    pub fn load() -> Self {
        match Self::default_path() {
            Some(path) => Self::load_from(path),
            None => {
                tracing::debug!("No home directory, using default configuration");
                Self::defaults()
            }
        }
    }

    /// Load from `path`, falling back to defaults when it does not exist
    pub fn load_from(path: impl Into<PathBuf>) -> Self {
        let path = path.into();

        if !path.exists() {
            tracing::debug!("No config at {}, using defaults", path.display());
            return Self {
                path: Some(path),
                ..Self::defaults()
            };
        }

        let data = match Self::read(&path) {
            Ok(data) => data,
            Err(e) => {
                tracing::warn!("Ignoring config {}: {}", path.display(), e);
                Table::new()
            }
        };

        Self {
            path: Some(path),
            data,
        }
    }

    /// Parse a config document
    pub fn parse(content: &str) -> PackResult<Self> {
        let data = toml::from_str::<Table>(content)
            .map_err(|e| PackError::Config(format!("Failed to parse config: {}", e)))?;
        Ok(Self { path: None, data })
    }

    fn read(path: &Path) -> PackResult<Table> {
        let content = std::fs::read_to_string(path)?;
        Ok(Self::parse(&content)?.data)
    }

    /// Built-in defaults used when no config file exists
    pub fn defaults() -> Self {
        let mut window = Table::new();
        window.insert("width".to_string(), Value::Integer(DEFAULT_WIDTH.into()));
        window.insert("height".to_string(), Value::Integer(DEFAULT_HEIGHT.into()));
        window.insert("resizable".to_string(), Value::Boolean(true));

        let mut build = Table::new();
        build.insert("debug".to_string(), Value::Boolean(false));

        let mut data = Table::new();
        data.insert("window".to_string(), Value::Table(window));
        data.insert("build".to_string(), Value::Table(build));

        Self { path: None, data }
    }

    /// File this config was loaded from
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Look up a value by dotted path
    pub fn get(&self, key: &str) -> Option<&Value> {
        let mut parts = key.split('.');
        let mut value = self.data.get(parts.next()?)?;
        for part in parts {
            value = value.as_table()?.get(part)?;
        }
        Some(value)
    }

    /// Positive integer at `key`
    pub fn get_u32(&self, key: &str) -> Option<u32> {
        self.get(key)
            .and_then(Value::as_integer)
            .and_then(|v| u32::try_from(v).ok())
            .filter(|v| *v > 0)
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(Value::as_bool)
    }

    /// Default window width
    pub fn window_width(&self) -> u32 {
        self.get_u32("window.width").unwrap_or(DEFAULT_WIDTH)
    }

    /// Default window height
    pub fn window_height(&self) -> u32 {
        self.get_u32("window.height").unwrap_or(DEFAULT_HEIGHT)
    }

    /// Whether packaged apps get developer tools
    pub fn debug(&self) -> bool {
        self.get_bool("build.debug").unwrap_or(false)
    }
}
