//! Simple configuration persistence for REEL
//!
//! Plain key=value file; unknown keys are ignored so older configs keep
//! working.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use reel_audio::TransportConfig;

/// Application configuration
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Rate used for rewind and fast-forward
    pub fast_rate: f64,
    /// Double-press stop window in milliseconds
    pub double_click_ms: u64,
    /// Theme name
    pub theme: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            fast_rate: 5.0,
            double_click_ms: 250,
            theme: "walnut".to_string(),
        }
    }
}

impl Config {
    /// Load config from the default location
    ///
    /// Returns default config if the file doesn't exist or can't be parsed.
    pub fn load() -> Self {
        let path = Self::config_path();
        Self::load_from(&path).unwrap_or_default()
    }

    /// Load config from a specific path
    pub fn load_from(path: &Path) -> io::Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(Self::parse(&content))
    }

    /// Get the default config file path
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("reel")
            .join("config.txt")
    }

    /// Transport parameters derived from this config.
    pub fn transport(&self) -> TransportConfig {
        TransportConfig {
            fast_rate: self.fast_rate,
            double_click_window: self.double_click_ms as f64 / 1000.0,
        }
    }

    /// Parse config from simple key=value format
    fn parse(content: &str) -> Self {
        let mut config = Self::default();

        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            if let Some((key, value)) = line.split_once('=') {
                let key = key.trim();
                let value = value.trim();

                match key {
                    "fast_rate" => {
                        if let Ok(rate) = value.parse::<f64>() {
                            if rate > 0.0 {
                                config.fast_rate = rate;
                            }
                        }
                    }
                    "double_click_ms" => {
                        if let Ok(ms) = value.parse::<u64>() {
                            config.double_click_ms = ms;
                        }
                    }
                    "theme" => {
                        if !value.is_empty() {
                            config.theme = value.to_string();
                        }
                    }
                    _ => {} // Ignore unknown keys
                }
            }
        }

        config
    }
}
