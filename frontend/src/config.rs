// Persistent configuration: default zoom, ROM path, FPS overlay.
// Stored as TOML in <config_dir>/toumapet/config.toml

use std::path::PathBuf;

use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Window scale used when --zoom is not given (clamped to 1..=5).
    pub zoom: Option<u32>,
    /// ROM path used when --rom is not given.
    pub rom: Option<PathBuf>,
    /// Start with the FPS overlay on.
    pub show_fps: bool,
}

impl Config {
    /// Path to the config file, if the platform has a config directory.
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("toumapet").join("config.toml"))
    }

    /// Load from disk; a missing or invalid file falls back to defaults.
    pub fn load() -> Self {
        let Some(path) = Self::config_path() else {
            return Self::default();
        };
        let Ok(text) = std::fs::read_to_string(&path) else {
            return Self::default();
        };
        match toml::from_str(&text) {
            Ok(cfg) => cfg,
            Err(e) => {
                log::warn!("ignoring invalid config {}: {e}", path.display());
                Self::default()
            }
        }
    }
}
