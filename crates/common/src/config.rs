//! Application configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Global application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Directory where session history and exported results are stored.
    pub history_dir: PathBuf,

    /// Frame-loop defaults.
    pub processing: ProcessingDefaults,

    /// Logging configuration.
    pub logging: LoggingConfig,
}

/// Default parameters for the frame-processing loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessingDefaults {
    /// Target frame rate the driver is capped at.
    pub fps: u32,

    /// Pace replayed streams at `fps` instead of processing them as fast as possible.
    pub realtime: bool,

    /// Exercise used when none is given on the command line
    /// (`tricep-pushdown` or `squat`).
    pub exercise: String,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "repcoach=debug,warn").
    pub level: String,

    /// Whether to output structured JSON logs.
    pub json: bool,

    /// Optional log file path.
    pub file: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            history_dir: dirs_default_history(),
            processing: ProcessingDefaults::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for ProcessingDefaults {
    fn default() -> Self {
        Self {
            fps: 30,
            realtime: false,
            exercise: "tricep-pushdown".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            file: None,
        }
    }
}

impl AppConfig {
    /// Load config from the standard location, falling back to defaults.
    pub fn load() -> Self {
        Self::load_from(&config_file_path())
    }

    /// Load config from an explicit path, falling back to defaults.
    pub fn load_from(config_path: &std::path::Path) -> Self {
        if config_path.exists() {
            match std::fs::read_to_string(config_path) {
                Ok(content) => match serde_json::from_str(&content) {
                    Ok(config) => return config,
                    Err(e) => {
                        tracing::warn!("Failed to parse config at {:?}: {}", config_path, e);
                    }
                },
                Err(e) => {
                    tracing::warn!("Failed to read config at {:?}: {}", config_path, e);
                }
            }
        }
        Self::default()
    }

    /// Save config to an explicit path.
    pub fn save_to(&self, config_path: &std::path::Path) -> Result<(), std::io::Error> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(config_path, json)
    }
}

/// Standard config file location.
pub fn config_file_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".config")
        });
    base.join("repcoach").join("config.json")
}

/// Default session history directory.
fn dirs_default_history() -> PathBuf {
    let base = std::env::var("XDG_DATA_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".local").join("share")
        });
    base.join("repcoach").join("sessions")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.processing.fps, 30);
        assert!(!config.processing.realtime);
        assert_eq!(config.processing.exercise, "tricep-pushdown");
        assert_eq!(config.logging.level, "info");
        assert!(config.history_dir.ends_with("repcoach/sessions"));
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = std::env::temp_dir().join("repcoach_test_config");
        let _ = std::fs::remove_dir_all(&dir);
        let path = dir.join("config.json");

        let mut config = AppConfig::default();
        config.processing.fps = 24;
        config.processing.exercise = "squat".to_string();
        config.save_to(&path).unwrap();

        let loaded = AppConfig::load_from(&path);
        assert_eq!(loaded.processing.fps, 24);
        assert_eq!(loaded.processing.exercise, "squat");

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_invalid_config_falls_back_to_defaults() {
        let dir = std::env::temp_dir().join("repcoach_test_config_invalid");
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.json");
        std::fs::write(&path, "{ not json").unwrap();

        let loaded = AppConfig::load_from(&path);
        assert_eq!(loaded.processing.fps, 30);

        std::fs::remove_dir_all(&dir).ok();
    }
}
