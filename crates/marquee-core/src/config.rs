use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub coordinator: CoordinatorConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

/// Limits and switches for timeline generation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Safety cap on executed statements; also caps timeline length between statements
    #[serde(default = "default_max_steps")]
    pub max_steps: usize,
    /// Hard cap on positions a single statement may emit
    #[serde(default = "default_max_positions")]
    pub max_positions: usize,
    /// How many times a position must recur before generation stops
    #[serde(default = "default_stabilization_repeats")]
    pub stabilization_repeats: usize,
    /// Number of recent loop-iteration positions inspected for stabilization
    #[serde(default = "default_stabilization_window")]
    pub stabilization_window: usize,
    /// Loops with at most this many iterations are unrolled into one segment
    #[serde(default = "default_loop_unroll_limit")]
    pub loop_unroll_limit: i64,
    /// Maximum nesting of blocks, loops and sequence calls
    #[serde(default = "default_max_frame_depth")]
    pub max_frame_depth: usize,
    /// Run the smoothing post-processor on resolved timelines
    #[serde(default)]
    pub smoothing: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_steps: default_max_steps(),
            max_positions: default_max_positions(),
            stabilization_repeats: default_stabilization_repeats(),
            stabilization_window: default_stabilization_window(),
            loop_unroll_limit: default_loop_unroll_limit(),
            max_frame_depth: default_max_frame_depth(),
            smoothing: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoordinatorConfig {
    /// Resolution passes allowed per registered widget
    #[serde(default = "default_iteration_factor")]
    pub iteration_factor: usize,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            iteration_factor: default_iteration_factor(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_max_steps() -> usize {
    1000
}

fn default_max_positions() -> usize {
    100_000
}

fn default_stabilization_repeats() -> usize {
    5
}

fn default_stabilization_window() -> usize {
    10
}

fn default_loop_unroll_limit() -> i64 {
    10
}

fn default_max_frame_depth() -> usize {
    256
}

fn default_iteration_factor() -> usize {
    2
}

/// Expand tilde (~) in path to user's home directory
fn expand_tilde(path: &Path) -> PathBuf {
    if let Some(path_str) = path.to_str() {
        if let Some(stripped) = path_str.strip_prefix("~/") {
            if let Some(home) = dirs::home_dir() {
                return home.join(stripped);
            }
        } else if path_str == "~" {
            if let Some(home) = dirs::home_dir() {
                return home;
            }
        }
    }
    path.to_path_buf()
}

impl AppConfig {
    /// Load configuration from the default location or return defaults
    pub fn load() -> crate::Result<Self> {
        Self::load_from(&Self::config_path())
    }

    /// Load configuration from an explicit path; a missing file yields defaults
    pub fn load_from(path: &Path) -> crate::Result<Self> {
        let path = expand_tilde(path);

        if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            toml::from_str(&content).map_err(|e| crate::Error::Config(e.to_string()))
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to the default location
    pub fn save(&self) -> crate::Result<()> {
        self.save_to(&Self::config_path())
    }

    /// Save configuration to file
    pub fn save_to(&self, path: &Path) -> crate::Result<()> {
        let path = expand_tilde(path);

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content =
            toml::to_string_pretty(self).map_err(|e| crate::Error::Config(e.to_string()))?;
        std::fs::write(&path, content)?;

        Ok(())
    }

    /// Get the configuration file path
    /// Always uses ~/.config/marquee/config.toml on all platforms
    pub fn config_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".config")
            .join("marquee")
            .join("config.toml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.general.log_level, "info");
        assert_eq!(config.engine.max_steps, 1000);
        assert_eq!(config.engine.stabilization_repeats, 5);
        assert_eq!(config.engine.loop_unroll_limit, 10);
        assert!(!config.engine.smoothing);
        assert_eq!(config.coordinator.iteration_factor, 2);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
            [engine]
            max_steps = 250
            smoothing = true
            "#,
        )
        .unwrap();
        assert_eq!(config.engine.max_steps, 250);
        assert!(config.engine.smoothing);
        assert_eq!(config.engine.max_positions, 100_000);
        assert_eq!(config.general.log_level, "info");
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::load_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.engine, EngineConfig::default());
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = AppConfig::default();
        config.engine.max_steps = 42;
        config.general.log_level = "debug".to_string();
        config.save_to(&path).unwrap();

        let loaded = AppConfig::load_from(&path).unwrap();
        assert_eq!(loaded.engine.max_steps, 42);
        assert_eq!(loaded.general.log_level, "debug");
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[engine\nmax_steps = ").unwrap();

        let err = AppConfig::load_from(&path).unwrap_err();
        assert!(matches!(err, crate::Error::Config(_)));
    }
}
