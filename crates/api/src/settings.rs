//! Server settings

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use session::MonitorConfig;

/// Default settings file, looked up in the working directory
pub const DEFAULT_SETTINGS_FILE: &str = "driver-monitor";

/// Environment variable prefix (`DRIVER_MONITOR__BIND_ADDR`, ...)
pub const ENV_PREFIX: &str = "DRIVER_MONITOR";

/// Process settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Listen address
    pub bind_addr: String,
    /// Emit logs as JSON lines
    pub json_logs: bool,
    /// Capacity of the emergency dispatch queue
    pub dispatch_queue: usize,
    /// Session summaries kept in memory
    pub summary_retention: usize,
    pub monitor: MonitorConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8080".to_string(),
            json_logs: false,
            dispatch_queue: 64,
            summary_retention: 1_000,
            monitor: MonitorConfig::default(),
        }
    }
}

impl Settings {
    /// Load settings from an optional file, then the environment.
    ///
    /// Missing keys fall back to the defaults.
    pub fn load(file: Option<&str>) -> Result<Self, ConfigError> {
        let file = file.unwrap_or(DEFAULT_SETTINGS_FILE);
        Config::builder()
            .add_source(File::with_name(file).required(false))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
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

    #[test]
    fn test_missing_file_gives_defaults() {
        let settings = Settings::load(Some("does-not-exist/driver-monitor")).unwrap();
        assert_eq!(settings.monitor, MonitorConfig::default());
        assert_eq!(settings.dispatch_queue, 64);
    }

    #[test]
    fn test_partial_file_overrides() {
        let dir = std::env::temp_dir().join(format!("driver-monitor-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("settings.toml");
        std::fs::write(
            &path,
            "bind_addr = \"127.0.0.1:9000\"\n[monitor]\nwindow_capacity = 30\n[monitor.fatigue]\ncooldown_threshold = 5\n",
        )
        .unwrap();

        let settings = Settings::load(path.to_str()).unwrap();
        assert_eq!(settings.bind_addr, "127.0.0.1:9000");
        assert_eq!(settings.monitor.window_capacity, 30);
        assert_eq!(settings.monitor.fatigue.cooldown_threshold, 5);
        assert_eq!(settings.monitor.fatigue.debounce_threshold, 2);
        assert_eq!(settings.monitor.pairing_tolerance_ms, 2_500);

        std::fs::remove_dir_all(&dir).ok();
    }
}
