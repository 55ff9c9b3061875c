use serde::Deserialize;

/// High-level app configuration; deserializable from TOML.
#[derive(Debug, Clone, Deserialize, serde::Serialize)]
pub struct AppConfig {
    #[serde(default = "crate::config::defaults::default_log_level")]
    pub log_level: LogLevel,
    /// Host frame cadence for the cooperative sample loop, in milliseconds.
    #[serde(default = "crate::config::defaults::default_tick_interval_ms")]
    pub tick_interval_ms: u64,
    #[serde(default = "crate::config::defaults::default_speed")]
    pub default_speed: f32,
    #[serde(default = "crate::config::defaults::default_volume")]
    pub default_volume: f32,
    /// Relative seek applied by the skip transport controls.
    #[serde(default = "crate::config::defaults::default_skip_seconds")]
    pub skip_seconds: f64,
    #[serde(default = "crate::config::defaults::default_cache_audio")]
    pub cache_audio: bool,
    #[serde(default = "crate::config::defaults::default_data_path")]
    pub data_path: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            log_level: crate::config::defaults::default_log_level(),
            tick_interval_ms: crate::config::defaults::default_tick_interval_ms(),
            default_speed: crate::config::defaults::default_speed(),
            default_volume: crate::config::defaults::default_volume(),
            skip_seconds: crate::config::defaults::default_skip_seconds(),
            cache_audio: crate::config::defaults::default_cache_audio(),
            data_path: crate::config::defaults::default_data_path(),
        }
    }
}

/// Supported logging verbosity levels.
#[derive(Debug, Clone, Copy, Deserialize, serde::Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl Default for LogLevel {
    fn default() -> Self {
        LogLevel::Info
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_filter_str())
    }
}

impl LogLevel {
    pub fn as_filter_str(self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}
