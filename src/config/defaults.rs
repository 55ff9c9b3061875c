pub(crate) fn default_log_level() -> crate::config::LogLevel {
    crate::config::LogLevel::Info
}

pub(crate) fn default_tick_interval_ms() -> u64 {
    100
}

pub(crate) fn default_speed() -> f32 {
    1.0
}

pub(crate) fn default_volume() -> f32 {
    1.0
}

pub(crate) fn default_skip_seconds() -> f64 {
    10.0
}

pub(crate) fn default_cache_audio() -> bool {
    true
}

pub(crate) fn default_data_path() -> String {
    "data/data.json".to_string()
}
