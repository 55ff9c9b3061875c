//! Conversions between elapsed playback time and progress-bar percentage.

/// Percentage of `duration_secs` elapsed at `current_secs`, clamped to
/// `[0, 100]`. A missing or degenerate duration yields `0.0`.
pub fn progress_percent(current_secs: f64, duration_secs: f64) -> f64 {
    if !duration_secs.is_finite() || duration_secs <= 0.0 || !current_secs.is_finite() {
        return 0.0;
    }
    ((current_secs / duration_secs) * 100.0).clamp(0.0, 100.0)
}

/// Playback time corresponding to `percent` of `duration_secs`.
pub fn time_from_percent(percent: f64, duration_secs: f64) -> f64 {
    if !duration_secs.is_finite() || duration_secs <= 0.0 || !percent.is_finite() {
        return 0.0;
    }
    (percent.clamp(0.0, 100.0) / 100.0) * duration_secs
}
