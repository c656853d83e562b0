//! Display helpers.

/// Formats whole seconds as `H:MM:SS`. Negative input renders as zero.
pub fn format_duration(total_secs: i64) -> String {
    let total_secs = total_secs.max(0);
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;
    format!("{hours}:{minutes:02}:{seconds:02}")
}
