//! crates/soul_whispers_core/src/format.rs
//!
//! Time labels for the playback transport.

use std::time::Duration;

/// Renders a position as `m:ss`, flooring partial seconds.
pub fn format_time(position: Duration) -> String {
    let total = position.as_secs();
    format!("{}:{:02}", total / 60, total % 60)
}

/// The transport's right-hand label: time left, or `--:--` before a track is known.
pub fn remaining_label(position: Duration, duration: Duration) -> String {
    if duration.is_zero() {
        return "--:--".to_string();
    }
    format!("-{}", format_time(duration.saturating_sub(position)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_minutes_and_padded_seconds() {
        assert_eq!(format_time(Duration::ZERO), "0:00");
        assert_eq!(format_time(Duration::from_millis(59_900)), "0:59");
        assert_eq!(format_time(Duration::from_secs(125)), "2:05");
    }

    #[test]
    fn remaining_is_negative_or_placeholder() {
        assert_eq!(remaining_label(Duration::ZERO, Duration::ZERO), "--:--");
        assert_eq!(
            remaining_label(Duration::from_secs(90), Duration::from_secs(120)),
            "-0:30"
        );
        assert_eq!(
            remaining_label(Duration::from_secs(200), Duration::from_secs(120)),
            "-0:00"
        );
    }
}
