//! Human-readable time formatting
//!
//! Provides consistent time display for dashboard countdowns and
//! track/announcement durations.

/// Seconds at which durations switch from `M:SS` to `H:MM:SS`
const HOUR_FORMAT_MIN: u64 = 3600;

/// Format a countdown as `M:SS`
///
/// Minutes are not wrapped into hours, so a 30 minute countdown reads `30:00`.
///
/// # Examples
///
/// ```
/// use zonecast_common::human_time::format_clock;
///
/// assert_eq!(format_clock(0), "0:00");
/// assert_eq!(format_clock(75), "1:15");
/// assert_eq!(format_clock(1800), "30:00");
/// ```
pub fn format_clock(seconds: u64) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

/// Format a media duration given in (possibly fractional) seconds
///
/// Durations under an hour use `M:SS`; longer ones use `H:MM:SS`.
/// Negative, NaN or infinite inputs are treated as unknown and render `0:00`.
///
/// # Examples
///
/// ```
/// use zonecast_common::human_time::format_duration;
///
/// assert_eq!(format_duration(185.4), "3:05");
/// assert_eq!(format_duration(3725.0), "1:02:05");
/// assert_eq!(format_duration(f64::NAN), "0:00");
/// ```
pub fn format_duration(seconds: f64) -> String {
    if !seconds.is_finite() || seconds < 0.0 {
        return format_clock(0);
    }

    let whole = seconds.floor() as u64;
    if whole < HOUR_FORMAT_MIN {
        format_clock(whole)
    } else {
        let hours = whole / 3600;
        let mins = (whole % 3600) / 60;
        let secs = whole % 60;
        format!("{}:{:02}:{:02}", hours, mins, secs)
    }
}
