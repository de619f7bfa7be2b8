//! Controller runtime settings
//!
//! Settings arrive from the TOML bootstrap file and from the control API.
//! Every value is clamped into its valid range before it can reach an audio
//! handle, so no handle ever sees a volume outside `[0, 100]` percent
//! (`[0.0, 1.0]` gain).

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::warn;
use zonecast_common::config::PlaybackDefaults;

/// Number of discrete volume steps in every fade
pub const FADE_STEPS: u32 = 20;

/// Period of the announcement volume-correction monitor
pub const VOLUME_MONITOR_PERIOD: Duration = Duration::from_millis(50);

/// Gain drift tolerated before the monitor re-applies the target
pub const VOLUME_EPSILON: f32 = 0.01;

/// Announcement interval bounds in seconds
pub const MIN_INTERVAL_SECONDS: u32 = 10;
pub const MAX_INTERVAL_SECONDS: u32 = 1800;

/// Fade duration bounds in seconds
pub const MIN_FADE_SECONDS: f64 = 1.0;
pub const MAX_FADE_SECONDS: f64 = 10.0;

/// Volume percent when nothing is ducked
pub const FULL_VOLUME: u8 = 100;

/// User-configurable interleave settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ControllerSettings {
    /// Seconds between announcements, in [10, 1800]
    pub announcement_interval_seconds: u32,

    /// Duration of both duck and restore fades, in [1, 10]
    pub fade_duration_seconds: f64,

    /// Music volume floor while an announcement plays, in [0, 100]
    pub background_volume_percent: u8,

    /// Announcement clip volume, in [0, 100]
    pub announcement_volume_percent: u8,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self {
            announcement_interval_seconds: 300,
            fade_duration_seconds: 3.0,
            background_volume_percent: 20,
            announcement_volume_percent: 100,
        }
    }
}

/// Unvalidated settings as received from a client
///
/// Wider integer types so out-of-range input (e.g. 150 or -5) can be clamped
/// instead of failing deserialization.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct SettingsRequest {
    pub announcement_interval_seconds: Option<i64>,
    pub fade_duration_seconds: Option<f64>,
    pub background_volume_percent: Option<i64>,
    pub announcement_volume_percent: Option<i64>,
}

impl ControllerSettings {
    /// Build settings from raw values, clamping each into range
    pub fn clamped(
        interval_seconds: i64,
        fade_seconds: f64,
        background_volume: i64,
        announcement_volume: i64,
    ) -> Self {
        Self {
            announcement_interval_seconds: clamp_interval(interval_seconds),
            fade_duration_seconds: clamp_fade(fade_seconds),
            background_volume_percent: clamp_percent("background_volume_percent", background_volume),
            announcement_volume_percent: clamp_percent(
                "announcement_volume_percent",
                announcement_volume,
            ),
        }
    }

    /// Apply a partial update on top of the current settings
    pub fn merged(&self, request: &SettingsRequest) -> Self {
        Self::clamped(
            request
                .announcement_interval_seconds
                .unwrap_or(self.announcement_interval_seconds as i64),
            request.fade_duration_seconds.unwrap_or(self.fade_duration_seconds),
            request
                .background_volume_percent
                .unwrap_or(self.background_volume_percent as i64),
            request
                .announcement_volume_percent
                .unwrap_or(self.announcement_volume_percent as i64),
        )
    }

    /// Re-clamp settings that may have been constructed directly
    pub fn sanitized(self) -> Self {
        Self::clamped(
            self.announcement_interval_seconds as i64,
            self.fade_duration_seconds,
            self.background_volume_percent as i64,
            self.announcement_volume_percent as i64,
        )
    }

    /// Fade duration as a Duration
    pub fn fade_duration(&self) -> Duration {
        Duration::from_secs_f64(self.fade_duration_seconds)
    }

    /// Announcement gain in [0.0, 1.0]
    pub fn announcement_gain(&self) -> f32 {
        (self.announcement_volume_percent as f32 / 100.0).clamp(0.0, 1.0)
    }
}

impl From<&PlaybackDefaults> for ControllerSettings {
    fn from(defaults: &PlaybackDefaults) -> Self {
        Self::clamped(
            defaults.announcement_interval_seconds,
            defaults.fade_duration_seconds,
            defaults.background_volume_percent,
            defaults.announcement_volume_percent,
        )
    }
}

fn clamp_interval(value: i64) -> u32 {
    let clamped = value.clamp(MIN_INTERVAL_SECONDS as i64, MAX_INTERVAL_SECONDS as i64);
    if clamped != value {
        warn!(
            "announcement_interval_seconds {} out of range, using {}",
            value, clamped
        );
    }
    clamped as u32
}

fn clamp_fade(value: f64) -> f64 {
    if !value.is_finite() {
        warn!("fade_duration_seconds {} is not finite, using {}", value, MIN_FADE_SECONDS);
        return MIN_FADE_SECONDS;
    }
    let clamped = value.clamp(MIN_FADE_SECONDS, MAX_FADE_SECONDS);
    if clamped != value {
        warn!("fade_duration_seconds {} out of range, using {}", value, clamped);
    }
    clamped
}

fn clamp_percent(name: &str, value: i64) -> u8 {
    let clamped = value.clamp(0, 100);
    if clamped != value {
        warn!("{} {} out of range, using {}", name, value, clamped);
    }
    clamped as u8
}
