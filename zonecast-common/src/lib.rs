//! # Zonecast Common Library
//!
//! Shared code for the Zonecast playback services including:
//! - Library models (tracks, announcements, zones)
//! - Event types (ZonecastEvent enum) and the EventBus
//! - Bootstrap configuration loading
//! - Human-readable time formatting

pub mod config;
pub mod error;
pub mod events;
pub mod human_time;
pub mod models;

pub use error::{Error, Result};
pub use models::{Announcement, Track, Zone};
