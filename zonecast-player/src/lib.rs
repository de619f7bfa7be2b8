//! Zonecast Player library
//!
//! Announcement interleaving controller: plays background music in a zone,
//! and every N seconds ducks it, plays the next announcement from a rotation
//! and restores the music. Exposed for integration testing.

pub mod api;
pub mod config;
pub mod error;
pub mod playback;
pub mod services;
pub mod state;

pub use error::{Error, Result};
pub use playback::{spawn_controller, ControllerDeps, ControllerHandle, PlaybackView, StartOutcome};
