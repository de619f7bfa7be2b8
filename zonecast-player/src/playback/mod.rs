//! Announcement interleaving engine
//!
//! - [`fader`]: volume ramps for duck and restore
//! - [`rotation`]: cyclic announcement queue with zone/folder filtering
//! - [`music_queue`]: cyclic background-music queue
//! - [`reconciler`]: merges the "is playing" signals
//! - [`phase`]: controller phase owning its timer handles
//! - [`timers`]: cancellable task guards and the announcement volume monitor
//! - [`controller`]: the interleave scheduler actor

pub mod controller;
pub mod fader;
pub mod music_queue;
pub mod phase;
pub mod reconciler;
pub mod rotation;
pub mod timers;

pub use controller::{spawn_controller, ControllerDeps, ControllerHandle, PlaybackView, StartOutcome};
pub use fader::{FadeHandle, VolumeRamp};
pub use music_queue::MusicQueue;
pub use phase::Phase;
pub use reconciler::PlaybackReconciler;
pub use rotation::{AnnouncementRotation, RotationFilter};
