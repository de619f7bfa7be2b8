//! Collaborators of the interleave controller
//!
//! Traits the controller talks to, plus the implementations wired by the
//! binary: REST clients for the backend and headless local outputs.

pub mod announcement_output;
pub mod backend;
pub mod catalog;
pub mod local_player;
pub mod remote_playback;

pub use announcement_output::{
    AnnouncementClip, AnnouncementOutput, ClipEvent, SimulatedAnnouncementOutput,
};
pub use backend::BackendClient;
pub use catalog::{Catalog, HttpCatalog, LibrarySnapshot};
pub use local_player::{LocalPlayer, LocalPlayerEvent, LocalTrack, SimulatedLocalPlayer};
pub use remote_playback::{HttpPlaybackApi, PlayRequest, RemotePlayback};
