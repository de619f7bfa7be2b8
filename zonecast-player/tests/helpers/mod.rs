//! Shared test fixtures: recording fakes for every collaborator and a
//! harness that wires them into a running controller.

#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{broadcast, watch};
use zonecast_common::events::ZonecastEvent;
use zonecast_common::{Announcement, Track, Zone};
use zonecast_player::config::{ControllerSettings, SettingsRequest};
use zonecast_player::services::{
    AnnouncementClip, AnnouncementOutput, Catalog, ClipEvent, LibrarySnapshot, LocalPlayer,
    LocalPlayerEvent, LocalTrack, PlayRequest, RemotePlayback,
};
use zonecast_player::state::SharedState;
use zonecast_player::{spawn_controller, ControllerDeps, ControllerHandle, Error, Result};

pub const ZONE: &str = "z1";

// ============================================================================
// Remote playback
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum RemoteCall {
    Play(PlayRequest),
    Pause(String),
    Resume(String),
    Next(String),
}

#[derive(Default)]
pub struct FakeRemote {
    calls: Mutex<Vec<RemoteCall>>,
    fail: AtomicBool,
}

impl FakeRemote {
    pub fn calls(&self) -> Vec<RemoteCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    fn record(&self, call: RemoteCall) -> Result<()> {
        self.calls.lock().unwrap().push(call);
        if self.fail.load(Ordering::SeqCst) {
            Err(Error::RemoteApi("Zone device offline".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl RemotePlayback for FakeRemote {
    async fn play(&self, request: &PlayRequest) -> Result<()> {
        self.record(RemoteCall::Play(request.clone()))
    }

    async fn pause(&self, zone_id: &str) -> Result<()> {
        self.record(RemoteCall::Pause(zone_id.to_string()))
    }

    async fn resume(&self, zone_id: &str) -> Result<()> {
        self.record(RemoteCall::Resume(zone_id.to_string()))
    }

    async fn next(&self, zone_id: &str) -> Result<()> {
        self.record(RemoteCall::Next(zone_id.to_string()))
    }
}

// ============================================================================
// Local player
// ============================================================================

pub struct FakeLocalPlayer {
    volume: Mutex<u8>,
    volume_history: Mutex<Vec<u8>>,
    played: Mutex<Vec<String>>,
    pauses: AtomicUsize,
    fail_play: AtomicBool,
    playing_tx: watch::Sender<bool>,
    events_tx: broadcast::Sender<LocalPlayerEvent>,
}

impl FakeLocalPlayer {
    pub fn new() -> Self {
        Self {
            volume: Mutex::new(100),
            volume_history: Mutex::new(Vec::new()),
            played: Mutex::new(Vec::new()),
            pauses: AtomicUsize::new(0),
            fail_play: AtomicBool::new(false),
            playing_tx: watch::channel(false).0,
            events_tx: broadcast::channel(16).0,
        }
    }

    pub fn volume_history(&self) -> Vec<u8> {
        self.volume_history.lock().unwrap().clone()
    }

    pub fn played(&self) -> Vec<String> {
        self.played.lock().unwrap().clone()
    }

    pub fn pauses(&self) -> usize {
        self.pauses.load(Ordering::SeqCst)
    }

    pub fn set_play_failing(&self, fail: bool) {
        self.fail_play.store(fail, Ordering::SeqCst);
    }

    /// Simulate the current track reaching its end
    pub fn end_track(&self, track_id: &str) {
        let _ = self.events_tx.send(LocalPlayerEvent::TrackEnded {
            track_id: track_id.to_string(),
        });
    }
}

#[async_trait]
impl LocalPlayer for FakeLocalPlayer {
    async fn play(&self, track: &LocalTrack) -> Result<()> {
        if self.fail_play.load(Ordering::SeqCst) {
            return Err(Error::Playback("autoplay blocked".to_string()));
        }
        self.played.lock().unwrap().push(track.id.clone());
        self.playing_tx.send_replace(true);
        Ok(())
    }

    fn pause(&self) {
        self.pauses.fetch_add(1, Ordering::SeqCst);
        self.playing_tx.send_replace(false);
    }

    fn set_volume(&self, percent: u8) {
        assert!(percent <= 100, "local volume out of range: {}", percent);
        *self.volume.lock().unwrap() = percent;
        self.volume_history.lock().unwrap().push(percent);
    }

    fn volume(&self) -> u8 {
        *self.volume.lock().unwrap()
    }

    fn playing(&self) -> watch::Receiver<bool> {
        self.playing_tx.subscribe()
    }

    fn subscribe(&self) -> broadcast::Receiver<LocalPlayerEvent> {
        self.events_tx.subscribe()
    }
}

// ============================================================================
// Announcement output
// ============================================================================

pub struct FakeAnnouncementOutput {
    loaded: Mutex<Vec<AnnouncementClip>>,
    volume: Mutex<f32>,
    volume_history: Mutex<Vec<f32>>,
    plays: AtomicUsize,
    stops: AtomicUsize,
    fail_play: AtomicBool,
    events_tx: broadcast::Sender<ClipEvent>,
}

impl FakeAnnouncementOutput {
    pub fn new() -> Self {
        Self {
            loaded: Mutex::new(Vec::new()),
            volume: Mutex::new(1.0),
            volume_history: Mutex::new(Vec::new()),
            plays: AtomicUsize::new(0),
            stops: AtomicUsize::new(0),
            fail_play: AtomicBool::new(false),
            events_tx: broadcast::channel(16).0,
        }
    }

    /// Ids of every clip loaded, in order
    pub fn loaded_ids(&self) -> Vec<String> {
        self.loaded.lock().unwrap().iter().map(|c| c.id.clone()).collect()
    }

    pub fn volume_history(&self) -> Vec<f32> {
        self.volume_history.lock().unwrap().clone()
    }

    pub fn plays(&self) -> usize {
        self.plays.load(Ordering::SeqCst)
    }

    pub fn stops(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }

    pub fn set_play_failing(&self, fail: bool) {
        self.fail_play.store(fail, Ordering::SeqCst);
    }

    /// Simulate an external volume change (media keys)
    pub fn nudge_volume(&self, gain: f32) {
        *self.volume.lock().unwrap() = gain;
    }

    pub fn emit_ended(&self) {
        let _ = self.events_tx.send(ClipEvent::Ended);
    }

    pub fn emit_error(&self, message: &str) {
        let _ = self.events_tx.send(ClipEvent::Error(message.to_string()));
    }
}

#[async_trait]
impl AnnouncementOutput for FakeAnnouncementOutput {
    fn load(&self, clip: &AnnouncementClip) -> Result<()> {
        self.loaded.lock().unwrap().push(clip.clone());
        Ok(())
    }

    fn set_volume(&self, gain: f32) {
        assert!((0.0..=1.0).contains(&gain), "announcement gain out of range: {}", gain);
        *self.volume.lock().unwrap() = gain;
        self.volume_history.lock().unwrap().push(gain);
    }

    fn volume(&self) -> f32 {
        *self.volume.lock().unwrap()
    }

    async fn play(&self) -> Result<()> {
        self.plays.fetch_add(1, Ordering::SeqCst);
        if self.fail_play.load(Ordering::SeqCst) {
            Err(Error::Playback("NotAllowedError".to_string()))
        } else {
            Ok(())
        }
    }

    fn stop(&self) {
        self.stops.fetch_add(1, Ordering::SeqCst);
    }

    fn subscribe(&self) -> broadcast::Receiver<ClipEvent> {
        self.events_tx.subscribe()
    }
}

// ============================================================================
// Catalog
// ============================================================================

pub struct FakeCatalog {
    pub library: LibrarySnapshot,
}

#[async_trait]
impl Catalog for FakeCatalog {
    async fn music_files(&self) -> Result<Vec<Track>> {
        Ok(self.library.tracks.clone())
    }

    async fn announcements(&self) -> Result<Vec<Announcement>> {
        Ok(self.library.announcements.clone())
    }

    async fn zones(&self) -> Result<Vec<Zone>> {
        Ok(self.library.zones.clone())
    }
}

// ============================================================================
// Fixtures
// ============================================================================

pub fn track(id: &str) -> Track {
    Track {
        id: id.to_string(),
        name: format!("Track {}", id),
        url: Some(format!("https://cdn.example.com/music/{}.mp3", id)),
        duration: 180.0,
        zone_id: None,
    }
}

pub fn announcement(id: &str, url: Option<&str>) -> Announcement {
    Announcement {
        id: id.to_string(),
        title: format!("Announcement {}", id),
        url: url.map(str::to_string),
        duration: 8.0,
        enabled: true,
        folder_id: None,
        zone_id: None,
    }
}

pub fn playable(id: &str) -> Announcement {
    announcement(id, Some(&format!("https://cdn.example.com/ann/{}.mp3", id)))
}

pub fn library(tracks: &[&str], announcements: Vec<Announcement>) -> LibrarySnapshot {
    LibrarySnapshot {
        tracks: tracks.iter().map(|id| track(id)).collect(),
        announcements,
        zones: vec![Zone {
            id: ZONE.to_string(),
            name: "Ground Floor".to_string(),
        }],
    }
}

pub fn settings(interval: u32, fade: f64) -> ControllerSettings {
    ControllerSettings {
        announcement_interval_seconds: interval,
        fade_duration_seconds: fade,
        background_volume_percent: 20,
        announcement_volume_percent: 100,
    }
}

pub fn settings_request() -> SettingsRequest {
    SettingsRequest {
        announcement_interval_seconds: None,
        fade_duration_seconds: None,
        background_volume_percent: None,
        announcement_volume_percent: None,
    }
}

pub fn ids(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

pub struct Harness {
    pub controller: ControllerHandle,
    pub state: Arc<SharedState>,
    pub remote: Arc<FakeRemote>,
    pub local: Arc<FakeLocalPlayer>,
    pub announcer: Arc<FakeAnnouncementOutput>,
    pub events: broadcast::Receiver<ZonecastEvent>,
}

impl Harness {
    /// Controller with fakes and nothing selected
    pub fn new(settings: ControllerSettings) -> Self {
        let state = Arc::new(SharedState::new());
        let remote = Arc::new(FakeRemote::default());
        let local = Arc::new(FakeLocalPlayer::new());
        let announcer = Arc::new(FakeAnnouncementOutput::new());
        let events = state.subscribe_events();

        let (controller, _task) = spawn_controller(
            ControllerDeps {
                remote: remote.clone(),
                local: local.clone(),
                announcer: announcer.clone(),
                shared: state.clone(),
            },
            settings,
        );

        Self {
            controller,
            state,
            remote,
            local,
            announcer,
            events,
        }
    }

    /// Controller with library, selection and zone in place
    pub async fn configured(
        settings: ControllerSettings,
        music: &[&str],
        announcements: Vec<Announcement>,
    ) -> Self {
        let harness = Self::new(settings);
        let announcement_ids = announcements.iter().map(|a| a.id.clone()).collect();
        harness
            .controller
            .set_library(library(music, announcements))
            .await
            .unwrap();
        harness
            .controller
            .set_selection(ids(music), announcement_ids)
            .await
            .unwrap();
        harness
            .controller
            .set_zone(Some(ZONE.to_string()))
            .await
            .unwrap();
        harness
    }

    /// Drain every event emitted so far
    pub fn drain_events(&mut self) -> Vec<ZonecastEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            events.push(event);
        }
        events
    }

    /// Notice messages among `events`
    pub fn notices(events: &[ZonecastEvent]) -> Vec<String> {
        events
            .iter()
            .filter_map(|e| match e {
                ZonecastEvent::Notice { message, .. } => Some(message.clone()),
                _ => None,
            })
            .collect()
    }
}

/// Let every ready task run without moving the clock meaningfully
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(1)).await;
}

/// Advance the paused clock by `secs` seconds
pub async fn advance_secs(secs: f64) {
    tokio::time::sleep(Duration::from_secs_f64(secs)).await;
}
