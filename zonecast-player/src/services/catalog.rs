//! Music and announcement library loading
//!
//! The backend lists music files, announcements and zones. List endpoints
//! answer either with a bare JSON array or with a paginated
//! `{"results": [...]}` envelope; both are accepted. Numeric ids are
//! normalized to strings.

use crate::error::{Error, Result};
use crate::services::backend::BackendClient;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};
use zonecast_common::{Announcement, Track, Zone};

/// Library contents used by the controller
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LibrarySnapshot {
    #[serde(default)]
    pub tracks: Vec<Track>,
    #[serde(default)]
    pub announcements: Vec<Announcement>,
    #[serde(default)]
    pub zones: Vec<Zone>,
}

/// Read-only library source
#[async_trait]
pub trait Catalog: Send + Sync {
    async fn music_files(&self) -> Result<Vec<Track>>;
    async fn announcements(&self) -> Result<Vec<Announcement>>;
    async fn zones(&self) -> Result<Vec<Zone>>;

    /// Load all three lists
    async fn snapshot(&self) -> Result<LibrarySnapshot> {
        Ok(LibrarySnapshot {
            tracks: self.music_files().await?,
            announcements: self.announcements().await?,
            zones: self.zones().await?,
        })
    }
}

/// REST implementation of [`Catalog`]
#[derive(Debug, Clone)]
pub struct HttpCatalog {
    client: BackendClient,
}

impl HttpCatalog {
    pub fn new(client: BackendClient) -> Self {
        Self { client }
    }

    async fn list<T: DeserializeOwned>(&self, path: &str) -> Result<Vec<T>> {
        let body: Value = self.client.get_json(path).await?;
        parse_list(body)
    }
}

#[async_trait]
impl Catalog for HttpCatalog {
    async fn music_files(&self) -> Result<Vec<Track>> {
        let tracks: Vec<Track> = self.list("/music/files/").await?;
        let total = tracks.len();
        let playable: Vec<Track> = tracks
            .into_iter()
            .filter(|t| {
                t.url
                    .as_deref()
                    .map(zonecast_common::models::is_audio_url)
                    .unwrap_or(false)
            })
            .collect();
        if playable.len() < total {
            warn!(
                "Dropped {} music files without a playable audio URL",
                total - playable.len()
            );
        }
        info!("Loaded {} music files", playable.len());
        Ok(playable)
    }

    async fn announcements(&self) -> Result<Vec<Announcement>> {
        let announcements: Vec<Announcement> = self.list("/announcements/").await?;
        info!("Loaded {} announcements", announcements.len());
        Ok(announcements)
    }

    async fn zones(&self) -> Result<Vec<Zone>> {
        let zones: Vec<Zone> = self.list("/zones/zones/").await?;
        info!("Loaded {} zones", zones.len());
        Ok(zones)
    }
}

/// Decode a list response (bare array or `results` envelope)
///
/// Items that fail to decode are skipped with a warning rather than failing
/// the whole list.
pub fn parse_list<T: DeserializeOwned>(body: Value) -> Result<Vec<T>> {
    let items = match body {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove("results") {
            Some(Value::Array(items)) => items,
            _ => {
                return Err(Error::RemoteApi(
                    "Expected a list or a results envelope".to_string(),
                ))
            }
        },
        _ => {
            return Err(Error::RemoteApi(
                "Expected a list or a results envelope".to_string(),
            ))
        }
    };

    Ok(items
        .into_iter()
        .filter_map(|item| match serde_json::from_value(stringify_id(item)) {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                warn!("Skipping malformed library entry: {}", e);
                None
            }
        })
        .collect())
}

/// Turn numeric `id`, `zone_id` and `folder_id` fields into strings
fn stringify_id(mut item: Value) -> Value {
    if let Value::Object(map) = &mut item {
        for key in ["id", "zone_id", "folder_id"] {
            if let Some(Value::Number(n)) = map.get(key) {
                let text = n.to_string();
                map.insert(key.to_string(), Value::String(text));
            }
        }
    }
    item
}
