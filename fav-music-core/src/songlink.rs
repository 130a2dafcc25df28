use async_trait::async_trait;
use indexmap::IndexMap;
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use tracing::info;

use crate::contract::{DecodeError, FetchError, LinkAggregator};
use crate::playlist::check_status;

const SONGLINK_API_URL: &str = "https://api.song.link/v1-alpha.1/links";

/// Response of the aggregator's `links` endpoint, reduced to what the widget uses.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SonglinkResponse {
    /// Keyed by unique id, e.g. `SPOTIFY_SONG::<id>`. Document order is kept.
    #[serde(default)]
    pub entities_by_unique_id: IndexMap<String, SonglinkEntity>,
    #[serde(default)]
    pub links_by_platform: HashMap<String, PlatformListing>,
    pub page_url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SonglinkEntity {
    pub title: Option<String>,
    pub artist_name: Option<String>,
    pub thumbnail_url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlatformListing {
    /// Absent for some listings; those are left out of the widget.
    pub url: Option<String>,
}

/// Title, artist and artwork of the streaming service's own song entity.
#[derive(Debug, Clone, PartialEq)]
pub struct SongEntity {
    pub title: String,
    pub artist: String,
    pub thumbnail_url: String,
}

impl SonglinkResponse {
    /// First entity whose key starts with `prefix`, with its required fields.
    pub fn song_entity(&self, track_id: &str, prefix: &str) -> Result<SongEntity, DecodeError> {
        let entity = self
            .entities_by_unique_id
            .iter()
            .find(|(key, _)| key.starts_with(prefix))
            .map(|(_, entity)| entity)
            .ok_or_else(|| DecodeError::NoSongEntity {
                track_id: track_id.to_string(),
                prefix: prefix.to_string(),
            })?;
        let missing = |field| DecodeError::MissingField {
            context: "song entity",
            field,
        };
        Ok(SongEntity {
            title: entity.title.clone().ok_or_else(|| missing("title"))?,
            artist: entity.artist_name.clone().ok_or_else(|| missing("artistName"))?,
            thumbnail_url: entity
                .thumbnail_url
                .clone()
                .ok_or_else(|| missing("thumbnailUrl"))?,
        })
    }

    pub fn page_url(&self) -> Result<&str, DecodeError> {
        self.page_url.as_deref().ok_or(DecodeError::MissingField {
            context: "songlink response",
            field: "pageUrl",
        })
    }
}

/// [`LinkAggregator`] backed by the song.link public API.
pub struct SonglinkClient {
    http: Client,
}

impl SonglinkClient {
    pub fn new(http: Client) -> Self {
        Self { http }
    }
}

impl Default for SonglinkClient {
    fn default() -> Self {
        Self::new(Client::new())
    }
}

#[async_trait]
impl LinkAggregator for SonglinkClient {
    async fn lookup(
        &self,
        track_id: &str,
        country: &str,
    ) -> Result<SonglinkResponse, FetchError> {
        let reference = format!("spotify:track:{track_id}");
        info!(track_id, "[ENRICH] Fetching song.link data");
        let resp = self
            .http
            .get(SONGLINK_API_URL)
            .query(&[("url", reference.as_str()), ("userCountry", country)])
            .send()
            .await?;
        let resp = check_status(resp).await?;
        Ok(resp.json::<SonglinkResponse>().await?)
    }
}
