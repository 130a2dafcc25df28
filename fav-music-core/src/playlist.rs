//! Playlist fetching: token exchange, paged reads and conversion into [`Track`]s.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, error, info, warn};

use crate::contract::{DecodeError, FetchError, PlaylistSource};

const SPOTIFY_TOKEN_URL: &str = "https://accounts.spotify.com/api/token";
const SPOTIFY_API_URL: &str = "https://api.spotify.com/v1";

/// Minimal field projection requested for each playlist entry.
pub const PLAYLIST_FIELDS: &str = "items(track(id,artists(name),name,preview_url),added_at),next";

/// One playlist entry as used by the rest of the pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct Track {
    pub id: String,
    pub name: String,
    pub artists: Vec<String>,
    pub preview_url: Option<String>,
    pub added_at: Option<DateTime<Utc>>,
}

/// One page of the playlist-items endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlaylistPage {
    #[serde(default)]
    pub items: Vec<PlaylistItem>,
    /// Absolute URL of the next page; `None` or empty on the last page.
    #[serde(default)]
    pub next: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlaylistItem {
    /// Null for removed or unavailable tracks.
    pub track: Option<TrackObject>,
    pub added_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TrackObject {
    /// Null for local files.
    pub id: Option<String>,
    pub name: Option<String>,
    #[serde(default)]
    pub artists: Vec<ArtistObject>,
    pub preview_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ArtistObject {
    pub name: String,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
}

impl PlaylistItem {
    /// Converts the raw entry, returning `None` for entries without a usable track id.
    pub fn into_track(self) -> Result<Option<Track>, DecodeError> {
        let Some(track) = self.track else {
            return Ok(None);
        };
        let Some(id) = track.id else {
            return Ok(None);
        };
        let name = track.name.ok_or(DecodeError::MissingField {
            context: "playlist track",
            field: "name",
        })?;
        Ok(Some(Track {
            id,
            name,
            artists: track.artists.into_iter().map(|a| a.name).collect(),
            preview_url: track.preview_url.filter(|u| !u.is_empty()),
            added_at: self.added_at,
        }))
    }
}

/// URL of the first page of a playlist's entries.
pub fn first_page_url(playlist_id: &str, page_size: u32) -> Result<String, DecodeError> {
    let base = format!("{SPOTIFY_API_URL}/playlists/{playlist_id}/tracks");
    let url = reqwest::Url::parse_with_params(
        &base,
        &[
            ("fields", PLAYLIST_FIELDS.to_string()),
            ("limit", page_size.to_string()),
        ],
    )
    .map_err(|_| DecodeError::InvalidUrl { url: base.clone() })?;
    Ok(url.into())
}

/// Authenticates, then follows `next` pointers until the last page.
///
/// Entries come back in page order, then item order. At most `max_pages`
/// requests are made; a source that never ends its pagination is an error.
pub async fn fetch_playlist<S>(
    source: &S,
    client_id: &str,
    client_secret: &str,
    playlist_id: &str,
    page_size: u32,
    max_pages: usize,
) -> Result<Vec<Track>, FetchError>
where
    S: PlaylistSource + ?Sized,
{
    info!("[FETCH] Getting API token from client credentials");
    let token = source.request_token(client_id, client_secret).await?;

    let mut tracks = Vec::new();
    let mut next = Some(first_page_url(playlist_id, page_size)?);
    let mut pages = 0usize;

    while let Some(url) = next.take() {
        if pages >= max_pages {
            error!(pages, "[FETCH] Playlist pagination did not terminate");
            return Err(FetchError::PaginationLimit { pages });
        }
        info!(url = %url, "[FETCH] Fetching playlist page");
        let page = source.fetch_page(&token, &url).await?;
        pages += 1;

        for item in page.items {
            match item.into_track()? {
                Some(track) => tracks.push(track),
                None => warn!("[FETCH] Skipping playlist entry without a track id"),
            }
        }
        next = page.next.filter(|n| !n.is_empty());
    }

    info!(count = tracks.len(), pages, "[FETCH] Playlist fetched");
    Ok(tracks)
}

/// [`PlaylistSource`] backed by the Spotify Web API.
pub struct SpotifyClient {
    http: Client,
}

impl SpotifyClient {
    pub fn new(http: Client) -> Self {
        Self { http }
    }
}

impl Default for SpotifyClient {
    fn default() -> Self {
        Self::new(Client::new())
    }
}

/// Turns a non-success response into [`FetchError::Status`].
pub(crate) async fn check_status(
    resp: reqwest::Response,
) -> Result<reqwest::Response, FetchError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let url = resp.url().to_string();
    let body = resp
        .text()
        .await
        .unwrap_or_else(|_| String::from("<Failed to decode response body>"));
    error!(status = %status, url = %url, "Upstream returned error status");
    Err(FetchError::Status {
        url,
        status: status.as_u16(),
        body,
    })
}

#[async_trait]
impl PlaylistSource for SpotifyClient {
    async fn request_token(
        &self,
        client_id: &str,
        client_secret: &str,
    ) -> Result<String, FetchError> {
        let resp = self
            .http
            .post(SPOTIFY_TOKEN_URL)
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_id", client_id),
                ("client_secret", client_secret),
            ])
            .send()
            .await?;
        let resp = check_status(resp).await.map_err(|e| match e {
            FetchError::Status { status, body, .. } => {
                FetchError::Auth(format!("token exchange returned {status}: {body}"))
            }
            other => other,
        })?;
        let token: TokenResponse = resp.json().await?;
        match token.access_token {
            Some(t) if !t.is_empty() => {
                debug!("[FETCH] Received access token");
                Ok(t)
            }
            _ => Err(FetchError::Auth(
                "token exchange did not return an access_token".to_string(),
            )),
        }
    }

    async fn fetch_page(&self, token: &str, url: &str) -> Result<PlaylistPage, FetchError> {
        let resp = self.http.get(url).bearer_auth(token).send().await?;
        let resp = check_status(resp).await?;
        Ok(resp.json::<PlaylistPage>().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_projected_page() {
        let json = r#"{
            "items": [
                {"track": {"id": "a1", "name": "Song", "artists": [{"name": "X"}, {"name": "Y"}],
                           "preview_url": null}, "added_at": "2023-04-01T10:00:00Z"},
                {"track": null, "added_at": "2023-04-02T10:00:00Z"},
                {"track": {"id": null, "name": "Local", "artists": [], "preview_url": null},
                 "added_at": null}
            ],
            "next": null
        }"#;
        let page: PlaylistPage = serde_json::from_str(json).unwrap();
        let tracks: Vec<Track> = page
            .items
            .into_iter()
            .filter_map(|i| i.into_track().unwrap())
            .collect();
        assert_eq!(tracks.len(), 1);
        assert_eq!(tracks[0].artists, vec!["X", "Y"]);
        assert!(tracks[0].preview_url.is_none());
        assert!(tracks[0].added_at.is_some());
        assert!(page.next.is_none());
    }

    #[test]
    fn missing_track_name_is_a_decode_error() {
        let item: PlaylistItem =
            serde_json::from_str(r#"{"track": {"id": "a1", "artists": []}, "added_at": null}"#)
                .unwrap();
        assert!(matches!(
            item.into_track(),
            Err(DecodeError::MissingField { field: "name", .. })
        ));
    }

    #[test]
    fn first_page_url_carries_projection_and_limit() {
        let url = first_page_url("PL123", 100).unwrap();
        assert!(url.starts_with("https://api.spotify.com/v1/playlists/PL123/tracks?"));
        assert!(url.contains("limit=100"));
        assert!(url.contains("fields=items%28track%28id"));
    }
}
