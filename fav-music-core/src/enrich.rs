//! Track enrichment: turns playlist entries into [`TrackRecord`]s.
//!
//! Tracks already in the cache are reused verbatim without touching the network
//! or the filesystem. New tracks are looked up on the link aggregator, their
//! artwork and preview are downloaded and post-processed, and a record is built.
//! Tracks are handled one at a time, in playlist order.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};

use crate::cache::{Cache, PlatformLink, TrackRecord};
use crate::config::SyncConfig;
use crate::contract::{
    DecodeError, FetchError, LinkAggregator, MediaFetcher, ToolError, Transcoder,
};
use crate::playlist::Track;
use crate::songlink::PlatformListing;

#[derive(Debug, thiserror::Error)]
pub enum EnrichError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error(transparent)]
    Tool(#[from] ToolError),
    #[error("filesystem error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Collaborators needed to enrich a cache miss.
pub struct EnrichServices<'a> {
    pub links: &'a dyn LinkAggregator,
    pub media: &'a dyn MediaFetcher,
    pub transcoder: &'a dyn Transcoder,
}

/// A record for this run, and whether it was produced by this run.
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichedTrack {
    pub id: String,
    pub record: TrackRecord,
    pub fresh: bool,
}

impl EnrichedTrack {
    /// Published files created by this run for this track, relative to the work dir.
    pub fn new_files(&self) -> Vec<PathBuf> {
        if !self.fresh {
            return Vec::new();
        }
        let mut files = vec![PathBuf::from(&self.record.image_mono)];
        if self.record.has_preview() {
            files.push(PathBuf::from(&self.record.preview_mp3));
        }
        files
    }
}

pub fn icon_markup(platform: &str) -> String {
    format!(r#"<img src="assets/{platform}.svg" />"#)
}

/// Links for the configured platforms present in `listings`, in configured order.
///
/// Listings without a url are skipped.
pub fn platform_links(
    platforms: &[String],
    listings: &HashMap<String, PlatformListing>,
) -> Vec<PlatformLink> {
    platforms
        .iter()
        .filter_map(|platform| {
            let url = listings.get(platform)?.url.clone()?;
            Some(PlatformLink {
                platform: platform.clone(),
                icon: icon_markup(platform),
                url,
            })
        })
        .collect()
}

/// Last path segment of a URL, query string excluded.
pub fn file_name_from_url(url: &str) -> Result<String, DecodeError> {
    reqwest::Url::parse(url)
        .ok()
        .and_then(|u| {
            u.path_segments()
                .and_then(|mut segments| segments.next_back().map(str::to_string))
        })
        .filter(|name| !name.is_empty())
        .ok_or_else(|| DecodeError::InvalidUrl {
            url: url.to_string(),
        })
}

fn sibling(relative: &str, extension: &str) -> String {
    Path::new(relative)
        .with_extension(extension)
        .to_string_lossy()
        .into_owned()
}

fn write_file(path: &Path, bytes: &[u8]) -> Result<(), EnrichError> {
    std::fs::write(path, bytes).map_err(|source| {
        error!(error = ?source, path = %path.display(), "[ENRICH] Failed to write file");
        EnrichError::Io {
            path: path.to_path_buf(),
            source,
        }
    })
}

fn ensure_dir(path: &Path) -> Result<(), EnrichError> {
    std::fs::create_dir_all(path).map_err(|source| EnrichError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Produces one record per distinct track id, in playlist order.
pub async fn enrich_tracks(
    tracks: &[Track],
    cache: &Cache,
    services: &EnrichServices<'_>,
    config: &SyncConfig,
) -> Result<Vec<EnrichedTrack>, EnrichError> {
    ensure_dir(&config.resolve(&config.image_dir))?;
    ensure_dir(&config.resolve(&config.audio_dir))?;

    let mut seen = HashSet::new();
    let mut enriched = Vec::with_capacity(tracks.len());

    for track in tracks {
        if !seen.insert(track.id.as_str()) {
            debug!(track_id = %track.id, "[ENRICH] Duplicate playlist entry, skipping");
            continue;
        }
        if let Some(record) = cache.get(&track.id) {
            info!(track_id = %track.id, name = %track.name, "[ENRICH] Already got track");
            enriched.push(EnrichedTrack {
                id: track.id.clone(),
                record: record.clone(),
                fresh: false,
            });
            continue;
        }
        let record = enrich_track(track, services, config).await?;
        info!(track_id = %track.id, title = %record.title, "[ENRICH] Enriched track");
        enriched.push(EnrichedTrack {
            id: track.id.clone(),
            record,
            fresh: true,
        });
    }
    Ok(enriched)
}

/// Builds the record for a track that is not cached yet.
pub async fn enrich_track(
    track: &Track,
    services: &EnrichServices<'_>,
    config: &SyncConfig,
) -> Result<TrackRecord, EnrichError> {
    let songlink = services
        .links
        .lookup(&track.id, &config.user_country)
        .await?;
    let entity = songlink.song_entity(&track.id, &config.song_entity_prefix)?;
    let songlink_url = songlink.page_url()?.to_string();

    let image = format!(
        "{}/{}.jpg",
        config.image_dir,
        file_name_from_url(&entity.thumbnail_url)?
    );
    let image_mono = sibling(&image, "mono.png");
    let image_bytes = services.media.fetch_bytes(&entity.thumbnail_url).await?;
    write_file(&config.resolve(&image), &image_bytes)?;

    let preview_mp3 = match &track.preview_url {
        Some(preview_url) => {
            let preview = format!(
                "{}/{}.mp3",
                config.audio_dir,
                file_name_from_url(preview_url)?
            );
            let processed = sibling(&preview, "proc.mp3");
            let bytes = services.media.fetch_bytes(preview_url).await?;
            write_file(&config.resolve(&preview), &bytes)?;
            services
                .transcoder
                .attenuate_audio(&config.resolve(&preview), &config.resolve(&processed))?;
            processed
        }
        None => {
            debug!(track_id = %track.id, "[ENRICH] No preview for track");
            String::new()
        }
    };

    services
        .transcoder
        .dither_image(&config.resolve(&image), &config.resolve(&image_mono))?;

    Ok(TrackRecord {
        title: entity.title,
        artist: entity.artist,
        image,
        image_mono,
        links: platform_links(&config.platforms, &songlink.links_by_platform),
        songlink_url,
        preview_mp3,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listing(url: &str) -> PlatformListing {
        PlatformListing {
            url: Some(url.into()),
        }
    }

    #[test]
    fn platform_order_follows_configuration() {
        let platforms: Vec<String> = ["spotify", "youtube", "itunes", "deezer", "soundcloud"]
            .into_iter()
            .map(String::from)
            .collect();
        let listings = HashMap::from([
            ("itunes".to_string(), listing("https://itunes/x")),
            ("spotify".to_string(), listing("https://spotify/x")),
            ("deezer".to_string(), listing("https://deezer/x")),
            ("tidal".to_string(), listing("https://tidal/x")),
        ]);
        let links = platform_links(&platforms, &listings);
        let names: Vec<_> = links.iter().map(|l| l.platform.as_str()).collect();
        assert_eq!(names, vec!["spotify", "itunes", "deezer"]);
        assert_eq!(links[0].icon, r#"<img src="assets/spotify.svg" />"#);
        assert_eq!(links[1].url, "https://itunes/x");
    }

    #[test]
    fn listings_without_url_are_skipped() {
        let platforms = vec!["spotify".to_string(), "youtube".to_string()];
        let listings = HashMap::from([
            ("spotify".to_string(), PlatformListing { url: None }),
            ("youtube".to_string(), listing("https://youtube/x")),
        ]);
        let links = platform_links(&platforms, &listings);
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].platform, "youtube");
    }

    #[test]
    fn file_names_drop_query_strings() {
        assert_eq!(
            file_name_from_url("https://p.scdn.co/mp3-preview/abc123?cid=xyz").unwrap(),
            "abc123"
        );
        assert_eq!(
            file_name_from_url("https://i.scdn.co/image/ab67616d").unwrap(),
            "ab67616d"
        );
        assert!(file_name_from_url("https://example.org/").is_err());
        assert!(file_name_from_url("not a url").is_err());
    }

    #[test]
    fn sibling_replaces_last_extension() {
        assert_eq!(sibling("img/ab67.jpg", "mono.png"), "img/ab67.mono.png");
        assert_eq!(sibling("audio/abc.mp3", "proc.mp3"), "audio/abc.proc.mp3");
    }

    #[test]
    fn cached_tracks_contribute_no_new_files() {
        let record = TrackRecord {
            title: "t".into(),
            artist: "a".into(),
            image: "img/x.jpg".into(),
            image_mono: "img/x.mono.png".into(),
            links: vec![],
            songlink_url: "https://song.link/x".into(),
            preview_mp3: "audio/p.proc.mp3".into(),
        };
        let cached = EnrichedTrack {
            id: "x".into(),
            record: record.clone(),
            fresh: false,
        };
        assert!(cached.new_files().is_empty());
        let fresh = EnrichedTrack {
            fresh: true,
            ..cached
        };
        assert_eq!(
            fresh.new_files(),
            vec![
                PathBuf::from("img/x.mono.png"),
                PathBuf::from("audio/p.proc.mp3")
            ]
        );
    }
}
