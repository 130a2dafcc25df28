//! Persisted per-track records, keyed by track id.
//!
//! The cache file is the whole mapping, pretty-printed. Records are written once
//! and only ever read back verbatim; entries are never dropped by a run.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformLink {
    pub platform: String,
    /// Static markup for the platform icon.
    pub icon: String,
    pub url: String,
}

/// Enriched data for one track, as rendered into the widget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackRecord {
    pub title: String,
    pub artist: String,
    pub image: String,
    pub image_mono: String,
    pub links: Vec<PlatformLink>,
    pub songlink_url: String,
    /// Processed preview path, or empty when the track has no preview.
    pub preview_mp3: String,
}

impl TrackRecord {
    pub fn has_preview(&self) -> bool {
        !self.preview_mp3.is_empty()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("cache file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cache file {path} is not valid: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cache {
    entries: IndexMap<String, TrackRecord>,
}

impl Cache {
    /// Reads the cache file; a missing file is an empty cache.
    pub fn load(path: &Path) -> Result<Self, CacheError> {
        if !path.exists() {
            info!(path = %path.display(), "No cache file, starting empty");
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path).map_err(|source| CacheError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let cache: Self = serde_json::from_str(&text).map_err(|source| CacheError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        info!(path = %path.display(), entries = cache.len(), "Loaded track cache");
        Ok(cache)
    }

    /// Rewrites the whole cache file.
    pub fn save(&self, path: &Path) -> Result<(), CacheError> {
        let json = serde_json::to_string_pretty(self).map_err(|source| CacheError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        std::fs::write(path, json).map_err(|source| CacheError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), entries = self.len(), "Wrote track cache");
        Ok(())
    }

    pub fn get(&self, track_id: &str) -> Option<&TrackRecord> {
        self.entries.get(track_id)
    }

    pub fn contains(&self, track_id: &str) -> bool {
        self.entries.contains_key(track_id)
    }

    /// Adds records for ids not yet present. Existing entries keep their value and position.
    pub fn merge<'a, I>(&mut self, records: I)
    where
        I: IntoIterator<Item = (&'a str, &'a TrackRecord)>,
    {
        for (id, record) in records {
            if !self.entries.contains_key(id) {
                self.entries.insert(id.to_string(), record.clone());
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &TrackRecord)> {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn record(title: &str) -> TrackRecord {
        TrackRecord {
            title: title.into(),
            artist: "Artist".into(),
            image: format!("img/{title}.jpg"),
            image_mono: format!("img/{title}.mono.png"),
            links: vec![PlatformLink {
                platform: "spotify".into(),
                icon: r#"<img src="assets/spotify.svg" />"#.into(),
                url: "https://open.spotify.com/track/x".into(),
            }],
            songlink_url: "https://song.link/s/x".into(),
            preview_mp3: String::new(),
        }
    }

    #[test]
    fn missing_file_loads_empty() {
        let dir = tempdir().unwrap();
        let cache = Cache::load(&dir.path().join("tracks.json")).unwrap();
        assert!(cache.is_empty());
    }

    #[test]
    fn save_then_load_keeps_order_and_field_names() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tracks.json");
        let (b, a) = (record("b"), record("a"));
        let mut cache = Cache::default();
        cache.merge([("zz", &b), ("aa", &a)]);
        cache.save(&path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.find("\"zz\"").unwrap() < text.find("\"aa\"").unwrap());
        assert!(text.contains("\"songlink_url\""));
        assert!(text.contains("\"preview_mp3\": \"\""));
        assert!(text.contains("\n  \"zz\""));

        let loaded = Cache::load(&path).unwrap();
        let ids: Vec<_> = loaded.iter().map(|(id, _)| id.as_str()).collect();
        assert_eq!(ids, vec!["zz", "aa"]);
        assert_eq!(loaded, cache);
    }

    #[test]
    fn merge_never_replaces_existing_records() {
        let mut cache = Cache::default();
        let original = record("first");
        cache.merge([("id1", &original)]);
        let replacement = record("second");
        let newcomer = record("third");
        cache.merge([("id1", &replacement), ("id2", &newcomer)]);
        assert_eq!(cache.get("id1"), Some(&original));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn corrupt_file_is_reported() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tracks.json");
        std::fs::write(&path, "{not json").unwrap();
        assert!(matches!(Cache::load(&path), Err(CacheError::Json { .. })));
    }
}
