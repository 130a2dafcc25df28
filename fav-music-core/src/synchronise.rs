//! High-level pipeline: fetch → enrich → persist → render → publish.
//!
//! One run reads the playlist, reuses cached records where possible, enriches
//! the rest, rewrites the cache, renders the widget and uploads the files the
//! selected [`UploadMode`] asks for. It is fail-fast: the first error ends the
//! run and nothing is rolled back.
//!
//! # Navigation
//! - Main entrypoint: [`synchronise`]
//! - Supporting types: [`SyncServices`], [`SynchroniseReport`].

use std::path::PathBuf;
use tracing::{error, info};

use crate::cache::{Cache, CacheError};
use crate::config::{Credentials, SyncConfig, UploadMode};
use crate::contract::{
    FetchError, LinkAggregator, MediaFetcher, PlaylistSource, PublishError, RemoteConnector,
    Transcoder,
};
use crate::enrich::{enrich_tracks, EnrichError, EnrichServices};
use crate::playlist::fetch_playlist;
use crate::publish::{list_assets, publish, upload_set};
use crate::render::{write_widget, RenderError};

#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("fetching playlist failed: {0}")]
    Fetch(#[from] FetchError),
    #[error("enriching tracks failed: {0}")]
    Enrich(#[from] EnrichError),
    #[error(transparent)]
    Cache(#[from] CacheError),
    #[error("rendering widget failed: {0}")]
    Render(#[from] RenderError),
    #[error("publishing failed: {0}")]
    Publish(#[from] PublishError),
}

/// Every external collaborator of a run.
pub struct SyncServices<'a> {
    pub playlist: &'a dyn PlaylistSource,
    pub links: &'a dyn LinkAggregator,
    pub media: &'a dyn MediaFetcher,
    pub transcoder: &'a dyn Transcoder,
    pub remote: &'a dyn RemoteConnector,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SynchroniseReport {
    pub mode: UploadMode,
    pub fetched: usize,
    pub cache_hits: usize,
    /// Ids enriched by this run, in playlist order.
    pub enriched: Vec<String>,
    /// Files sent to the server, relative to the work dir.
    pub uploaded: Vec<PathBuf>,
    pub bytes_sent: u64,
}

pub async fn synchronise(
    config: &SyncConfig,
    credentials: &Credentials,
    services: &SyncServices<'_>,
) -> Result<SynchroniseReport, SyncError> {
    info!(mode = ?config.mode, "[SYNC] Starting synchronisation pipeline");

    // --- Step 1: Fetch ---
    let mut tracks = fetch_playlist(
        services.playlist,
        &credentials.client_id,
        &credentials.client_secret,
        &credentials.playlist_id,
        config.page_size,
        config.max_pages,
    )
    .await
    .map_err(|e| {
        error!(error = %e, "[SYNC][ERROR] Playlist fetch failed");
        e
    })?;
    let fetched = tracks.len();
    if let Some(max) = config.max_tracks {
        tracks.truncate(max);
    }
    info!(fetched, using = tracks.len(), "[SYNC] Playlist fetched");

    // --- Step 2: Enrich ---
    let cache_path = config.resolve(&config.cache_file);
    let mut cache = Cache::load(&cache_path)?;
    let enrich_services = EnrichServices {
        links: services.links,
        media: services.media,
        transcoder: services.transcoder,
    };
    let enriched = enrich_tracks(&tracks, &cache, &enrich_services, config)
        .await
        .map_err(|e| {
            error!(error = %e, "[SYNC][ERROR] Enrichment failed");
            e
        })?;

    cache.merge(enriched.iter().map(|t| (t.id.as_str(), &t.record)));
    cache.save(&cache_path)?;
    info!(entries = cache.len(), "[SYNC] Cache written");

    // --- Step 3: Render ---
    let records: Vec<_> = enriched.iter().map(|t| &t.record).collect();
    write_widget(
        &config.resolve(&config.template_file),
        &config.resolve(&config.widget_file),
        &records,
    )?;

    // --- Step 4: Publish ---
    let assets = match config.mode {
        UploadMode::Full => list_assets(&config.work_dir, &config.assets_dir)?,
        UploadMode::Incremental => Vec::new(),
    };
    let files = upload_set(config.mode, &config.widget_file, &enriched, &assets);
    info!(files = files.len(), "[SYNC] Upload set computed");

    let mut store = services.remote.connect().map_err(|e| {
        error!(error = %e, "[SYNC][ERROR] Cannot connect to remote server");
        e
    })?;
    let bytes_sent = publish(&mut *store, &config.work_dir, &files, &config.remote)?;

    let cache_hits = enriched.iter().filter(|t| !t.fresh).count();
    let report = SynchroniseReport {
        mode: config.mode,
        fetched,
        cache_hits,
        enriched: enriched
            .into_iter()
            .filter(|t| t.fresh)
            .map(|t| t.id)
            .collect(),
        uploaded: files,
        bytes_sent,
    };
    info!(
        cache_hits = report.cache_hits,
        enriched = report.enriched.len(),
        uploaded = report.uploaded.len(),
        "[SYNC] Synchronisation complete"
    );
    Ok(report)
}
