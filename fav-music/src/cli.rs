///
/// This module implements the CLI interface for fav-music: command parsing,
/// config loading and wiring the real clients into the core pipeline.
///
/// All pipeline logic lives in the [`fav-music-core`] crate.
///
/// [`fav-music-core`]: ../../fav-music-core/
use crate::load_config::{load_config, load_credentials};
use crate::upload::FtpConnector;
use anyhow::Result;
use clap::{Parser, Subcommand};
use fav_music_core::config::UploadMode;
use fav_music_core::media::HttpMediaFetcher;
use fav_music_core::playlist::SpotifyClient;
use fav_music_core::songlink::SonglinkClient;
use fav_music_core::synchronise::{synchronise, SyncServices};
use fav_music_core::transcode::CommandTranscoder;
use std::path::PathBuf;

/// CLI for fav-music: refresh and publish the favourite-music widget.
#[derive(Parser)]
#[clap(
    name = "fav-music",
    version,
    about = "Publish a widget of a playlist's latest tracks, with cross-platform links, to an FTP server"
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Fetch the playlist, enrich new tracks, render the widget and upload it
    Sync {
        /// Path to an optional YAML config file
        #[clap(long)]
        config: Option<PathBuf>,
        /// Republish every file instead of only the ones created by this run
        #[clap(long)]
        full: bool,
        /// Directory holding the template, credentials, cache and media
        #[clap(long)]
        work_dir: Option<PathBuf>,
    },
}

/// Async CLI entrypoint for integration tests and main()
pub async fn run(cli: Cli) -> Result<()> {
    tracing::info!("trace_initialised");

    match cli.command {
        Commands::Sync {
            config,
            full,
            work_dir,
        } => {
            let loaded = load_config(config.as_deref())?;
            let mut sync_config = loaded.sync;
            if let Some(dir) = work_dir {
                sync_config.work_dir = dir;
            }
            if full {
                sync_config.mode = UploadMode::Full;
            }
            sync_config.trace_loaded();
            let credentials = load_credentials(&sync_config.work_dir, &loaded.secrets)?;

            let http = reqwest::Client::new();
            let playlist = SpotifyClient::new(http.clone());
            let links = SonglinkClient::new(http.clone());
            let media = HttpMediaFetcher::new(http);
            let transcoder = CommandTranscoder::new(sync_config.tools.clone());
            let remote = FtpConnector::new(&credentials, sync_config.remote.port);
            let services = SyncServices {
                playlist: &playlist,
                links: &links,
                media: &media,
                transcoder: &transcoder,
                remote: &remote,
            };

            tracing::info!(command = "sync", "Starting synchronisation process");
            match synchronise(&sync_config, &credentials, &services).await {
                Ok(report) => {
                    tracing::info!(command = "sync", ?report, "Synchronisation complete");
                    Ok(())
                }
                Err(e) => {
                    tracing::error!(command = "sync", error = %e, "Synchronisation failed");
                    Err(anyhow::Error::new(e))
                }
            }
        }
    }
}
