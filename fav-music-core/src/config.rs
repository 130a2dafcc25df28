use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Which files a run republishes to the remote server.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadMode {
    /// Only files produced by this run, plus the widget.
    #[default]
    Incremental,
    /// The widget, every current track's media and every static asset.
    Full,
}

/// External executables used to post-process downloaded media.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    pub magick: String,
    pub ffmpeg: String,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            magick: "magick".to_string(),
            ffmpeg: "ffmpeg".to_string(),
        }
    }
}

/// Remote layout and connection settings. Host and login live in [`Credentials`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    pub port: u16,
    /// Directory changed into right after login.
    pub subdir: String,
    /// Subdirectories ensured to exist under `subdir`.
    pub dirs: Vec<String>,
    /// Pause before QUIT so the server can flush its buffers.
    pub disconnect_pause_ms: u64,
    /// Store files under their work-dir relative path (`img/x.mono.png`)
    /// instead of their basename.
    pub relative_names: bool,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            port: 21,
            subdir: "fav-music".to_string(),
            dirs: vec!["img".into(), "audio".into(), "assets".into()],
            disconnect_pause_ms: 500,
            relative_names: false,
        }
    }
}

/// Everything a sync run needs apart from secrets.
///
/// All relative paths are resolved against `work_dir`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    pub work_dir: PathBuf,
    pub cache_file: PathBuf,
    pub template_file: PathBuf,
    pub widget_file: PathBuf,
    pub image_dir: String,
    pub audio_dir: String,
    pub assets_dir: PathBuf,
    /// Platforms linked from the widget, in display order.
    pub platforms: Vec<String>,
    pub max_tracks: Option<usize>,
    pub page_size: u32,
    /// Upper bound on playlist page requests before giving up.
    pub max_pages: usize,
    pub user_country: String,
    pub song_entity_prefix: String,
    pub tools: ToolsConfig,
    pub remote: RemoteConfig,
    pub mode: UploadMode,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            work_dir: PathBuf::from("."),
            cache_file: PathBuf::from("tracks.json"),
            template_file: PathBuf::from("widget.html.tmpl"),
            widget_file: PathBuf::from("index.html"),
            image_dir: "img".to_string(),
            audio_dir: "audio".to_string(),
            assets_dir: PathBuf::from("assets"),
            platforms: ["spotify", "youtube", "itunes", "deezer", "soundcloud"]
                .into_iter()
                .map(String::from)
                .collect(),
            max_tracks: Some(5),
            page_size: 100,
            max_pages: 1000,
            user_country: "GB".to_string(),
            song_entity_prefix: "SPOTIFY_SONG::".to_string(),
            tools: ToolsConfig::default(),
            remote: RemoteConfig::default(),
            mode: UploadMode::Incremental,
        }
    }
}

impl SyncConfig {
    /// Resolves a path relative to the working directory.
    pub fn resolve(&self, relative: impl AsRef<Path>) -> PathBuf {
        self.work_dir.join(relative)
    }

    pub fn trace_loaded(&self) {
        info!(
            work_dir = %self.work_dir.display(),
            platforms = self.platforms.len(),
            max_tracks = ?self.max_tracks,
            mode = ?self.mode,
            "Loaded SyncConfig"
        );
        debug!(?self, "SyncConfig loaded (full debug)");
    }
}

/// Secrets and identifiers, each read from its own file at startup.
#[derive(Clone, PartialEq)]
pub struct Credentials {
    pub playlist_id: String,
    pub client_id: String,
    pub client_secret: String,
    pub ftp_host: String,
    pub ftp_user: String,
    pub ftp_password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("playlist_id", &self.playlist_id)
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("ftp_host", &self.ftp_host)
            .field("ftp_user", &self.ftp_user)
            .field("ftp_password", &"<redacted>")
            .finish()
    }
}

impl Credentials {
    pub fn trace_loaded(&self) {
        info!(
            playlist_id = %self.playlist_id,
            ftp_host = %self.ftp_host,
            "Loaded Credentials"
        );
        debug!(?self, "Credentials loaded (full debug)");
    }
}
