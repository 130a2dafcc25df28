/// `load_config` module: turns the optional YAML file and the credential files
/// into the core crate's [`SyncConfig`] and [`Credentials`].
///
/// # Responsibilities
/// - Parse the YAML file (every key optional; a missing `--config` means defaults)
/// - Read each secret from its own file, trimming surrounding whitespace
/// - Fail with a message naming the offending file when a secret is missing or empty
///
/// # Errors
/// All errors use `anyhow::Error` and are surfaced at the CLI boundary.
use anyhow::{anyhow, Context, Result};
use fav_music_core::config::{Credentials, SyncConfig};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info};

/// Files holding the secrets, relative to the work dir unless absolute.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SecretFiles {
    pub playlist_id: PathBuf,
    pub client_id: PathBuf,
    pub client_secret: PathBuf,
    pub ftp_host: PathBuf,
    pub ftp_user: PathBuf,
    pub ftp_password: PathBuf,
}

impl Default for SecretFiles {
    fn default() -> Self {
        Self {
            playlist_id: "SPOTIFY_PLAYLIST_ID".into(),
            client_id: "SPOTIFY_CLIENT_ID".into(),
            client_secret: "SPOTIFY_CLIENT_SECRET".into(),
            ftp_host: "FTP_DOMAIN".into(),
            ftp_user: "FTP_USERNAME".into(),
            ftp_password: "FTP_PASSWORD".into(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct CliConfig {
    #[serde(flatten)]
    pub sync: SyncConfig,
    #[serde(default)]
    pub secrets: SecretFiles,
}

/// Loads the YAML config file, or defaults when no file is given.
pub fn load_config(path: Option<&Path>) -> Result<CliConfig> {
    let Some(path_ref) = path else {
        info!("No config file given, using defaults");
        return Ok(CliConfig::default());
    };
    info!(config_path = ?path_ref, "Loading configuration from file");

    let config_content = match fs::read_to_string(path_ref) {
        Ok(content) => content,
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to read config file");
            return Err(anyhow!("Failed to read config file {:?}: {}", path_ref, e));
        }
    };

    if config_content.trim().is_empty() {
        return Ok(CliConfig::default());
    }

    match serde_yaml::from_str::<CliConfig>(&config_content) {
        Ok(conf) => {
            info!(config_path = ?path_ref, "Parsed config YAML successfully");
            Ok(conf)
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to parse config YAML");
            Err(anyhow!("Failed to parse config YAML: {e}"))
        }
    }
}

fn read_secret(work_dir: &Path, file: &Path) -> Result<String> {
    let path = work_dir.join(file);
    let raw = fs::read_to_string(&path)
        .with_context(|| format!("failed to read credential file {}", path.display()))?;
    let value = raw.trim();
    if value.is_empty() {
        return Err(anyhow!("credential file {} is empty", path.display()));
    }
    Ok(value.to_string())
}

/// Reads every credential file. Any missing or empty file is an error.
pub fn load_credentials(work_dir: &Path, files: &SecretFiles) -> Result<Credentials> {
    let credentials = Credentials {
        playlist_id: read_secret(work_dir, &files.playlist_id)?,
        client_id: read_secret(work_dir, &files.client_id)?,
        client_secret: read_secret(work_dir, &files.client_secret)?,
        ftp_host: read_secret(work_dir, &files.ftp_host)?,
        ftp_user: read_secret(work_dir, &files.ftp_user)?,
        ftp_password: read_secret(work_dir, &files.ftp_password)?,
    };
    credentials.trace_loaded();
    Ok(credentials)
}
