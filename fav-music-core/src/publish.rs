//! Publishing: which files go to the server, and the transfer itself.

use std::path::{Component, Path, PathBuf};
use std::time::Duration;
use tracing::{debug, error, info, warn};

use crate::config::{RemoteConfig, UploadMode};
use crate::contract::{PublishError, RemoteStore};
use crate::enrich::EnrichedTrack;

/// Files to transfer this run, relative to the work dir, in upload order.
///
/// The widget always comes first. `assets` only matters in full mode.
pub fn upload_set(
    mode: UploadMode,
    widget: &Path,
    tracks: &[EnrichedTrack],
    assets: &[PathBuf],
) -> Vec<PathBuf> {
    let mut files = vec![widget.to_path_buf()];
    match mode {
        UploadMode::Full => {
            files.extend(tracks.iter().map(|t| PathBuf::from(&t.record.image_mono)));
            files.extend(
                tracks
                    .iter()
                    .filter(|t| t.record.has_preview())
                    .map(|t| PathBuf::from(&t.record.preview_mp3)),
            );
            files.extend(assets.iter().cloned());
        }
        UploadMode::Incremental => {
            files.extend(tracks.iter().flat_map(EnrichedTrack::new_files));
        }
    }
    files
}

/// Regular files directly under `assets_dir` (relative to `work_dir`), sorted by name.
pub fn list_assets(work_dir: &Path, assets_dir: &Path) -> Result<Vec<PathBuf>, PublishError> {
    let dir = work_dir.join(assets_dir);
    if !dir.is_dir() {
        warn!(path = %dir.display(), "[PUBLISH] No assets directory");
        return Ok(Vec::new());
    }
    let io_err = |source| PublishError::Io {
        path: dir.clone(),
        source,
    };
    let mut assets = Vec::new();
    for entry in std::fs::read_dir(&dir).map_err(io_err)? {
        let entry = entry.map_err(io_err)?;
        if entry.file_type().map_err(io_err)?.is_file() {
            assets.push(assets_dir.join(entry.file_name()));
        }
    }
    assets.sort();
    Ok(assets)
}

/// Basename of `path`, or its `/`-joined relative path when `relative` is set.
fn remote_name(path: &Path, relative: bool) -> Result<String, PublishError> {
    let no_name = || PublishError::Remote {
        op: "STOR",
        message: format!("{} has no file name", path.display()),
    };
    if relative {
        let parts: Vec<_> = path
            .components()
            .filter_map(|c| match c {
                Component::Normal(part) => Some(part.to_string_lossy()),
                _ => None,
            })
            .collect();
        if parts.is_empty() {
            return Err(no_name());
        }
        return Ok(parts.join("/"));
    }
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(no_name)
}

/// Changes into the remote subdir, ensures the remote directories, uploads
/// every file under its remote name, then disconnects.
///
/// Stops at the first failure; files already sent stay on the server.
/// The pause before disconnecting is a blocking sleep on the calling thread.
pub fn publish<S>(
    store: &mut S,
    work_dir: &Path,
    files: &[PathBuf],
    remote: &RemoteConfig,
) -> Result<u64, PublishError>
where
    S: RemoteStore + ?Sized,
{
    info!(subdir = %remote.subdir, "[PUBLISH] Sending to FTP server");
    store.change_dir(&remote.subdir)?;

    for dir in &remote.dirs {
        match store.make_dir(dir) {
            Ok(()) => debug!(dir = %dir, "[PUBLISH] Created remote directory"),
            Err(PublishError::AlreadyExists { .. }) => {
                debug!(dir = %dir, "[PUBLISH] Remote directory already exists")
            }
            Err(e) => {
                error!(error = %e, dir = %dir, "[PUBLISH] Cannot create remote directory");
                return Err(e);
            }
        }
    }

    let mut total = 0u64;
    for file in files {
        let name = remote_name(file, remote.relative_names)?;
        info!(file = %file.display(), "[PUBLISH] Uploading");
        let sent = store.put_file(&name, &work_dir.join(file)).map_err(|e| {
            error!(error = %e, file = %file.display(), "[PUBLISH] Upload failed");
            e
        })?;
        total += sent;
    }

    std::thread::sleep(Duration::from_millis(remote.disconnect_pause_ms));
    store.disconnect()?;
    info!(files = files.len(), bytes = total, "[PUBLISH] Upload complete");
    Ok(total)
}
