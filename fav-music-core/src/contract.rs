//! # contract: collaborator seams and error types for the sync pipeline
//!
//! Every external system the pipeline talks to sits behind one of the traits below:
//! - [`PlaylistSource`]: the streaming service (token exchange + paged playlist reads)
//! - [`LinkAggregator`]: the cross-platform link lookup service
//! - [`MediaFetcher`]: plain downloads of artwork and preview audio
//! - [`Transcoder`]: the external image/audio tools
//! - [`RemoteConnector`] / [`RemoteStore`]: the file server the widget is published to
//!
//! The traits are annotated for `mockall`, so tests can drive the pipeline
//! without network access, external tools or a file server.

use async_trait::async_trait;
use std::path::{Path, PathBuf};

use mockall::automock;

use crate::playlist::PlaylistPage;
use crate::songlink::SonglinkResponse;

/// A field or entity the pipeline relies on was absent from an upstream response.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("{context}: missing field `{field}`")]
    MissingField {
        context: &'static str,
        field: &'static str,
    },
    #[error("no entity with prefix `{prefix}` for track {track_id}")]
    NoSongEntity { track_id: String, prefix: String },
    #[error("cannot derive a file name from url `{url}`")]
    InvalidUrl { url: String },
}

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("{url} returned {status}: {body}")]
    Status {
        url: String,
        status: u16,
        body: String,
    },
    #[error("authentication failed: {0}")]
    Auth(String),
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error("pagination did not terminate after {pages} pages")]
    PaginationLimit { pages: usize },
}

#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("failed to launch `{tool}`: {source}")]
    Launch {
        tool: String,
        #[source]
        source: std::io::Error,
    },
    #[error("`{tool}` exited with {status}")]
    Failed { tool: String, status: String },
}

#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    #[error("remote {op} failed: {message}")]
    Remote { op: &'static str, message: String },
    #[error("remote path `{path}` already exists")]
    AlreadyExists { path: String },
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Reads playlists from the streaming service.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait PlaylistSource: Send + Sync {
    /// Exchanges client credentials for a bearer token.
    async fn request_token(
        &self,
        client_id: &str,
        client_secret: &str,
    ) -> Result<String, FetchError>;

    /// Fetches one page of playlist entries from an absolute URL.
    async fn fetch_page(&self, token: &str, url: &str) -> Result<PlaylistPage, FetchError>;
}

/// Maps a single track reference to its listings on other platforms.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait LinkAggregator: Send + Sync {
    async fn lookup(&self, track_id: &str, country: &str)
        -> Result<SonglinkResponse, FetchError>;
}

#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait MediaFetcher: Send + Sync {
    async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>, FetchError>;
}

/// Post-processing of downloaded media by external tools.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
pub trait Transcoder: Send + Sync {
    /// Two-colour, 200x200, ordered-dithered copy of `src` written to `dst`.
    fn dither_image(&self, src: &Path, dst: &Path) -> Result<(), ToolError>;

    /// Quarter-volume copy of `src` written to `dst`.
    fn attenuate_audio(&self, src: &Path, dst: &Path) -> Result<(), ToolError>;
}

/// An authenticated, stateful session with the remote file server.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
pub trait RemoteStore {
    fn change_dir(&mut self, path: &str) -> Result<(), PublishError>;

    /// Creates a directory; an existing one is reported as [`PublishError::AlreadyExists`].
    fn make_dir(&mut self, path: &str) -> Result<(), PublishError>;

    /// Stores `local` as binary content under `remote_name`, returning the bytes sent.
    fn put_file(&mut self, remote_name: &str, local: &Path) -> Result<u64, PublishError>;

    fn disconnect(&mut self) -> Result<(), PublishError>;
}

/// Opens [`RemoteStore`] sessions. Connection happens only once publishing starts.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
pub trait RemoteConnector: Send + Sync {
    fn connect(&self) -> Result<Box<dyn RemoteStore>, PublishError>;
}
