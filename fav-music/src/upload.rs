#![doc = "FTP integration: implements the core remote-store traits on top of suppaftp."]
//
//! # FTP publishing (CLI <-> Core)
//!
//! The core crate only knows [`RemoteConnector`] and [`RemoteStore`]. This module
//! provides the real implementation used by the CLI: a plain FTP session that
//! logs in, switches to binary mode and stores files by name.
//!
//! - [`FtpConnector`] holds host and login and opens one session per run.
//! - [`FtpStore`] maps suppaftp errors onto [`PublishError`]; a 550 reply to MKD
//!   is reported as [`PublishError::AlreadyExists`] so the publisher can ignore it.

use fav_music_core::config::Credentials;
use fav_music_core::contract::{PublishError, RemoteConnector, RemoteStore};
use std::fs::File;
use std::path::Path;
use suppaftp::types::FileType;
use suppaftp::{FtpError, FtpStream, Status};

fn remote_err(op: &'static str, e: FtpError) -> PublishError {
    tracing::error!(error = %e, op, "FTP command failed");
    PublishError::Remote {
        op,
        message: e.to_string(),
    }
}

pub struct FtpConnector {
    host: String,
    port: u16,
    user: String,
    password: String,
}

impl FtpConnector {
    pub fn new(credentials: &Credentials, port: u16) -> Self {
        Self {
            host: credentials.ftp_host.clone(),
            port,
            user: credentials.ftp_user.clone(),
            password: credentials.ftp_password.clone(),
        }
    }
}

impl RemoteConnector for FtpConnector {
    fn connect(&self) -> Result<Box<dyn RemoteStore>, PublishError> {
        tracing::info!(host = %self.host, port = self.port, "Connecting to FTP server");
        let mut stream = FtpStream::connect((self.host.as_str(), self.port))
            .map_err(|e| remote_err("connect", e))?;
        stream
            .login(self.user.as_str(), self.password.as_str())
            .map_err(|e| remote_err("login", e))?;
        stream
            .transfer_type(FileType::Binary)
            .map_err(|e| remote_err("TYPE", e))?;
        tracing::info!(user = %self.user, "Logged in to FTP server");
        Ok(Box::new(FtpStore { stream }))
    }
}

pub struct FtpStore {
    stream: FtpStream,
}

impl RemoteStore for FtpStore {
    fn change_dir(&mut self, path: &str) -> Result<(), PublishError> {
        self.stream.cwd(path).map_err(|e| remote_err("CWD", e))
    }

    fn make_dir(&mut self, path: &str) -> Result<(), PublishError> {
        match self.stream.mkdir(path) {
            Ok(()) => Ok(()),
            Err(FtpError::UnexpectedResponse(resp)) if resp.status == Status::FileUnavailable => {
                Err(PublishError::AlreadyExists {
                    path: path.to_string(),
                })
            }
            Err(e) => Err(remote_err("MKD", e)),
        }
    }

    fn put_file(&mut self, remote_name: &str, local: &Path) -> Result<u64, PublishError> {
        let mut file = File::open(local).map_err(|source| PublishError::Io {
            path: local.to_path_buf(),
            source,
        })?;
        let sent = self
            .stream
            .put_file(remote_name, &mut file)
            .map_err(|e| remote_err("STOR", e))?;
        tracing::debug!(remote_name, bytes = sent, "Stored file");
        Ok(sent)
    }

    fn disconnect(&mut self) -> Result<(), PublishError> {
        self.stream.quit().map_err(|e| remote_err("QUIT", e))
    }
}
