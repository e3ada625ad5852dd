//! # SFTP
//!
//! The SFTP flavour of [`FileTransferClient`]

mod connector;
pub mod ops;
mod session;
pub mod status;

use std::collections::BTreeMap;
use std::io::{Read, Write};
use std::path::Path;

pub use connector::SftpConnector;
pub use session::{SftpSession, SftpSessionBuilder, SftpWriter, Ssh2Session};

use crate::client::{settle, FileTransferClient};
use crate::config::SftpConfig;
use crate::file_info::FileInfo;
use crate::local;
use crate::stream::RemoteStream;
use crate::types::TransferResult;

/// A [`FileTransferClient`] talking to a SFTP server.
///
/// Every operation runs over its own SSH session, which is closed before the operation returns.
pub struct SftpClient<S: SftpSession = Ssh2Session> {
    config: SftpConfig,
    session_builder: Box<SftpSessionBuilder<S>>,
}

impl SftpClient<Ssh2Session> {
    pub fn new(config: SftpConfig) -> Self {
        Self::with_session_builder(config, Ssh2Session::connect)
    }
}

impl<S: SftpSession + 'static> SftpClient<S> {
    /// Create a client which opens its sessions with `builder`
    pub fn with_session_builder<F>(config: SftpConfig, builder: F) -> Self
    where
        F: Fn(&SftpConfig) -> TransferResult<S> + Send + Sync + 'static,
    {
        Self {
            config,
            session_builder: Box::new(builder),
        }
    }

    pub fn config(&self) -> &SftpConfig {
        &self.config
    }

    /// Open a new session; it's up to the caller to disconnect it
    pub fn connect(&self) -> TransferResult<SftpConnector<S>> {
        SftpConnector::connect_with(&self.config, self.session_builder.as_ref())
    }

    /// Run `op` over a new session, and disconnect it whatever the outcome
    pub fn with_connector<T, F>(&self, op: F) -> TransferResult<T>
    where
        F: FnOnce(&mut SftpConnector<S>) -> TransferResult<T>,
    {
        let mut conn = self.connect()?;
        let outcome = op(&mut conn);
        settle(outcome, conn.disconnect())
    }
}

impl<S: SftpSession + 'static> FileTransferClient for SftpClient<S> {
    fn host_label(&self) -> String {
        self.config.host_label()
    }

    fn dir_exists(&self, path: &str) -> TransferResult<bool> {
        self.with_connector(|conn| ops::dir_exists(conn, path))
    }

    fn file_exists(&self, path: &str) -> TransferResult<bool> {
        self.with_connector(|conn| ops::file_exists(conn, path))
    }

    fn optional_stream(&self, path: &str) -> TransferResult<Option<RemoteStream>> {
        let mut conn = self.connect()?;
        match ops::optional_stream(&mut conn, path) {
            Ok(Some(reader)) => Ok(Some(RemoteStream::new(
                self.location_label(path),
                reader,
                conn,
            ))),
            outcome => settle(outcome.map(|_| None), conn.disconnect()),
        }
    }

    fn optional_slurp(&self, path: &str) -> TransferResult<Option<Vec<u8>>> {
        self.with_connector(|conn| ops::optional_slurp(conn, path))
    }

    fn list(&self, path: &str) -> TransferResult<Vec<FileInfo>> {
        self.with_connector(|conn| ops::list(conn, path))
    }

    fn optional_download(&self, path: &str, sink: &mut dyn Write) -> TransferResult<bool> {
        self.with_connector(|conn| ops::optional_download(conn, path, sink))
    }

    fn optional_download_to_file(&self, path: &str, local: &Path) -> TransferResult<bool> {
        self.with_connector(|conn| ops::optional_download_to_file(conn, path, local))
    }

    fn download_all(
        &self,
        targets: BTreeMap<String, &mut dyn Write>,
    ) -> TransferResult<BTreeMap<String, bool>> {
        self.with_connector(|conn| ops::download_all(conn, targets))
    }

    fn upload(&self, source: &mut dyn Read, dest: &str) -> TransferResult<String> {
        self.with_connector(|conn| ops::upload(conn, source, dest))
    }

    fn upload_file(&self, local: &Path, dest: &str) -> TransferResult<String> {
        local::ensure_exists(local)?;
        self.with_connector(|conn| ops::upload_file(conn, local, dest))
    }

    fn delete(&self, path: &str) -> TransferResult<()> {
        self.with_connector(|conn| ops::delete(conn, path))
    }
}
