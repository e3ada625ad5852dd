//! # Connector
//!
//! An authenticated SFTP session, closed once the connector is disconnected or dropped

use std::fmt;
use std::io::Read;

use super::session::{SftpSession, SftpSessionBuilder, Ssh2Session};
use crate::config::{SftpConfig, DEFAULT_SFTP_PORT};
use crate::stream::StreamOwner;
use crate::types::{self, TransferError, TransferResult};

pub struct SftpConnector<S: SftpSession = Ssh2Session> {
    session: Option<S>,
    host: String,
    port: u16,
}

impl SftpConnector<Ssh2Session> {
    /// Connect and authenticate to the configured host
    pub fn connect(config: &SftpConfig) -> TransferResult<Self> {
        Self::connect_with(config, &Ssh2Session::connect)
    }
}

impl<S: SftpSession> SftpConnector<S> {
    /// Open a session with `builder`
    pub fn connect_with(config: &SftpConfig, builder: &SftpSessionBuilder<S>) -> TransferResult<Self> {
        let session = builder(config)?;
        Ok(Self::from_session(session, config.host.clone(), config.port))
    }

    /// Wrap a session which is already authenticated
    pub fn from_session(session: S, host: impl Into<String>, port: u16) -> Self {
        Self {
            session: Some(session),
            host: host.into(),
            port,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.session.is_some()
    }

    pub fn host_label(&self) -> String {
        types::host_label(&self.host, self.port, DEFAULT_SFTP_PORT)
    }

    pub fn location_label(&self, path: &str) -> String {
        types::location_label(&self.host_label(), path)
    }

    /// Get the open session
    pub fn session_mut(&mut self) -> TransferResult<&mut S> {
        let host_label = self.host_label();
        self.session
            .as_mut()
            .ok_or_else(|| TransferError::connection(format!("Not connected to {host_label}.")))
    }

    /// Close the session. Closing an already closed connector does nothing.
    pub fn disconnect(&mut self) -> TransferResult<()> {
        let Some(mut session) = self.session.take() else {
            return Ok(());
        };
        let host_label = self.host_label();
        debug!("Disconnecting from {host_label}");
        session.disconnect().map_err(|err| {
            TransferError::connection_caused_by(
                format!("Failed to disconnect from host {host_label}."),
                err,
            )
        })
    }
}

impl<S: SftpSession> fmt::Debug for SftpConnector<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SftpConnector")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("connected", &self.session.is_some())
            .finish()
    }
}

impl<S: SftpSession> Drop for SftpConnector<S> {
    fn drop(&mut self) {
        if let Err(err) = self.disconnect() {
            warn!("{err}");
        }
    }
}

impl<S: SftpSession> StreamOwner for SftpConnector<S> {
    fn release(&mut self, reader: Box<dyn Read>) -> TransferResult<()> {
        drop(reader);
        self.disconnect()
    }
}
