//! # Connector
//!
//! A logged in FTP session, closed once the connector is disconnected or dropped

use std::fmt;
use std::io::Read;

use suppaftp::types::FileType;
use suppaftp::{FtpError, FtpStream};

use super::session::{self, FtpSession, FtpSessionBuilder};
use super::{ops, reply};
use crate::client::settle;
use crate::config::{FtpConfig, DEFAULT_FTP_PORT};
use crate::stream::StreamOwner;
use crate::types::{self, TransferError, TransferResult};

/// A FTP session logged in and set to binary transfers
pub struct FtpConnector<S: FtpSession = FtpStream> {
    session: Option<S>,
    host: String,
    port: u16,
}

impl FtpConnector<FtpStream> {
    /// Connect and log in to the configured host
    pub fn connect(config: &FtpConfig) -> TransferResult<Self> {
        Self::connect_with(config, &session::connect_stream)
    }
}

impl<S: FtpSession> FtpConnector<S> {
    /// Open a session with `builder`, then log in and switch to binary transfers
    pub fn connect_with(config: &FtpConfig, builder: &FtpSessionBuilder<S>) -> TransferResult<Self> {
        let host_label = config.host_label();
        debug!("Connecting to {host_label} as {}", config.username);
        let mut session = builder(config).map_err(|err| {
            TransferError::connection_caused_by(format!("Failed to connect to {host_label}."), err)
        })?;
        trace!("Connected to {host_label}; logging in");
        session
            .login(&config.username, &config.password)
            .map_err(|err| login_error(&host_label, err))?;
        session.transfer_type(FileType::Binary).map_err(|err| {
            TransferError::connection_caused_by(
                format!(
                    "Failed to set binary transfers on {host_label}: {}.",
                    reply::reply_text(&err)
                ),
                err,
            )
        })?;
        debug!("Logged in to {host_label}");
        Ok(Self::from_session(session, config.host.clone(), config.port))
    }

    /// Wrap a session which is already logged in
    pub fn from_session(session: S, host: impl Into<String>, port: u16) -> Self {
        Self {
            session: Some(session),
            host: host.into(),
            port,
        }
    }

    /// Whether the session is still open
    pub fn is_connected(&self) -> bool {
        self.session.is_some()
    }

    pub fn host_label(&self) -> String {
        types::host_label(&self.host, self.port, DEFAULT_FTP_PORT)
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

    /// Log out and close the session. Closing an already closed connector does nothing.
    ///
    /// The transport is closed even if the server refuses to log out.
    pub fn disconnect(&mut self) -> TransferResult<()> {
        let Some(mut session) = self.session.take() else {
            return Ok(());
        };
        let host_label = self.host_label();
        debug!("Disconnecting from {host_label}");
        let result = session.quit().map_err(|err| {
            TransferError::connection_caused_by(format!("Failed to logout of host {host_label}."), err)
        });
        drop(session);
        result
    }
}

impl<S: FtpSession> fmt::Debug for FtpConnector<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FtpConnector")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("connected", &self.session.is_some())
            .finish()
    }
}

impl<S: FtpSession> Drop for FtpConnector<S> {
    fn drop(&mut self) {
        if let Err(err) = self.disconnect() {
            warn!("{err}");
        }
    }
}

impl<S: FtpSession> StreamOwner for FtpConnector<S> {
    fn release(&mut self, reader: Box<dyn Read>) -> TransferResult<()> {
        let finished = ops::finish_stream(self, reader);
        settle(finished, self.disconnect())
    }
}

fn login_error(host_label: &str, err: FtpError) -> TransferError {
    match &err {
        FtpError::UnexpectedResponse(response) if !reply::is_positive_completion(response.status) => {
            TransferError::connection_caused_by(
                format!("{host_label} refused connection: {response}."),
                err,
            )
        }
        _ => TransferError::connection_caused_by(format!("Failed to log in to {host_label}."), err),
    }
}
