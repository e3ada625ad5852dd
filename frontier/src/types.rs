//! # Types
//!
//! The error taxonomy shared by every protocol, plus the labels used to name remote locations

use std::error::Error as StdError;
use std::path::PathBuf;

use thiserror::Error;

/// A shorthand for a Result whose error type is always a [`TransferError`].
pub type TransferResult<T> = std::result::Result<T, TransferError>;

/// Underlying cause of an error, usually the native error of the protocol implementation
pub type Cause = Box<dyn StdError + Send + Sync + 'static>;

/// `TransferError` is the library-global error type. Whatever protocol is in use,
/// every failure is reported as one of these variants.
#[derive(Debug, Error)]
pub enum TransferError {
    /// Could not connect, authenticate or disconnect.
    /// Fatal to the current operation, never retried.
    #[error("Connection error: {message}")]
    Connection {
        message: String,
        #[source]
        source: Option<Cause>,
    },
    /// The server reported an unexpected status, or the transfer failed mid-stream
    #[error("Transfer error: {message}")]
    Transfer {
        message: String,
        #[source]
        source: Option<Cause>,
    },
    /// The server confirmed that the remote path does not exist
    #[error("File {location} not found.")]
    MissingRemoteFile { path: String, location: String },
    /// The local file to upload does not exist
    #[error("Local source file {} does not exist.", .path.display())]
    MissingLocalFile { path: PathBuf },
}

impl TransferError {
    /// Instantiates a new [`TransferError::Connection`] without cause
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
            source: None,
        }
    }

    /// Instantiates a new [`TransferError::Connection`] caused by `source`
    pub fn connection_caused_by(message: impl Into<String>, source: impl Into<Cause>) -> Self {
        Self::Connection {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Instantiates a new [`TransferError::Transfer`] without cause
    pub fn transfer(message: impl Into<String>) -> Self {
        Self::Transfer {
            message: message.into(),
            source: None,
        }
    }

    /// Instantiates a new [`TransferError::Transfer`] caused by `source`
    pub fn transfer_caused_by(message: impl Into<String>, source: impl Into<Cause>) -> Self {
        Self::Transfer {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Instantiates a new [`TransferError::MissingRemoteFile`]
    pub fn missing_remote_file(path: impl Into<String>, location: impl Into<String>) -> Self {
        Self::MissingRemoteFile {
            path: path.into(),
            location: location.into(),
        }
    }

    /// Instantiates a new [`TransferError::MissingLocalFile`]
    pub fn missing_local_file(path: impl Into<PathBuf>) -> Self {
        Self::MissingLocalFile { path: path.into() }
    }

    /// Returns whether this error reports a missing remote file
    pub fn is_missing_remote_file(&self) -> bool {
        matches!(self, Self::MissingRemoteFile { .. })
    }
}

/// Label naming a host in messages. The port is omitted when it's the protocol default.
pub(crate) fn host_label(host: &str, port: u16, default_port: u16) -> String {
    if port == default_port {
        host.to_string()
    } else {
        format!("{host}:{port}")
    }
}

/// Label naming a path on a host in messages, e.g. `localhost:2121:test/foo.txt`
pub(crate) fn location_label(host_label: &str, path: &str) -> String {
    format!("{host_label}:{path}")
}
