#![crate_name = "frontier"]
#![crate_type = "lib"]

//! # Frontier
//!
//! Frontier is a file transfer client library which talks to both **FTP** and **SFTP** servers
//! through a single interface, [`FileTransferClient`].
//!
//! Whatever the protocol behind it, a client can:
//!
//! - check whether a remote file or directory exists
//! - stream or read a remote file
//! - list a remote directory
//! - download a remote file to a writer or to a local path, one or many at once
//! - upload from a reader or from a local file
//! - delete a remote file
//!
//! Every read operation comes in two flavours: an `optional_*` method which returns `None` when the
//! remote file does not exist, and a failing method which returns
//! [`TransferError::MissingRemoteFile`] instead.
//!
//! ## Get started
//!
//! ```toml
//! frontier = "^0.4"
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use frontier::{FileTransferClient, FtpClient, FtpConfig};
//!
//! let client = FtpClient::new(FtpConfig::new("127.0.0.1", "test", "test").port(10021));
//! if client.dir_exists("reports")? {
//!     for file in client.list("reports")? {
//!         println!("{} {:?}", file.name(), file.size());
//!     }
//! }
//! let content = client.slurp("reports/latest.csv")?;
//! ```
//!
//! Each call opens its own connection and closes it before returning, even on error.
//! To run several operations on the same session, open a connector and use the
//! protocol operation modules, [`ftp::ops`] and [`sftp::ops`], directly:
//!
//! ```rust,ignore
//! use frontier::{ftp, FtpConfig};
//!
//! let mut conn = ftp::FtpConnector::connect(&FtpConfig::new("127.0.0.1", "test", "test"))?;
//! let exists = ftp::ops::file_exists(&mut conn, "foo.txt")?;
//! conn.disconnect()?;
//! ```
//!
//! ## SFTP
//!
//! ```rust,ignore
//! use frontier::{FileTransferClient, SftpClient, SftpConfig};
//!
//! let client = SftpClient::new(
//!     SftpConfig::with_key("example.org", "alice", "/home/alice/.ssh/id_ed25519")
//!         .known_hosts("/home/alice/.ssh/known_hosts"),
//! );
//! client.upload_file("report.csv".as_ref(), "upload/report.csv")?;
//! ```
//!

// -- common deps
#[macro_use]
extern crate lazy_regex;
#[macro_use]
extern crate log;

// -- private
mod client;
mod local;
mod stream;
#[cfg(all(test, feature = "with-containers"))]
mod test_container;
#[cfg(test)]
mod test_session;

// -- public
pub mod config;
pub mod file_info;
pub mod ftp;
pub mod sftp;
pub mod types;

// -- export
pub use client::FileTransferClient;
pub use config::{Endpoint, FtpConfig, HostKeyPolicy, Protocol, SftpConfig};
pub use file_info::FileInfo;
pub use ftp::FtpClient;
pub use sftp::SftpClient;
pub use stream::RemoteStream;
pub use types::{TransferError, TransferResult};

// -- test logging
#[cfg(test)]
pub fn log_init() {
    let _ = env_logger::builder().is_test(true).try_init();
}
