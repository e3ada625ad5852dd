//! # Client
//!
//! The protocol agnostic file transfer facade

use std::collections::BTreeMap;
use std::io::{Read, Write};
use std::path::Path;

use crate::file_info::FileInfo;
use crate::stream::RemoteStream;
use crate::types::{self, TransferError, TransferResult};

/// A client transferring files from and to a single remote host.
///
/// Every operation opens its own session, and closes it before returning, with the exception of
/// [`FileTransferClient::optional_stream`], whose session is owned by the returned stream.
///
/// Operations come in two forms: the `optional_*` form reports a missing remote file as an absent
/// result, while the plain form fails with [`TransferError::MissingRemoteFile`].
pub trait FileTransferClient {
    /// Label naming the remote host in messages
    fn host_label(&self) -> String;

    /// Label naming `path` on the remote host in messages
    fn location_label(&self, path: &str) -> String {
        types::location_label(&self.host_label(), path)
    }

    /// Whether there is a directory at `path`.
    /// Fails if `path` exists but is a file.
    fn dir_exists(&self, path: &str) -> TransferResult<bool>;

    /// Whether there is a file at `path`.
    /// Fails if `path` exists but is a directory.
    fn file_exists(&self, path: &str) -> TransferResult<bool>;

    /// Open a stream reading the file at `path`, if it exists
    fn optional_stream(&self, path: &str) -> TransferResult<Option<RemoteStream>>;

    /// Open a stream reading the file at `path`
    fn stream(&self, path: &str) -> TransferResult<RemoteStream> {
        self.optional_stream(path)?
            .ok_or_else(|| self.missing_remote_file(path))
    }

    /// Read the whole file at `path`, if it exists
    fn optional_slurp(&self, path: &str) -> TransferResult<Option<Vec<u8>>>;

    /// Read the whole file at `path`
    fn slurp(&self, path: &str) -> TransferResult<Vec<u8>> {
        self.optional_slurp(path)?
            .ok_or_else(|| self.missing_remote_file(path))
    }

    /// List the entries of the directory at `path`, in server order
    fn list(&self, path: &str) -> TransferResult<Vec<FileInfo>>;

    /// Write the file at `path` into `sink`. Returns whether the file exists.
    fn optional_download(&self, path: &str, sink: &mut dyn Write) -> TransferResult<bool>;

    /// Write the file at `path` into `sink`
    fn download(&self, path: &str, sink: &mut dyn Write) -> TransferResult<()> {
        if self.optional_download(path, sink)? {
            Ok(())
        } else {
            Err(self.missing_remote_file(path))
        }
    }

    /// Write the file at `path` into the local file `local`. Returns whether the file exists.
    /// `local` is only replaced once the whole file was received; otherwise it is left untouched.
    fn optional_download_to_file(&self, path: &str, local: &Path) -> TransferResult<bool>;

    /// Write the file at `path` into the local file `local`
    fn download_to_file(&self, path: &str, local: &Path) -> TransferResult<()> {
        if self.optional_download_to_file(path, local)? {
            Ok(())
        } else {
            Err(self.missing_remote_file(path))
        }
    }

    /// Download several files over a single session.
    ///
    /// Returns, for every requested path, whether it was downloaded. A file which is missing or
    /// fails to transfer doesn't stop the batch.
    fn download_all(
        &self,
        targets: BTreeMap<String, &mut dyn Write>,
    ) -> TransferResult<BTreeMap<String, bool>>;

    /// Write `source` to the remote file `dest`, replacing it. Returns the remote path.
    fn upload(&self, source: &mut dyn Read, dest: &str) -> TransferResult<String>;

    /// Write the local file `local` to the remote file `dest`, replacing it. Returns the remote path.
    fn upload_file(&self, local: &Path, dest: &str) -> TransferResult<String>;

    /// Delete the file at `path`
    fn delete(&self, path: &str) -> TransferResult<()>;

    /// The error reporting that `path` doesn't exist on the remote host
    fn missing_remote_file(&self, path: &str) -> TransferError {
        TransferError::missing_remote_file(path, self.location_label(path))
    }
}

/// Combine the outcome of an operation with the outcome of closing its session.
/// The error of the operation wins over the one of the disconnection, which is then only logged.
pub(crate) fn settle<T>(
    outcome: TransferResult<T>,
    disconnected: TransferResult<()>,
) -> TransferResult<T> {
    match (outcome, disconnected) {
        (Ok(value), Ok(())) => Ok(value),
        (Ok(_), Err(err)) => Err(err),
        (Err(err), Ok(())) => Err(err),
        (Err(err), Err(disconnect_err)) => {
            warn!("{disconnect_err}");
            Err(err)
        }
    }
}
