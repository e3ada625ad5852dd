//! # Local
//!
//! Local files used as sources and sinks of transfers

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use crate::types::{TransferError, TransferResult};

/// Fail with [`TransferError::MissingLocalFile`] if `path` doesn't exist
pub(crate) fn ensure_exists(path: &Path) -> TransferResult<()> {
    if path.exists() {
        Ok(())
    } else {
        Err(TransferError::missing_local_file(path))
    }
}

/// Open the local file to upload
pub(crate) fn open_source(path: &Path) -> TransferResult<File> {
    ensure_exists(path)?;
    File::open(path).map_err(|err| {
        TransferError::transfer_caused_by(
            format!("Failed to read local source file {}.", path.display()),
            err,
        )
    })
}

/// Run `download` into a temporary file next to `path`, which replaces `path` once the remote
/// file was fully received.
///
/// The temporary file is closed and removed if the remote file wasn't found or the transfer
/// failed, so an existing file at `path` is left untouched.
pub(crate) fn download_to_file<F>(path: &Path, location: &str, download: F) -> TransferResult<bool>
where
    F: FnOnce(&mut dyn Write) -> TransferResult<bool>,
{
    debug!("Downloading file {location} locally to {}.", path.display());
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    let file = tempfile::Builder::new()
        .prefix(".frontier-")
        .tempfile_in(dir)
        .map_err(|err| {
            TransferError::transfer_caused_by(
                format!(
                    "Failed to create local file {} when trying to download {location}.",
                    path.display()
                ),
                err,
            )
        })?;
    let mut sink = BufWriter::new(file);
    if !download(&mut sink)? {
        trace!("{location} was not found; leaving {} untouched", path.display());
        return Ok(false);
    }
    let write_error = |err: io::Error| {
        TransferError::transfer_caused_by(
            format!(
                "Failed to write local file {} when trying to download {location}.",
                path.display()
            ),
            err,
        )
    };
    let file = sink
        .into_inner()
        .map_err(|err| write_error(err.into_error()))?;
    file.persist(path).map_err(|err| write_error(err.error))?;
    trace!("Downloaded {location} to {}", path.display());
    Ok(true)
}
