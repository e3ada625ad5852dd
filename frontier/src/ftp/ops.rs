//! # Ops
//!
//! The file transfer operations, run over an open [`FtpConnector`]

use std::collections::BTreeMap;
use std::io::{Read, Write};
use std::path::Path;
use std::str::FromStr;

use lazy_regex::{Lazy, Regex};
use suppaftp::list::File;
use suppaftp::{FtpError, FtpResult};

use super::connector::FtpConnector;
use super::reply::{self, Outcome};
use super::session::FtpSession;
use crate::file_info::FileInfo;
use crate::local;
use crate::types::{TransferError, TransferResult};

/// Summary line some servers put before the entries of `LIST`
static TOTAL_LINE_RE: Lazy<Regex> = lazy_regex!(r"^total\s+\d+\s*$");

/// Whether there is a directory at `path`; fails if `path` is a file
pub fn dir_exists<S: FtpSession>(conn: &mut FtpConnector<S>, path: &str) -> TransferResult<bool> {
    let location = conn.location_label(path);
    debug!("Checking if directory {location} exists");
    let session = conn.session_mut()?;
    let found = check_dir(session, path, &location)?;
    if !found && check_file(session, path, &location)? {
        return Err(TransferError::transfer(format!(
            "{location} exists, but is not a directory."
        )));
    }
    debug!("Directory {location} exists: {found}");
    Ok(found)
}

/// Whether there is a file at `path`; fails if `path` is a directory
pub fn file_exists<S: FtpSession>(conn: &mut FtpConnector<S>, path: &str) -> TransferResult<bool> {
    let location = conn.location_label(path);
    debug!("Checking if file {location} exists");
    let session = conn.session_mut()?;
    if check_dir(session, path, &location)? {
        return Err(TransferError::transfer(format!(
            "{location} exists, but is a directory."
        )));
    }
    let found = check_file(session, path, &location)?;
    debug!("File {location} exists: {found}");
    Ok(found)
}

/// Open the data stream reading the file at `path`.
/// The stream must be given back to [`finish_stream`].
pub fn optional_stream<S: FtpSession>(
    conn: &mut FtpConnector<S>,
    path: &str,
) -> TransferResult<Option<Box<dyn Read>>> {
    let location = conn.location_label(path);
    debug!("Opening stream to {location}");
    match conn.session_mut()?.retr_as_stream(path) {
        Ok(stream) => Ok(Some(stream)),
        Err(err) if reply::is_not_found(&err) => {
            debug!("File {location} not found");
            Ok(None)
        }
        Err(err) => Err(retrieve_error(&location, err)),
    }
}

/// Close a data stream opened by [`optional_stream`] and check the transfer completed
pub fn finish_stream<S: FtpSession>(
    conn: &mut FtpConnector<S>,
    stream: Box<dyn Read>,
) -> TransferResult<()> {
    let host_label = conn.host_label();
    conn.session_mut()?
        .finalize_retr_stream(stream)
        .map_err(|err| {
            TransferError::transfer_caused_by(
                format!(
                    "Failed to complete file transfer from {host_label}: {}.",
                    reply::reply_text(&err)
                ),
                err,
            )
        })
}

/// Read the whole file at `path`
pub fn optional_slurp<S: FtpSession>(
    conn: &mut FtpConnector<S>,
    path: &str,
) -> TransferResult<Option<Vec<u8>>> {
    let location = conn.location_label(path);
    let Some(mut stream) = optional_stream(conn, path)? else {
        return Ok(None);
    };
    let mut content = Vec::new();
    stream.read_to_end(&mut content).map_err(|err| {
        TransferError::transfer_caused_by(format!("I/O error reading {location}."), err)
    })?;
    finish_stream(conn, stream)?;
    trace!("Read {} bytes from {location}", content.len());
    Ok(Some(content))
}

/// List the entries of the directory at `path`
pub fn list<S: FtpSession>(conn: &mut FtpConnector<S>, path: &str) -> TransferResult<Vec<FileInfo>> {
    let location = conn.location_label(path);
    debug!("Listing files in {location}");
    if !dir_exists(conn, path)? {
        return Err(TransferError::transfer(format!(
            "Directory {location} does not exist."
        )));
    }
    let lines = conn.session_mut()?.list(path).map_err(|err| {
        TransferError::transfer_caused_by(
            format!(
                "Failed to list files in {location}: {}.",
                reply::reply_text(&err)
            ),
            err,
        )
    })?;
    let mut files = Vec::with_capacity(lines.len());
    for line in lines.iter().filter(|line| !is_summary(line)) {
        let file = File::from_str(line).map_err(|err| {
            TransferError::transfer_caused_by(
                format!("Failed to parse entry {line:?} listing {location}."),
                err,
            )
        })?;
        if matches!(file.name(), "." | "..") {
            continue;
        }
        files.push(FileInfo::from_ftp_entry(&file));
    }
    debug!("Found {} entries in {location}", files.len());
    Ok(files)
}

/// Write the file at `path` into `sink`. Returns whether the file exists.
pub fn optional_download<S: FtpSession>(
    conn: &mut FtpConnector<S>,
    path: &str,
    sink: &mut dyn Write,
) -> TransferResult<bool> {
    let location = conn.location_label(path);
    debug!("Downloading {location}");
    retrieve(conn.session_mut()?, path, sink, &location)
        .map_err(|err| retrieve_error(&location, err))
}

/// Write the file at `path` into the local file `local`. Returns whether the file exists.
pub fn optional_download_to_file<S: FtpSession>(
    conn: &mut FtpConnector<S>,
    path: &str,
    local: &Path,
) -> TransferResult<bool> {
    let location = conn.location_label(path);
    local::download_to_file(local, &location, |sink| optional_download(conn, path, sink))
}

/// Download every target over the same session.
///
/// A missing file or a failed transfer marks its path as not downloaded. Once the session is lost
/// the remaining paths are marked as not downloaded without being tried.
pub fn download_all<S: FtpSession>(
    conn: &mut FtpConnector<S>,
    targets: BTreeMap<String, &mut dyn Write>,
) -> TransferResult<BTreeMap<String, bool>> {
    debug!("Downloading {} files from {}", targets.len(), conn.host_label());
    let mut downloaded = BTreeMap::new();
    let mut session_lost = false;
    for (path, sink) in targets {
        let location = conn.location_label(&path);
        if session_lost {
            warn!("Skipping {location}; the session is lost");
            downloaded.insert(path, false);
            continue;
        }
        let found = match retrieve(conn.session_mut()?, &path, sink, &location) {
            Ok(found) => found,
            Err(err) => {
                session_lost = reply::is_session_lost(&err);
                warn!("{}", retrieve_error(&location, err));
                false
            }
        };
        downloaded.insert(path, found);
    }
    Ok(downloaded)
}

/// Write `source` to `dest`, replacing it
pub fn upload<S: FtpSession>(
    conn: &mut FtpConnector<S>,
    source: &mut dyn Read,
    dest: &str,
) -> TransferResult<String> {
    let location = conn.location_label(dest);
    debug!("Uploading to {location}");
    let bytes = conn.session_mut()?.put_file(dest, source).map_err(|err| {
        TransferError::transfer_caused_by(
            format!("Unexpected reply: {}.", reply::reply_text(&err)),
            err,
        )
    })?;
    debug!("Uploaded {bytes} bytes to {location}");
    Ok(dest.to_string())
}

/// Write the local file `local` to `dest`, replacing it
pub fn upload_file<S: FtpSession>(
    conn: &mut FtpConnector<S>,
    local: &Path,
    dest: &str,
) -> TransferResult<String> {
    let mut source = local::open_source(local)?;
    upload(conn, &mut source, dest)
}

/// Delete the file at `path`
pub fn delete<S: FtpSession>(conn: &mut FtpConnector<S>, path: &str) -> TransferResult<()> {
    let location = conn.location_label(path);
    debug!("Deleting {location}");
    if !file_exists(conn, path)? {
        return Err(TransferError::missing_remote_file(path, location));
    }
    conn.session_mut()?.rm(path).map_err(|err| {
        TransferError::transfer_caused_by(
            format!("Failed to delete {location}: {}.", reply::reply_text(&err)),
            err,
        )
    })
}

/// `CWD` into `path` and back to the current directory. Returns whether `path` is a directory.
fn check_dir<S: FtpSession>(session: &mut S, path: &str, location: &str) -> TransferResult<bool> {
    let workdir = session.pwd().map_err(|err| {
        TransferError::transfer_caused_by(
            format!(
                "Failed to get working directory while checking for existence of {location}: {}.",
                reply::reply_text(&err)
            ),
            err,
        )
    })?;
    let entered = session.cwd(path);
    let restore = session.cwd(&workdir);
    let found = match entered {
        Ok(()) => Ok(true),
        Err(err) if reply::is_not_found(&err) => Ok(false),
        Err(err) => Err(TransferError::transfer_caused_by(
            format!(
                "Unexpected reply from changing working directory while checking for existence of {location}: {}.",
                reply::reply_text(&err)
            ),
            err,
        )),
    };
    match restore {
        Ok(()) => found,
        Err(err) => {
            let restore_err = TransferError::transfer_caused_by(
                format!(
                    "Unexpected reply from changing working directory back to {workdir} while checking for existence of {location}: {}.",
                    reply::reply_text(&err)
                ),
                err,
            );
            match found {
                Ok(_) => Err(restore_err),
                Err(cwd_err) => {
                    warn!("{restore_err}");
                    Err(cwd_err)
                }
            }
        }
    }
}

/// `SIZE` of `path`. Returns whether `path` is a file.
fn check_file<S: FtpSession>(session: &mut S, path: &str, location: &str) -> TransferResult<bool> {
    match session.size(path) {
        Ok(size) => {
            trace!("{location} is a file of {size} bytes");
            Ok(true)
        }
        Err(err) if reply::is_not_found(&err) => Ok(false),
        Err(err) => Err(TransferError::transfer_caused_by(
            format!(
                "Unexpected reply while checking for existence of {location}: {}.",
                reply::reply_text(&err)
            ),
            err,
        )),
    }
}

/// `RETR` of `path` into `sink`; a missing file is reported as `false`
fn retrieve<S: FtpSession>(
    session: &mut S,
    path: &str,
    sink: &mut dyn Write,
    location: &str,
) -> FtpResult<bool> {
    match session.retr(path, sink) {
        Ok(bytes) => {
            debug!("Downloaded {bytes} bytes from {location}");
            Ok(true)
        }
        Err(err) if reply::is_not_found(&err) => {
            debug!("File {location} not found");
            Ok(false)
        }
        Err(err) => Err(err),
    }
}

fn retrieve_error(location: &str, err: FtpError) -> TransferError {
    let message = match reply::classify(&err) {
        Outcome::SessionLost => format!("I/O error retrieving {location}."),
        _ => format!("Unexpected reply: {}.", reply::reply_text(&err)),
    };
    TransferError::transfer_caused_by(message, err)
}

fn is_summary(line: &str) -> bool {
    line.trim().is_empty() || TOTAL_LINE_RE.is_match(line)
}
