//! # Ops
//!
//! The file transfer operations, run over an open [`SftpConnector`]

use std::collections::BTreeMap;
use std::io::{self, Read, Write};
use std::path::Path;

use ssh2::FileStat;

use super::connector::SftpConnector;
use super::session::SftpSession;
use super::status;
use crate::file_info::FileInfo;
use crate::local;
use crate::types::{TransferError, TransferResult};

/// Whether there is a directory at `path`; fails if `path` is a file
pub fn dir_exists<S: SftpSession>(conn: &mut SftpConnector<S>, path: &str) -> TransferResult<bool> {
    let location = conn.location_label(path);
    debug!("Checking if directory {location} exists");
    match stat(conn.session_mut()?, path, &location)? {
        Some(stat) if stat.is_dir() => Ok(true),
        Some(_) => Err(TransferError::transfer(format!(
            "{location} exists, but is not a directory."
        ))),
        None => Ok(false),
    }
}

/// Whether there is a file at `path`; fails if `path` is a directory
pub fn file_exists<S: SftpSession>(conn: &mut SftpConnector<S>, path: &str) -> TransferResult<bool> {
    let location = conn.location_label(path);
    debug!("Checking if file {location} exists");
    match stat(conn.session_mut()?, path, &location)? {
        Some(stat) if stat.is_dir() => Err(TransferError::transfer(format!(
            "{location} exists, but is a directory."
        ))),
        Some(_) => Ok(true),
        None => Ok(false),
    }
}

/// Open the file at `path` for reading
pub fn optional_stream<S: SftpSession>(
    conn: &mut SftpConnector<S>,
    path: &str,
) -> TransferResult<Option<Box<dyn Read>>> {
    let location = conn.location_label(path);
    debug!("Opening stream to {location}");
    match conn.session_mut()?.open(Path::new(path)) {
        Ok(file) => Ok(Some(file)),
        Err(err) if status::is_no_such_file(&err) => {
            debug!("File {location} not found");
            Ok(None)
        }
        Err(err) => Err(TransferError::transfer_caused_by(
            format!("Failed to retrieve file {location}."),
            err,
        )),
    }
}

/// Read the whole file at `path`
pub fn optional_slurp<S: SftpSession>(
    conn: &mut SftpConnector<S>,
    path: &str,
) -> TransferResult<Option<Vec<u8>>> {
    let location = conn.location_label(path);
    let Some(mut file) = optional_stream(conn, path)? else {
        return Ok(None);
    };
    let mut content = Vec::new();
    file.read_to_end(&mut content).map_err(|err| {
        TransferError::transfer_caused_by(format!("I/O error reading {location}."), err)
    })?;
    trace!("Read {} bytes from {location}", content.len());
    Ok(Some(content))
}

/// List the entries of the directory at `path`
pub fn list<S: SftpSession>(conn: &mut SftpConnector<S>, path: &str) -> TransferResult<Vec<FileInfo>> {
    let location = conn.location_label(path);
    debug!("Listing files in {location}");
    if !dir_exists(conn, path)? {
        return Err(TransferError::transfer(format!(
            "Directory {location} does not exist."
        )));
    }
    let entries = conn
        .session_mut()?
        .readdir(Path::new(path))
        .map_err(|err| {
            TransferError::transfer_caused_by(format!("Failed to list files in {location}."), err)
        })?;
    let files: Vec<FileInfo> = entries
        .iter()
        .filter_map(|(entry, stat)| {
            let name = entry.file_name()?.to_string_lossy();
            match &*name {
                "." | ".." => None,
                name => Some(FileInfo::from_sftp_entry(name, stat)),
            }
        })
        .collect();
    debug!("Found {} entries in {location}", files.len());
    Ok(files)
}

/// Write the file at `path` into `sink`. Returns whether the file exists.
pub fn optional_download<S: SftpSession>(
    conn: &mut SftpConnector<S>,
    path: &str,
    sink: &mut dyn Write,
) -> TransferResult<bool> {
    let location = conn.location_label(path);
    debug!("Downloading {location}");
    retrieve(conn.session_mut()?, path, sink, &location).map_err(|err| err.into_error(&location))
}

/// Write the file at `path` into the local file `local`. Returns whether the file exists.
pub fn optional_download_to_file<S: SftpSession>(
    conn: &mut SftpConnector<S>,
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
pub fn download_all<S: SftpSession>(
    conn: &mut SftpConnector<S>,
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
                session_lost = err.is_session_lost();
                warn!("{}", err.into_error(&location));
                false
            }
        };
        downloaded.insert(path, found);
    }
    Ok(downloaded)
}

/// Write `source` to `dest`, replacing it
pub fn upload<S: SftpSession>(
    conn: &mut SftpConnector<S>,
    source: &mut dyn Read,
    dest: &str,
) -> TransferResult<String> {
    let location = conn.location_label(dest);
    debug!("Uploading to {location}");
    let mut file = conn
        .session_mut()?
        .create(Path::new(dest))
        .map_err(|err| {
            if status::is_no_such_file(&err) {
                TransferError::transfer_caused_by(
                    format!("Directory for {location} does not exist."),
                    err,
                )
            } else {
                TransferError::transfer_caused_by(format!("Failed to access path {location}."), err)
            }
        })?;
    let bytes = io::copy(source, &mut file)
        .and_then(|bytes| file.flush().map(|_| bytes))
        .map_err(|err| {
            TransferError::transfer_caused_by(format!("I/O error uploading to {location}."), err)
        })?;
    file.close().map_err(|err| {
        TransferError::transfer_caused_by(format!("Failed to close {location}."), err)
    })?;
    debug!("Uploaded {bytes} bytes to {location}");
    Ok(dest.to_string())
}

/// Write the local file `local` to `dest`, replacing it
pub fn upload_file<S: SftpSession>(
    conn: &mut SftpConnector<S>,
    local: &Path,
    dest: &str,
) -> TransferResult<String> {
    let mut source = local::open_source(local)?;
    upload(conn, &mut source, dest)
}

/// Delete the file at `path`
pub fn delete<S: SftpSession>(conn: &mut SftpConnector<S>, path: &str) -> TransferResult<()> {
    let location = conn.location_label(path);
    debug!("Deleting {location}");
    if !file_exists(conn, path)? {
        return Err(TransferError::missing_remote_file(path, location));
    }
    conn.session_mut()?
        .unlink(Path::new(path))
        .map_err(|err| TransferError::transfer_caused_by(format!("Failed to delete {location}."), err))
}

fn stat<S: SftpSession>(
    session: &mut S,
    path: &str,
    location: &str,
) -> TransferResult<Option<FileStat>> {
    match session.lstat(Path::new(path)) {
        Ok(stat) => Ok(Some(stat)),
        Err(err) if status::is_no_such_file(&err) => Ok(None),
        Err(err) => Err(TransferError::transfer_caused_by(
            format!("Error asserting if {location} exists."),
            err,
        )),
    }
}

/// Why a file couldn't be retrieved
enum RetrieveError {
    Open(ssh2::Error),
    Copy(io::Error),
}

impl RetrieveError {
    fn is_session_lost(&self) -> bool {
        match self {
            Self::Open(err) => status::is_session_lost(err),
            Self::Copy(err) => status::is_io_session_lost(err),
        }
    }

    fn into_error(self, location: &str) -> TransferError {
        match self {
            Self::Open(err) => TransferError::transfer_caused_by(
                format!("Failed to retrieve file {location}."),
                err,
            ),
            Self::Copy(err) => TransferError::transfer_caused_by(
                format!("I/O error retrieving {location}."),
                err,
            ),
        }
    }
}

/// Copy `path` into `sink`; a missing file is reported as `false`
fn retrieve<S: SftpSession>(
    session: &mut S,
    path: &str,
    sink: &mut dyn Write,
    location: &str,
) -> Result<bool, RetrieveError> {
    let mut file = match session.open(Path::new(path)) {
        Ok(file) => file,
        Err(err) if status::is_no_such_file(&err) => {
            debug!("File {location} not found");
            return Ok(false);
        }
        Err(err) => return Err(RetrieveError::Open(err)),
    };
    let bytes = io::copy(&mut file, sink).map_err(RetrieveError::Copy)?;
    debug!("Downloaded {bytes} bytes from {location}");
    Ok(true)
}
