//! # File info
//!
//! Describes an entry of a remote directory, whatever the protocol which listed it.

use std::fmt;

use chrono::{DateTime, Utc};
use ssh2::FileStat;

/// Describes a file entry on the remote system.
/// This data type is returned in a collection by `list`.
///
/// Sizes and timestamps the server didn't report are `None`, never zero.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct FileInfo {
    /// File name
    name: String,
    /// File size in bytes
    size: Option<u64>,
    /// Last time the file was modified
    modified: Option<DateTime<Utc>>,
    /// Whether the entry is a directory
    is_directory: bool,
}

impl FileInfo {
    /// Instantiates a new `FileInfo`
    pub fn new(
        name: impl Into<String>,
        size: Option<u64>,
        modified: Option<DateTime<Utc>>,
        is_directory: bool,
    ) -> Self {
        Self {
            name: name.into(),
            size,
            modified,
            is_directory,
        }
    }

    /// Get file name
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Get file size in bytes, if known
    pub fn size(&self) -> Option<u64> {
        self.size
    }

    /// Get the last time the file was modified, if known
    pub fn modified(&self) -> Option<DateTime<Utc>> {
        self.modified
    }

    /// Get whether file is a directory
    pub fn is_directory(&self) -> bool {
        self.is_directory
    }

    /// Build from an entry of a FTP `LIST` output
    pub(crate) fn from_ftp_entry(file: &suppaftp::list::File) -> Self {
        Self::new(
            file.name(),
            Some(file.size() as u64),
            Some(DateTime::<Utc>::from(file.modified())),
            file.is_directory(),
        )
    }

    /// Build from an entry of a SFTP directory read. `mtime` is in POSIX seconds.
    pub(crate) fn from_sftp_entry(name: &str, stat: &FileStat) -> Self {
        Self::new(
            name,
            stat.size,
            stat.mtime
                .and_then(|secs| i64::try_from(secs).ok())
                .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0)),
            stat.is_dir(),
        )
    }
}

impl fmt::Display for FileInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}\t{:>10}\t{:<20}\t{}",
            if self.is_directory { "d" } else { "-" },
            self.size
                .map(|size| size.to_string())
                .unwrap_or_else(|| String::from("?")),
            self.modified
                .map(|time| time.format("%Y-%m-%d %H:%M:%S").to_string())
                .unwrap_or_else(|| String::from("?")),
            self.name
        )
    }
}
