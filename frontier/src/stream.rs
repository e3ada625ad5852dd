//! # Stream
//!
//! A readable remote file which keeps the connection it was opened on alive until it's closed

use std::fmt;
use std::io::{self, Read};

use crate::types::TransferResult;

/// Owner of the session a [`RemoteStream`] reads from.
/// Releasing it finalizes the transfer and closes the session.
pub(crate) trait StreamOwner {
    fn release(&mut self, reader: Box<dyn Read>) -> TransferResult<()>;
}

/// A stream reading a remote file.
///
/// The stream owns the connection it was opened on: the connection is closed once the stream is
/// closed with [`RemoteStream::close`], which reports errors, or dropped, which only logs them.
pub struct RemoteStream {
    location: String,
    reader: Option<Box<dyn Read>>,
    owner: Box<dyn StreamOwner>,
}

impl RemoteStream {
    pub(crate) fn new(
        location: String,
        reader: Box<dyn Read>,
        owner: impl StreamOwner + 'static,
    ) -> Self {
        Self {
            location,
            reader: Some(reader),
            owner: Box::new(owner),
        }
    }

    /// Returns the label of the remote file, e.g. `localhost:2121:test/foo.txt`
    pub fn location(&self) -> &str {
        self.location.as_str()
    }

    /// Finalize the transfer and close the connection the stream was opened on
    pub fn close(mut self) -> TransferResult<()> {
        self.release()
    }

    fn release(&mut self) -> TransferResult<()> {
        match self.reader.take() {
            Some(reader) => {
                debug!("Closing stream {}", self.location);
                self.owner.release(reader)
            }
            None => Ok(()),
        }
    }
}

impl Read for RemoteStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.reader.as_mut() {
            Some(reader) => reader.read(buf),
            None => Ok(0),
        }
    }
}

impl Drop for RemoteStream {
    fn drop(&mut self) {
        if let Err(err) = self.release() {
            warn!("Failed to close stream {}: {err}", self.location);
        }
    }
}

impl fmt::Debug for RemoteStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteStream")
            .field("location", &self.location)
            .field("open", &self.reader.is_some())
            .finish()
    }
}
