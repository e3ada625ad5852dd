//! # Session
//!
//! The FTP primitives the operation module is built on

use std::io::{self, Read, Write};
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::time::Duration;

use suppaftp::types::FileType;
use suppaftp::{FtpError, FtpResult, FtpStream};

use crate::config::FtpConfig;

/// A function that opens the control connection of a new FTP session.
///
/// It takes the [`FtpConfig`] of the client and returns a session which is connected,
/// but not logged in yet.
pub type FtpSessionBuilder<S> = dyn Fn(&FtpConfig) -> FtpResult<S> + Send + Sync;

/// A FTP session. Every method maps onto one FTP command (or command plus data transfer),
/// and reports the server refusal as [`FtpError::UnexpectedResponse`] carrying the reply.
pub trait FtpSession {
    /// Log in to the FTP server (`USER`/`PASS`)
    fn login(&mut self, user: &str, password: &str) -> FtpResult<()>;

    /// Set the type of file to be transferred (`TYPE`)
    fn transfer_type(&mut self, file_type: FileType) -> FtpResult<()>;

    /// Get the current directory (`PWD`)
    fn pwd(&mut self) -> FtpResult<String>;

    /// Change the current directory (`CWD`)
    fn cwd(&mut self, path: &str) -> FtpResult<()>;

    /// Get the size of a file (`SIZE`)
    fn size(&mut self, path: &str) -> FtpResult<usize>;

    /// Open the data stream to read a file (`RETR`).
    /// The stream must be given back to [`FtpSession::finalize_retr_stream`] once read.
    fn retr_as_stream(&mut self, path: &str) -> FtpResult<Box<dyn Read>>;

    /// Close a stream opened by [`FtpSession::retr_as_stream`] and read the transfer outcome
    fn finalize_retr_stream(&mut self, stream: Box<dyn Read>) -> FtpResult<()>;

    /// Retrieve a file into `sink` (`RETR`). Returns the amount of bytes written.
    fn retr(&mut self, path: &str, sink: &mut dyn Write) -> FtpResult<u64>;

    /// Store `source` at `path` (`STOR`). Returns the amount of bytes written.
    fn put_file(&mut self, path: &str, source: &mut dyn Read) -> FtpResult<u64>;

    /// List the directory content (`LIST`), one line per entry
    fn list(&mut self, path: &str) -> FtpResult<Vec<String>>;

    /// Remove a file (`DELE`)
    fn rm(&mut self, path: &str) -> FtpResult<()>;

    /// Log out (`QUIT`). The transport is closed once the session is dropped.
    fn quit(&mut self) -> FtpResult<()>;
}

impl FtpSession for FtpStream {
    fn login(&mut self, user: &str, password: &str) -> FtpResult<()> {
        FtpStream::login(self, user, password)
    }

    fn transfer_type(&mut self, file_type: FileType) -> FtpResult<()> {
        FtpStream::transfer_type(self, file_type)
    }

    fn pwd(&mut self) -> FtpResult<String> {
        FtpStream::pwd(self)
    }

    fn cwd(&mut self, path: &str) -> FtpResult<()> {
        FtpStream::cwd(self, path)
    }

    fn size(&mut self, path: &str) -> FtpResult<usize> {
        FtpStream::size(self, path)
    }

    fn retr_as_stream(&mut self, path: &str) -> FtpResult<Box<dyn Read>> {
        FtpStream::retr_as_stream(self, path).map(|stream| Box::new(stream) as Box<dyn Read>)
    }

    fn finalize_retr_stream(&mut self, stream: Box<dyn Read>) -> FtpResult<()> {
        FtpStream::finalize_retr_stream(self, stream)
    }

    fn retr(&mut self, path: &str, sink: &mut dyn Write) -> FtpResult<u64> {
        FtpStream::retr(self, path, |reader| {
            io::copy(reader, &mut *sink).map_err(FtpError::ConnectionError)
        })
    }

    fn put_file(&mut self, path: &str, mut source: &mut dyn Read) -> FtpResult<u64> {
        FtpStream::put_file(self, path, &mut source)
    }

    fn list(&mut self, path: &str) -> FtpResult<Vec<String>> {
        FtpStream::list(self, Some(path))
    }

    fn rm(&mut self, path: &str) -> FtpResult<()> {
        FtpStream::rm(self, path)
    }

    fn quit(&mut self) -> FtpResult<()> {
        FtpStream::quit(self)
    }
}

/// Open the control connection to the configured host.
/// The connect and read timeouts apply to the control connection and to every passive data
/// connection.
pub fn connect_stream(config: &FtpConfig) -> FtpResult<FtpStream> {
    let addr = resolve(config)?;
    debug!("Connecting to {addr}");
    let stream = FtpStream::connect_timeout(addr, config.connect_timeout)?;
    if let Some(timeout) = config.read_timeout {
        stream
            .get_ref()
            .set_read_timeout(Some(timeout))
            .map_err(FtpError::ConnectionError)?;
    }
    Ok(stream.passive_stream_builder(data_stream_builder(
        config.connect_timeout,
        config.read_timeout,
    )))
}

/// Opens passive data connections with the given timeouts
fn data_stream_builder(
    connect_timeout: Duration,
    read_timeout: Option<Duration>,
) -> impl Fn(SocketAddr) -> FtpResult<TcpStream> + Send + Sync + 'static {
    move |addr| {
        trace!("Opening data connection to {addr}");
        let stream =
            TcpStream::connect_timeout(&addr, connect_timeout).map_err(FtpError::ConnectionError)?;
        stream
            .set_read_timeout(read_timeout)
            .map_err(FtpError::ConnectionError)?;
        Ok(stream)
    }
}

fn resolve(config: &FtpConfig) -> FtpResult<SocketAddr> {
    format!("{}:{}", config.host, config.port)
        .to_socket_addrs()
        .map_err(FtpError::ConnectionError)?
        .next()
        .ok_or_else(|| {
            FtpError::ConnectionError(io::Error::new(
                io::ErrorKind::NotFound,
                format!("could not resolve {}", config.host),
            ))
        })
}
