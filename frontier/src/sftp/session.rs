//! # Session
//!
//! The SFTP primitives the operation module is built on, and their libssh2 implementation

use std::io::{Read, Write};
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::path::{Path, PathBuf};
use std::time::Duration;

use ssh2::{CheckResult, FileStat, KnownHostFileKind, Session, Sftp};

use super::status;
use crate::config::{HostKeyPolicy, SftpConfig};
use crate::types::{TransferError, TransferResult};

/// A function that opens a new SFTP session, authenticated and ready for file operations
pub type SftpSessionBuilder<S> = dyn Fn(&SftpConfig) -> TransferResult<S> + Send + Sync;

/// A remote file open for writing
pub trait SftpWriter: Write {
    /// Close the handle; the server reports here whether the content was stored
    fn close(&mut self) -> Result<(), ssh2::Error>;
}

impl SftpWriter for ssh2::File {
    fn close(&mut self) -> Result<(), ssh2::Error> {
        ssh2::File::close(self)
    }
}

/// A SFTP session. Errors are the ones reported by libssh2; see [`super::status`].
pub trait SftpSession {
    /// Attributes of `path`, without following symbolic links
    fn lstat(&mut self, path: &Path) -> Result<FileStat, ssh2::Error>;

    /// Open `path` for reading
    fn open(&mut self, path: &Path) -> Result<Box<dyn Read>, ssh2::Error>;

    /// Open `path` for writing, creating or truncating it
    fn create(&mut self, path: &Path) -> Result<Box<dyn SftpWriter>, ssh2::Error>;

    /// Entries of the directory `path`, joined to `path`
    fn readdir(&mut self, path: &Path) -> Result<Vec<(PathBuf, FileStat)>, ssh2::Error>;

    /// Remove the file `path`
    fn unlink(&mut self, path: &Path) -> Result<(), ssh2::Error>;

    /// Close the SFTP channel and disconnect the SSH session
    fn disconnect(&mut self) -> Result<(), ssh2::Error>;
}

/// A SFTP session over libssh2
pub struct Ssh2Session {
    session: Session,
    sftp: Option<Sftp>,
}

impl Ssh2Session {
    /// Connect to the configured host, verify its key, authenticate and open the SFTP channel
    pub fn connect(config: &SftpConfig) -> TransferResult<Self> {
        let host_label = config.host_label();
        debug!("Connecting to {host_label} as {}", config.username);
        let addr = resolve(config)?;
        let tcp = TcpStream::connect_timeout(&addr, config.connect_timeout).map_err(|err| {
            TransferError::connection_caused_by(format!("Failed to connect to {host_label}."), err)
        })?;
        let mut session = Session::new().map_err(|err| {
            TransferError::connection_caused_by("Failed to create SSH session.", err)
        })?;
        session.set_timeout(millis(config.connect_timeout));
        session.set_tcp_stream(tcp);
        session.handshake().map_err(|err| {
            TransferError::connection_caused_by(
                format!("SSH handshake with {host_label} failed."),
                err,
            )
        })?;
        verify_host_key(&session, config)?;
        authenticate(&session, config)?;
        session.set_keepalive(true, keep_alive_secs(config.keep_alive_interval));
        session.set_timeout(millis(config.session_timeout()));
        let sftp = session.sftp().map_err(|err| {
            TransferError::connection_caused_by(
                format!("Failed to open SFTP channel on {host_label}."),
                err,
            )
        })?;
        debug!("Connected to {host_label}");
        Ok(Self {
            session,
            sftp: Some(sftp),
        })
    }

    /// The SFTP channel, once a keep-alive was sent if one is due
    fn sftp(&self) -> Result<&Sftp, ssh2::Error> {
        ready(self.sftp.as_ref(), || self.session.keepalive_send())
    }
}

impl SftpSession for Ssh2Session {
    fn lstat(&mut self, path: &Path) -> Result<FileStat, ssh2::Error> {
        self.sftp()?.lstat(path)
    }

    fn open(&mut self, path: &Path) -> Result<Box<dyn Read>, ssh2::Error> {
        self.sftp()?
            .open(path)
            .map(|file| Box::new(file) as Box<dyn Read>)
    }

    fn create(&mut self, path: &Path) -> Result<Box<dyn SftpWriter>, ssh2::Error> {
        self.sftp()?
            .create(path)
            .map(|file| Box::new(file) as Box<dyn SftpWriter>)
    }

    fn readdir(&mut self, path: &Path) -> Result<Vec<(PathBuf, FileStat)>, ssh2::Error> {
        self.sftp()?.readdir(path)
    }

    fn unlink(&mut self, path: &Path) -> Result<(), ssh2::Error> {
        self.sftp()?.unlink(path)
    }

    fn disconnect(&mut self) -> Result<(), ssh2::Error> {
        // the channel must be closed before the session
        drop(self.sftp.take());
        self.session.disconnect(None, "Closing session", None)
    }
}

fn resolve(config: &SftpConfig) -> TransferResult<SocketAddr> {
    let host_label = config.host_label();
    format!("{}:{}", config.host, config.port)
        .to_socket_addrs()
        .map_err(|err| {
            TransferError::connection_caused_by(format!("Failed to resolve {host_label}."), err)
        })?
        .next()
        .ok_or_else(|| TransferError::connection(format!("Failed to resolve {host_label}.")))
}

fn millis(duration: Duration) -> u32 {
    u32::try_from(duration.as_millis()).unwrap_or(u32::MAX)
}

/// libssh2 takes whole seconds; zero would disable keep-alives
fn keep_alive_secs(interval: Duration) -> u32 {
    u32::try_from(interval.as_secs()).unwrap_or(u32::MAX).max(1)
}

/// `channel`, once `keep_alive` succeeded. A closed channel is reported as a lost session.
fn ready<T>(
    channel: Option<T>,
    keep_alive: impl FnOnce() -> Result<u32, ssh2::Error>,
) -> Result<T, ssh2::Error> {
    let channel = channel.ok_or_else(status::disconnected)?;
    let next = keep_alive()?;
    trace!("Next keep-alive due in {next}s");
    Ok(channel)
}

/// Check the key presented by the host against the known hosts file
fn verify_host_key(session: &Session, config: &SftpConfig) -> TransferResult<()> {
    let host_label = config.host_label();
    let Some((key, _)) = session.host_key() else {
        return Err(TransferError::connection(format!(
            "{host_label} did not present a host key."
        )));
    };
    let Some(path) = config.known_hosts_path() else {
        return unverified(config, format!("No known hosts file to verify {host_label}."));
    };
    let mut known_hosts = session.known_hosts().map_err(|err| {
        TransferError::connection_caused_by("Failed to initialize known hosts.", err)
    })?;
    if let Err(err) = known_hosts.read_file(&path, KnownHostFileKind::OpenSSH) {
        return unverified(
            config,
            format!("Failed to read known hosts file {}: {err}.", path.display()),
        );
    }
    match known_hosts.check_port(&config.host, config.port, key) {
        CheckResult::Match => {
            trace!("Host key of {host_label} matches {}", path.display());
            Ok(())
        }
        CheckResult::NotFound => unverified(
            config,
            format!("Host key of {host_label} is not in {}.", path.display()),
        ),
        CheckResult::Mismatch => unverified(
            config,
            format!(
                "Host key of {host_label} does not match the one in {}.",
                path.display()
            ),
        ),
        CheckResult::Failure => Err(TransferError::connection(format!(
            "Failed to check the host key of {host_label}."
        ))),
    }
}

/// A host key which couldn't be verified is rejected, unless the policy is lenient
fn unverified(config: &SftpConfig, message: String) -> TransferResult<()> {
    match config.host_key_policy {
        HostKeyPolicy::Strict => Err(TransferError::connection(message)),
        HostKeyPolicy::Lenient => {
            warn!("{message} Proceeding anyway");
            Ok(())
        }
    }
}

/// Authenticate with the private key, then with the password
fn authenticate(session: &Session, config: &SftpConfig) -> TransferResult<()> {
    let host_label = config.host_label();
    let mut last_error = None;
    if let Some(private_key) = config.private_key.as_deref() {
        trace!("Authenticating with key {}", private_key.display());
        if let Err(err) = session.userauth_pubkey_file(
            &config.username,
            config.public_key.as_deref(),
            private_key,
            config.passphrase.as_deref(),
        ) {
            debug!("Key authentication on {host_label} failed: {err}");
            last_error = Some(err);
        }
    }
    if !session.authenticated() {
        if let Some(password) = config.password.as_deref() {
            trace!("Authenticating with password");
            if let Err(err) = session.userauth_password(&config.username, password) {
                debug!("Password authentication on {host_label} failed: {err}");
                last_error = Some(err);
            }
        }
    }
    if session.authenticated() {
        debug!("Authenticated on {host_label} as {}", config.username);
        return Ok(());
    }
    let message = format!("Authentication as {} on {host_label} failed.", config.username);
    Err(match last_error {
        Some(err) => TransferError::connection_caused_by(message, err),
        None => TransferError::connection(message),
    })
}
