//! # Config
//!
//! Connection settings for FTP and SFTP clients, and the parser for `ftp://` and `sftp://` endpoints.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use lazy_regex::{Lazy, Regex};
use thiserror::Error;

use crate::types::host_label;

/// Default FTP control port
pub const DEFAULT_FTP_PORT: u16 = 21;
/// Default SSH port
pub const DEFAULT_SFTP_PORT: u16 = 22;
/// Default timeout to establish a connection
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(30);
/// Default interval between SSH keep-alive messages
pub const DEFAULT_KEEP_ALIVE_INTERVAL: Duration = Duration::from_secs(10);
/// Default amount of unanswered keep-alive intervals before the session is considered dead
pub const DEFAULT_KEEP_ALIVE_COUNT_MAX: u32 = 6;

/// Endpoint regex: `<protocol>://[user@]host[:port][/]`
static ENDPOINT_RE: Lazy<Regex> =
    lazy_regex!(r#"^(?i)(ftp|sftp)://(?:([^@/:\s]+)@)?([^@/:\s]+|\[[0-9a-fA-F:]+\])(?::(\d+))?/?$"#);

// -- FTP

/// Settings used by [`crate::FtpClient`] to open a session
#[derive(Clone)]
pub struct FtpConfig {
    pub(crate) host: String,
    pub(crate) port: u16,
    pub(crate) username: String,
    pub(crate) password: String,
    pub(crate) connect_timeout: Duration,
    pub(crate) read_timeout: Option<Duration>,
}

impl FtpConfig {
    /// Instantiates a new `FtpConfig` for `host`, on port 21
    pub fn new(
        host: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            port: DEFAULT_FTP_PORT,
            username: username.into(),
            password: password.into(),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            read_timeout: None,
        }
    }

    /// Set the control port
    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set the timeout to establish the control connection
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set a read timeout on the control connection and on the passive data connections
    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = Some(timeout);
        self
    }

    pub fn get_host(&self) -> &str {
        self.host.as_str()
    }

    pub fn get_port(&self) -> u16 {
        self.port
    }

    pub fn get_username(&self) -> &str {
        self.username.as_str()
    }

    /// Label naming the remote host in messages
    pub fn host_label(&self) -> String {
        host_label(&self.host, self.port, DEFAULT_FTP_PORT)
    }
}

impl fmt::Debug for FtpConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FtpConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("connect_timeout", &self.connect_timeout)
            .field("read_timeout", &self.read_timeout)
            .finish_non_exhaustive()
    }
}

// -- SFTP

/// How the server host key is verified against the known hosts file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HostKeyPolicy {
    /// Refuse hosts whose key is unknown or doesn't match
    #[default]
    Strict,
    /// Log a warning and proceed when the key is unknown or doesn't match
    Lenient,
}

/// Settings used by [`crate::SftpClient`] to open a session.
///
/// Authentication is attempted with the private key first (if any), then with the password (if any).
#[derive(Clone)]
pub struct SftpConfig {
    pub(crate) host: String,
    pub(crate) port: u16,
    pub(crate) username: String,
    pub(crate) password: Option<String>,
    pub(crate) private_key: Option<PathBuf>,
    pub(crate) public_key: Option<PathBuf>,
    pub(crate) passphrase: Option<String>,
    pub(crate) known_hosts: Option<PathBuf>,
    pub(crate) host_key_policy: HostKeyPolicy,
    pub(crate) connect_timeout: Duration,
    pub(crate) keep_alive_interval: Duration,
    pub(crate) keep_alive_count_max: u32,
}

impl SftpConfig {
    /// Instantiates a new `SftpConfig` for `host`, on port 22, without credentials
    pub fn new(host: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: DEFAULT_SFTP_PORT,
            username: username.into(),
            password: None,
            private_key: None,
            public_key: None,
            passphrase: None,
            known_hosts: None,
            host_key_policy: HostKeyPolicy::default(),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            keep_alive_interval: DEFAULT_KEEP_ALIVE_INTERVAL,
            keep_alive_count_max: DEFAULT_KEEP_ALIVE_COUNT_MAX,
        }
    }

    /// Password authentication
    pub fn with_password(
        host: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self::new(host, username).password(password)
    }

    /// Public key authentication with an unencrypted private key
    pub fn with_key(
        host: impl Into<String>,
        username: impl Into<String>,
        private_key: impl AsRef<Path>,
    ) -> Self {
        Self::new(host, username).private_key(private_key)
    }

    /// Public key authentication with a passphrase protected private key
    pub fn with_passphrase(
        host: impl Into<String>,
        username: impl Into<String>,
        private_key: impl AsRef<Path>,
        passphrase: impl Into<String>,
    ) -> Self {
        Self::new(host, username)
            .private_key(private_key)
            .passphrase(passphrase)
    }

    /// Set the SSH port
    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    pub fn private_key(mut self, path: impl AsRef<Path>) -> Self {
        self.private_key = Some(path.as_ref().to_path_buf());
        self
    }

    /// Set the public key matching the private key. If not set, libssh2 derives it from the private key.
    pub fn public_key(mut self, path: impl AsRef<Path>) -> Self {
        self.public_key = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn passphrase(mut self, passphrase: impl Into<String>) -> Self {
        self.passphrase = Some(passphrase.into());
        self
    }

    /// Set the known hosts file (OpenSSH format) used to verify the host key.
    /// Defaults to `~/.ssh/known_hosts`.
    pub fn known_hosts(mut self, path: impl AsRef<Path>) -> Self {
        self.known_hosts = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn host_key_policy(mut self, policy: HostKeyPolicy) -> Self {
        self.host_key_policy = policy;
        self
    }

    /// Shorthand for `host_key_policy(HostKeyPolicy::Lenient)`
    pub fn insecure(self) -> Self {
        self.host_key_policy(HostKeyPolicy::Lenient)
    }

    /// Set the timeout to establish the TCP connection and complete the SSH handshake
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set the keep-alive interval and how many unanswered intervals are tolerated
    pub fn keep_alive(mut self, interval: Duration, count_max: u32) -> Self {
        self.keep_alive_interval = interval;
        self.keep_alive_count_max = count_max;
        self
    }

    pub fn get_host(&self) -> &str {
        self.host.as_str()
    }

    pub fn get_port(&self) -> u16 {
        self.port
    }

    pub fn get_username(&self) -> &str {
        self.username.as_str()
    }

    pub fn get_host_key_policy(&self) -> HostKeyPolicy {
        self.host_key_policy
    }

    /// Label naming the remote host in messages
    pub fn host_label(&self) -> String {
        host_label(&self.host, self.port, DEFAULT_SFTP_PORT)
    }

    /// Known hosts file to check the host key against: the configured one or `~/.ssh/known_hosts`
    pub(crate) fn known_hosts_path(&self) -> Option<PathBuf> {
        self.known_hosts
            .clone()
            .or_else(|| dirs::home_dir().map(|home| home.join(".ssh").join("known_hosts")))
    }

    /// How long blocking calls may wait on an established session before it's considered dead
    pub(crate) fn session_timeout(&self) -> Duration {
        self.keep_alive_interval
            .saturating_mul(self.keep_alive_count_max.max(1))
    }
}

impl fmt::Debug for SftpConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SftpConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("private_key", &self.private_key)
            .field("public_key", &self.public_key)
            .field("known_hosts", &self.known_hosts)
            .field("host_key_policy", &self.host_key_policy)
            .field("connect_timeout", &self.connect_timeout)
            .field("keep_alive_interval", &self.keep_alive_interval)
            .field("keep_alive_count_max", &self.keep_alive_count_max)
            .finish_non_exhaustive()
    }
}

// -- endpoint

/// File transfer protocol
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protocol {
    Ftp,
    Sftp,
}

impl Protocol {
    /// Port used when the endpoint doesn't specify one
    pub fn default_port(&self) -> u16 {
        match self {
            Self::Ftp => DEFAULT_FTP_PORT,
            Self::Sftp => DEFAULT_SFTP_PORT,
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ftp => write!(f, "ftp"),
            Self::Sftp => write!(f, "sftp"),
        }
    }
}

#[derive(Debug, Error, Eq, PartialEq)]
pub enum EndpointError {
    #[error("Syntax error: expected <ftp|sftp>://[user@]host[:port]")]
    SyntaxError,
    #[error("Bad port")]
    BadPort,
}

/// A remote endpoint, as in `sftp://alice@example.org:2222`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    protocol: Protocol,
    username: Option<String>,
    host: String,
    port: u16,
}

impl Endpoint {
    pub fn protocol(&self) -> Protocol {
        self.protocol
    }

    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    pub fn host(&self) -> &str {
        self.host.as_str()
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Make a [`FtpConfig`] for this endpoint
    pub fn ftp_config(&self, username: impl Into<String>, password: impl Into<String>) -> FtpConfig {
        FtpConfig::new(self.host.as_str(), username, password).port(self.port)
    }

    /// Make a [`SftpConfig`] for this endpoint, without credentials
    pub fn sftp_config(&self, username: impl Into<String>) -> SftpConfig {
        SftpConfig::new(self.host.as_str(), username).port(self.port)
    }
}

impl FromStr for Endpoint {
    type Err = EndpointError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let caps = ENDPOINT_RE
            .captures(s.trim())
            .ok_or(EndpointError::SyntaxError)?;
        let protocol = match caps[1].to_ascii_lowercase().as_str() {
            "ftp" => Protocol::Ftp,
            "sftp" => Protocol::Sftp,
            _ => return Err(EndpointError::SyntaxError),
        };
        let port = match caps.get(4) {
            Some(port) => port
                .as_str()
                .parse::<u16>()
                .map_err(|_| EndpointError::BadPort)?,
            None => protocol.default_port(),
        };
        Ok(Self {
            protocol,
            username: caps.get(2).map(|user| user.as_str().to_string()),
            host: caps[3].to_string(),
            port,
        })
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://", self.protocol)?;
        if let Some(username) = self.username.as_deref() {
            write!(f, "{username}@")?;
        }
        write!(f, "{}:{}", self.host, self.port)
    }
}
