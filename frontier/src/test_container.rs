#![allow(dead_code)]

use std::borrow::Cow;
use std::net::TcpStream;
use std::sync::Arc;

use rand::distr::Alphanumeric;
use rand::{rng, Rng};
use suppaftp::{FtpError, FtpStream};
use testcontainers::core::WaitFor;
use testcontainers::{Container, Image};

use crate::config::FtpConfig;
use crate::ftp::{self, FtpClient};

pub const USERNAME: &str = "test";
pub const PASSWORD: &str = "test";

#[derive(Debug, Default, Clone)]
struct PureFtpImage {
    _priv: (),
}

impl Image for PureFtpImage {
    fn name(&self) -> &str {
        "stilliard/pure-ftpd"
    }

    fn tag(&self) -> &str {
        "latest"
    }

    fn ready_conditions(&self) -> Vec<WaitFor> {
        vec![WaitFor::message_on_stdout("Starting Pure-FTPd")]
    }

    fn env_vars(
        &self,
    ) -> impl IntoIterator<Item = (impl Into<Cow<'_, str>>, impl Into<Cow<'_, str>>)> {
        vec![
            ("PUBLICHOST", "localhost"),
            ("FTP_USER_NAME", USERNAME),
            ("FTP_USER_PASS", PASSWORD),
            ("FTP_USER_HOME", "/home/test"),
        ]
    }
}

pub struct SyncPureFtpRunner {
    container: Container<PureFtpImage>,
}

impl SyncPureFtpRunner {
    pub fn start() -> Arc<Self> {
        use testcontainers::runners::SyncRunner;
        let container = PureFtpImage::default()
            .start()
            .expect("Failed to start container");
        Arc::new(Self { container })
    }

    pub fn get_ftp_port(&self) -> u16 {
        self.container.get_host_port_ipv4(21).unwrap()
    }

    pub fn get_mapped_port(&self, port: u16) -> u16 {
        self.container.get_host_port_ipv4(port).unwrap()
    }

    /// A client whose data connections go through the ports mapped by the container
    pub fn client(self: &Arc<Self>) -> FtpClient {
        let config = FtpConfig::new("127.0.0.1", USERNAME, PASSWORD).port(self.get_ftp_port());
        let runner = self.clone();
        FtpClient::with_session_builder(config, move |config: &FtpConfig| {
            let runner = runner.clone();
            let stream = ftp::connect_stream(config)?;
            Ok(stream.passive_stream_builder(move |mut addr| {
                let port = addr.port();
                let mapped = runner.get_mapped_port(port);
                addr.set_port(mapped);
                info!("mapped port {port} to {mapped} for PASV");
                TcpStream::connect(addr).map_err(FtpError::ConnectionError)
            }))
        })
    }

    /// Create `dir` in the home of the test user
    pub fn mkdir(&self, dir: &str) {
        let mut stream = FtpStream::connect(("127.0.0.1", self.get_ftp_port())).unwrap();
        stream.login(USERNAME, PASSWORD).unwrap();
        stream.mkdir(dir).unwrap();
        stream.quit().unwrap();
    }
}

#[derive(Debug, Default, Clone)]
struct SftpImage {
    _priv: (),
}

impl Image for SftpImage {
    fn name(&self) -> &str {
        "atmoz/sftp"
    }

    fn tag(&self) -> &str {
        "latest"
    }

    fn ready_conditions(&self) -> Vec<WaitFor> {
        vec![WaitFor::message_on_stderr("Server listening on")]
    }

    fn cmd(&self) -> impl IntoIterator<Item = impl Into<Cow<'_, str>>> {
        vec!["test:test:::upload"]
    }
}

pub struct SyncSftpRunner {
    container: Container<SftpImage>,
}

impl SyncSftpRunner {
    pub fn start() -> Self {
        use testcontainers::runners::SyncRunner;
        let container = SftpImage::default()
            .start()
            .expect("Failed to start container");
        Self { container }
    }

    pub fn get_ssh_port(&self) -> u16 {
        self.container.get_host_port_ipv4(22).unwrap()
    }
}

pub fn generate_tempdir_name() -> String {
    let mut rng = rng();
    let name: String = std::iter::repeat(())
        .map(|()| rng.sample(Alphanumeric))
        .map(char::from)
        .take(5)
        .collect();
    format!("temp_{}", name)
}
