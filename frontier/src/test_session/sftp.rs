//! # SFTP test session
//!
//! An in-memory SFTP server. Errors and broken sessions can be injected per operation.

use std::collections::HashMap;
use std::io::{self, Cursor, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use ssh2::{ErrorCode, FileStat};

use super::{parent, resolve, Node, Tree};
use crate::config::SftpConfig;
use crate::sftp::status::{SSH_FX_FAILURE, SSH_FX_NO_SUCH_FILE};
use crate::sftp::{SftpSession, SftpWriter};
use crate::types::{TransferError, TransferResult};

pub const USERNAME: &str = "bob";
pub const PASSWORD: &str = "password";
/// Modification time of every entry: 2018-11-05T00:00:00Z
pub const MTIME: u64 = 1_541_376_000;

const LIBSSH2_ERROR_SOCKET_RECV: i32 = -43;
const S_IFDIR: u32 = 0o040000;
const S_IFREG: u32 = 0o100000;

#[derive(Default)]
struct State {
    tree: Tree,
    refuse_connections: bool,
    fail_disconnect: bool,
    /// SFTP status codes to fail operations with, by `op` or `op path`
    faults: HashMap<String, i32>,
    /// Operations which break the session, by `op` or `op path`
    breaks: Vec<String>,
    connections: usize,
    open_sessions: usize,
    opens: usize,
}

/// An in-memory SFTP server; clones share the same state
#[derive(Clone, Default)]
pub struct MockSftpServer {
    state: Arc<Mutex<State>>,
}

impl MockSftpServer {
    pub fn add_dir(&self, path: &str) {
        self.lock().tree.mkdir(&resolve("/", path));
    }

    pub fn add_file(&self, path: &str, content: &[u8]) {
        self.lock().tree.write(&resolve("/", path), content.to_vec());
    }

    pub fn file(&self, path: &str) -> Option<Vec<u8>> {
        self.lock().tree.file(&resolve("/", path)).map(|c| c.to_vec())
    }

    pub fn refuse_connections(&self) {
        self.lock().refuse_connections = true;
    }

    pub fn fail_disconnect(&self) {
        self.lock().fail_disconnect = true;
    }

    /// Fail `op` with the SFTP status `code`. `op` is either `op` or `op path`.
    pub fn fail(&self, op: &str, code: i32) {
        self.lock().faults.insert(op.to_string(), code);
    }

    /// Break the session when `op` is run. `op` is either `op` or `op path`.
    /// `read path` breaks it while the content of `path` is being read.
    pub fn break_on(&self, op: &str) {
        self.lock().breaks.push(op.to_string());
    }

    pub fn connections(&self) -> usize {
        self.lock().connections
    }

    pub fn open_sessions(&self) -> usize {
        self.lock().open_sessions
    }

    /// How many times a file was opened for reading, including failed attempts
    pub fn opens(&self) -> usize {
        self.lock().opens
    }

    /// A session builder connecting to this server
    pub fn builder(
        &self,
    ) -> impl Fn(&SftpConfig) -> TransferResult<MockSftpSession> + Send + Sync + 'static {
        let server = self.clone();
        move |config: &SftpConfig| server.connect(config)
    }

    fn connect(&self, config: &SftpConfig) -> TransferResult<MockSftpSession> {
        let host_label = config.host_label();
        let mut state = self.lock();
        if state.refuse_connections {
            return Err(TransferError::connection(format!(
                "Failed to connect to {host_label}."
            )));
        }
        if config.username != USERNAME || config.password.as_deref() != Some(PASSWORD) {
            return Err(TransferError::connection(format!(
                "Authentication as {} on {host_label} failed.",
                config.username
            )));
        }
        state.connections += 1;
        state.open_sessions += 1;
        Ok(MockSftpSession {
            state: self.state.clone(),
            broken: false,
        })
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }
}

pub struct MockSftpSession {
    state: Arc<Mutex<State>>,
    broken: bool,
}

impl MockSftpSession {
    /// Fail with the injected outcome of `op`, if any. Returns the absolute path.
    fn check(&mut self, op: &str, path: &Path) -> Result<String, ssh2::Error> {
        if self.broken {
            return Err(broken());
        }
        let path = path.to_string_lossy();
        let state = self.state.lock().unwrap();
        let keys = [format!("{op} {path}"), op.to_string()];
        if keys.iter().any(|key| state.breaks.contains(key)) {
            self.broken = true;
            return Err(broken());
        }
        match keys.iter().find_map(|key| state.faults.get(key)) {
            Some(code) => Err(sftp_error(*code)),
            None => Ok(resolve("/", &path)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }
}

impl SftpSession for MockSftpSession {
    fn lstat(&mut self, path: &Path) -> Result<FileStat, ssh2::Error> {
        let path = self.check("lstat", path)?;
        self.lock()
            .tree
            .get(&path)
            .map(stat)
            .ok_or_else(|| sftp_error(SSH_FX_NO_SUCH_FILE))
    }

    fn open(&mut self, path: &Path) -> Result<Box<dyn Read>, ssh2::Error> {
        self.lock().opens += 1;
        let read_key = format!("read {}", path.to_string_lossy());
        let path = self.check("open", path)?;
        if self.lock().breaks.contains(&read_key) {
            self.broken = true;
            return Ok(Box::new(BrokenReader));
        }
        match self.lock().tree.get(&path) {
            Some(Node::File(content)) => Ok(Box::new(Cursor::new(content.clone()))),
            Some(Node::Dir) => Err(sftp_error(SSH_FX_FAILURE)),
            None => Err(sftp_error(SSH_FX_NO_SUCH_FILE)),
        }
    }

    fn create(&mut self, path: &Path) -> Result<Box<dyn SftpWriter>, ssh2::Error> {
        let close_key = format!("close {}", path.to_string_lossy());
        let path = self.check("create", path)?;
        let state = self.lock();
        if !state.tree.is_dir(&parent(&path)) {
            return Err(sftp_error(SSH_FX_NO_SUCH_FILE));
        }
        if state.tree.is_dir(&path) {
            return Err(sftp_error(SSH_FX_FAILURE));
        }
        Ok(Box::new(MockSftpFile {
            state: self.state.clone(),
            path,
            close_key,
            content: Vec::new(),
        }))
    }

    fn readdir(&mut self, path: &Path) -> Result<Vec<(PathBuf, FileStat)>, ssh2::Error> {
        let dir = self.check("readdir", path)?;
        let state = self.lock();
        match state.tree.get(&dir) {
            Some(Node::Dir) => Ok(state
                .tree
                .children(&dir)
                .iter()
                .map(|(name, node)| (path.join(name), stat(node)))
                .collect()),
            Some(Node::File(_)) => Err(sftp_error(SSH_FX_FAILURE)),
            None => Err(sftp_error(SSH_FX_NO_SUCH_FILE)),
        }
    }

    fn unlink(&mut self, path: &Path) -> Result<(), ssh2::Error> {
        let path = self.check("unlink", path)?;
        let mut state = self.lock();
        match state.tree.get(&path) {
            Some(Node::File(_)) => {
                state.tree.remove(&path);
                Ok(())
            }
            Some(Node::Dir) => Err(sftp_error(SSH_FX_FAILURE)),
            None => Err(sftp_error(SSH_FX_NO_SUCH_FILE)),
        }
    }

    fn disconnect(&mut self) -> Result<(), ssh2::Error> {
        if self.broken || self.lock().fail_disconnect {
            return Err(broken());
        }
        Ok(())
    }
}

impl Drop for MockSftpSession {
    fn drop(&mut self) {
        if let Ok(mut state) = self.state.lock() {
            state.open_sessions -= 1;
        }
    }
}

/// A remote file whose transport breaks on the first read
struct BrokenReader;

impl Read for BrokenReader {
    fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
        Err(io::Error::from(broken()))
    }
}

/// A remote file open for writing; the content is stored once closed.
/// `close path` injects a failure when closing.
struct MockSftpFile {
    state: Arc<Mutex<State>>,
    path: String,
    close_key: String,
    content: Vec<u8>,
}

impl Write for MockSftpFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.content.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl SftpWriter for MockSftpFile {
    fn close(&mut self) -> Result<(), ssh2::Error> {
        let mut state = self.state.lock().unwrap();
        if let Some(code) = state.faults.get(&self.close_key) {
            return Err(sftp_error(*code));
        }
        state.tree.write(&self.path, std::mem::take(&mut self.content));
        Ok(())
    }
}

fn stat(node: &Node) -> FileStat {
    let (size, perm) = match node {
        Node::Dir => (4096, S_IFDIR | 0o755),
        Node::File(content) => (content.len() as u64, S_IFREG | 0o644),
    };
    FileStat {
        size: Some(size),
        uid: Some(0),
        gid: Some(0),
        perm: Some(perm),
        atime: Some(MTIME),
        mtime: Some(MTIME),
    }
}

fn sftp_error(code: i32) -> ssh2::Error {
    ssh2::Error::new(ErrorCode::SFTP(code), "sftp error")
}

fn broken() -> ssh2::Error {
    ssh2::Error::new(ErrorCode::Session(LIBSSH2_ERROR_SOCKET_RECV), "failed to recv")
}
