//! # FTP test session
//!
//! An in-memory FTP server. Replies and broken connections can be injected per command.

use std::collections::HashMap;
use std::io::{self, Cursor, Read, Write};
use std::sync::{Arc, Mutex, MutexGuard};

use suppaftp::types::{FileType, Response};
use suppaftp::{FtpError, FtpResult, Status};

use super::{parent, resolve, Node, Tree};
use crate::config::FtpConfig;
use crate::ftp::FtpSession;

pub const USERNAME: &str = "bob";
pub const PASSWORD: &str = "password";

#[derive(Default)]
struct State {
    tree: Tree,
    refuse_connections: bool,
    fail_quit: bool,
    /// Replies to commands, by `COMMAND` or `COMMAND path`
    replies: HashMap<String, (Status, String)>,
    /// Commands which break the connection, by `COMMAND` or `COMMAND path`
    breaks: Vec<String>,
    connections: usize,
    open_sessions: usize,
    logouts: usize,
    binary: bool,
}

/// An in-memory FTP server; clones share the same state
#[derive(Clone, Default)]
pub struct MockFtpServer {
    state: Arc<Mutex<State>>,
}

impl MockFtpServer {
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

    pub fn fail_quit(&self) {
        self.lock().fail_quit = true;
    }

    /// Reply to `command` with `status`. `command` is either `CMD` or `CMD path`.
    pub fn reply_to(&self, command: &str, status: Status, text: &str) {
        self.lock()
            .replies
            .insert(command.to_string(), (status, text.to_string()));
    }

    /// Break the connection when `command` is received. `command` is either `CMD` or `CMD path`.
    pub fn break_on(&self, command: &str) {
        self.lock().breaks.push(command.to_string());
    }

    pub fn connections(&self) -> usize {
        self.lock().connections
    }

    pub fn open_sessions(&self) -> usize {
        self.lock().open_sessions
    }

    pub fn logouts(&self) -> usize {
        self.lock().logouts
    }

    pub fn binary(&self) -> bool {
        self.lock().binary
    }

    /// A session builder connecting to this server
    pub fn builder(&self) -> impl Fn(&FtpConfig) -> FtpResult<MockFtpSession> + Send + Sync + 'static {
        let server = self.clone();
        move |_config: &FtpConfig| server.connect()
    }

    fn connect(&self) -> FtpResult<MockFtpSession> {
        let mut state = self.lock();
        if state.refuse_connections {
            return Err(FtpError::ConnectionError(io::Error::new(
                io::ErrorKind::ConnectionRefused,
                "connection refused",
            )));
        }
        state.connections += 1;
        state.open_sessions += 1;
        Ok(MockFtpSession {
            state: self.state.clone(),
            cwd: String::from("/"),
            broken: false,
        })
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }
}

pub struct MockFtpSession {
    state: Arc<Mutex<State>>,
    cwd: String,
    broken: bool,
}

impl MockFtpSession {
    /// Fail with the injected outcome of `command`, if any
    fn check(&mut self, command: &str, path: &str) -> FtpResult<()> {
        if self.broken {
            return Err(broken_pipe());
        }
        let state = self.state.lock().unwrap();
        let keys = [format!("{command} {path}"), command.to_string()];
        if keys.iter().any(|key| state.breaks.contains(key)) {
            self.broken = true;
            return Err(broken_pipe());
        }
        match keys.iter().find_map(|key| state.replies.get(key)) {
            Some((status, text)) => Err(reply(*status, text)),
            None => Ok(()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }

    fn content(&self, path: &str) -> FtpResult<Vec<u8>> {
        self.lock()
            .tree
            .file(&resolve(&self.cwd, path))
            .map(|c| c.to_vec())
            .ok_or_else(|| reply(Status::FileUnavailable, "No such file or directory"))
    }
}

impl FtpSession for MockFtpSession {
    fn login(&mut self, user: &str, password: &str) -> FtpResult<()> {
        self.check("USER", user)?;
        if user == USERNAME && password == PASSWORD {
            Ok(())
        } else {
            Err(reply(Status::NotLoggedIn, "Login authentication failed"))
        }
    }

    fn transfer_type(&mut self, file_type: FileType) -> FtpResult<()> {
        self.check("TYPE", "")?;
        self.lock().binary = matches!(file_type, FileType::Binary);
        Ok(())
    }

    fn pwd(&mut self) -> FtpResult<String> {
        self.check("PWD", "")?;
        Ok(self.cwd.clone())
    }

    fn cwd(&mut self, path: &str) -> FtpResult<()> {
        self.check("CWD", path)?;
        let target = resolve(&self.cwd, path);
        if self.lock().tree.is_dir(&target) {
            self.cwd = target;
            Ok(())
        } else {
            Err(reply(Status::FileUnavailable, "No such file or directory"))
        }
    }

    fn size(&mut self, path: &str) -> FtpResult<usize> {
        self.check("SIZE", path)?;
        self.content(path)
            .map(|content| content.len())
            .map_err(|_| reply(Status::FileUnavailable, "Could not get file size."))
    }

    fn retr_as_stream(&mut self, path: &str) -> FtpResult<Box<dyn Read>> {
        self.check("RETR", path)?;
        let content = self.content(path)?;
        Ok(Box::new(Cursor::new(content)))
    }

    fn finalize_retr_stream(&mut self, stream: Box<dyn Read>) -> FtpResult<()> {
        drop(stream);
        self.check("RETR-END", "")
    }

    fn retr(&mut self, path: &str, sink: &mut dyn Write) -> FtpResult<u64> {
        self.check("RETR", path)?;
        let content = self.content(path)?;
        sink.write_all(&content).map_err(FtpError::ConnectionError)?;
        Ok(content.len() as u64)
    }

    fn put_file(&mut self, path: &str, source: &mut dyn Read) -> FtpResult<u64> {
        self.check("STOR", path)?;
        let target = resolve(&self.cwd, path);
        {
            let state = self.lock();
            if !state.tree.is_dir(&parent(&target)) || state.tree.is_dir(&target) {
                return Err(reply(
                    Status::BadFilename,
                    "Can't open that file: No such file or directory",
                ));
            }
        }
        let mut content = Vec::new();
        source
            .read_to_end(&mut content)
            .map_err(FtpError::ConnectionError)?;
        let bytes = content.len() as u64;
        self.lock().tree.write(&target, content);
        Ok(bytes)
    }

    fn list(&mut self, path: &str) -> FtpResult<Vec<String>> {
        self.check("LIST", path)?;
        let target = resolve(&self.cwd, path);
        let state = self.lock();
        if !state.tree.is_dir(&target) {
            return Ok(Vec::new());
        }
        let children = state.tree.children(&target);
        let mut lines = vec![format!("total {}", children.len())];
        lines.extend(children.into_iter().map(|(name, node)| match node {
            Node::Dir => format!("drwxr-xr-x 2 0 0 4096 Nov 5 2018 {name}"),
            Node::File(content) => {
                format!("-rw-r--r-- 1 0 0 {} Nov 5 2018 {name}", content.len())
            }
        }));
        Ok(lines)
    }

    fn rm(&mut self, path: &str) -> FtpResult<()> {
        self.check("DELE", path)?;
        let target = resolve(&self.cwd, path);
        let mut state = self.lock();
        if state.tree.file(&target).is_some() && state.tree.remove(&target) {
            Ok(())
        } else {
            Err(reply(Status::FileUnavailable, "No such file or directory"))
        }
    }

    fn quit(&mut self) -> FtpResult<()> {
        self.check("QUIT", "")?;
        let mut state = self.lock();
        if state.fail_quit {
            return Err(broken_pipe());
        }
        state.logouts += 1;
        Ok(())
    }
}

impl Drop for MockFtpSession {
    fn drop(&mut self) {
        if let Ok(mut state) = self.state.lock() {
            state.open_sessions -= 1;
        }
    }
}

pub fn reply(status: Status, text: &str) -> FtpError {
    FtpError::UnexpectedResponse(Response::new(status, text.as_bytes().to_vec()))
}

fn broken_pipe() -> FtpError {
    FtpError::ConnectionError(io::Error::new(io::ErrorKind::BrokenPipe, "broken pipe"))
}
