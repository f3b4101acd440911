//! In-memory remote used for dry runs
//!
//! Behaves like a small FTP server: directories must be created one level
//! at a time, creating an existing one fails with `AlreadyExists`, and every
//! call is appended to an operation log.

use super::{RemoteSession, Transport};
use crate::types::{RemoteError, RemoteErrorKind, RemotePath};
use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};
use std::io::{self, Read};
use std::rc::Rc;

/// One call made against the in-memory remote
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteOp {
    Connect(String),
    Login(String),
    ChangeDir(String),
    MakeDir(String),
    Upload { path: String, bytes: u64 },
    Quit,
}

/// Server-side state shared by all sessions of one transport
#[derive(Debug, Clone)]
pub struct MemoryState {
    pub directories: BTreeSet<String>,
    /// Stored files and their sizes
    pub files: BTreeMap<String, u64>,
    pub ops: Vec<RemoteOp>,
    pub cwd: String,
}

impl Default for MemoryState {
    fn default() -> Self {
        Self {
            directories: BTreeSet::from(["/".to_string()]),
            files: BTreeMap::new(),
            ops: Vec::new(),
            cwd: "/".to_string(),
        }
    }
}

/// Transport whose server lives in memory
#[derive(Debug, Clone, Default)]
pub struct MemoryTransport {
    state: Rc<RefCell<MemoryState>>,
}

impl MemoryTransport {
    /// Empty server holding only `/`
    pub fn new() -> Self {
        Self::default()
    }

    /// Server pre-populated with `dirs` (and their ancestors)
    pub fn with_dirs<I, S>(dirs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let transport = Self::new();
        {
            let mut state = transport.state.borrow_mut();
            for dir in dirs {
                for prefix in RemotePath::base(dir.as_ref()).prefixes() {
                    state.directories.insert(prefix.to_string());
                }
            }
        }
        transport
    }

    /// Copy of the current server state
    pub fn snapshot(&self) -> MemoryState {
        self.state.borrow().clone()
    }
}

impl Transport for MemoryTransport {
    type Session = MemorySession;

    fn connect(&self, address: &str) -> Result<MemorySession, RemoteError> {
        self.state
            .borrow_mut()
            .ops
            .push(RemoteOp::Connect(address.to_string()));
        Ok(MemorySession {
            state: Rc::clone(&self.state),
            logged_in: false,
        })
    }
}

/// Session on a [`MemoryTransport`]
#[derive(Debug)]
pub struct MemorySession {
    state: Rc<RefCell<MemoryState>>,
    logged_in: bool,
}

impl MemorySession {
    fn require_login(&self) -> Result<(), RemoteError> {
        if self.logged_in {
            Ok(())
        } else {
            Err(RemoteError::new(RemoteErrorKind::NotLoggedIn, "Please login with USER and PASS").with_code(530))
        }
    }
}

fn parent_of(path: &RemotePath) -> String {
    match path.as_str().rsplit_once('/') {
        Some(("", _)) | None => "/".to_string(),
        Some((parent, _)) => parent.to_string(),
    }
}

impl RemoteSession for MemorySession {
    fn login(&mut self, username: &str, _password: &str) -> Result<(), RemoteError> {
        self.state
            .borrow_mut()
            .ops
            .push(RemoteOp::Login(username.to_string()));
        self.logged_in = true;
        Ok(())
    }

    fn change_dir(&mut self, path: &RemotePath) -> Result<(), RemoteError> {
        self.require_login()?;
        let mut state = self.state.borrow_mut();
        state.ops.push(RemoteOp::ChangeDir(path.to_string()));
        if !state.directories.contains(path.as_str()) {
            return Err(RemoteError::not_found(format!("{}: No such file or directory", path)).with_code(550));
        }
        state.cwd = path.to_string();
        Ok(())
    }

    fn make_dir(&mut self, path: &RemotePath) -> Result<(), RemoteError> {
        self.require_login()?;
        let mut state = self.state.borrow_mut();
        state.ops.push(RemoteOp::MakeDir(path.to_string()));
        if state.directories.contains(path.as_str()) || state.files.contains_key(path.as_str()) {
            return Err(RemoteError::already_exists(format!("{}: File exists", path)).with_code(550));
        }
        if !state.directories.contains(&parent_of(path)) {
            return Err(RemoteError::not_found(format!("{}: No such file or directory", path)).with_code(550));
        }
        state.directories.insert(path.to_string());
        Ok(())
    }

    fn upload(&mut self, path: &RemotePath, reader: &mut dyn Read) -> Result<u64, RemoteError> {
        self.require_login()?;
        if !self.state.borrow().directories.contains(&parent_of(path)) {
            return Err(RemoteError::not_found(format!("{}: No such file or directory", path)).with_code(553));
        }

        let bytes = io::copy(reader, &mut io::sink()).map_err(|e| {
            RemoteError::new(RemoteErrorKind::Connection, format!("transfer aborted: {}", e)).with_code(426)
        })?;

        let mut state = self.state.borrow_mut();
        state.ops.push(RemoteOp::Upload {
            path: path.to_string(),
            bytes,
        });
        state.files.insert(path.to_string(), bytes);
        Ok(bytes)
    }

    fn quit(&mut self) -> Result<(), RemoteError> {
        self.state.borrow_mut().ops.push(RemoteOp::Quit);
        self.logged_in = false;
        Ok(())
    }
}
