//! Shared fixtures: local trees on disk and a remote that fails on demand.

#![allow(dead_code)]

use ftpdeploy::matcher::ExclusionSet;
use ftpdeploy::remote::{MemorySession, MemoryTransport, RemoteSession, Transport};
use ftpdeploy::types::{RemoteError, RemoteErrorKind, RemotePath};
use ftpdeploy::Config;
use std::cell::Cell;
use std::fs;
use std::io::Read;
use std::path::Path;
use std::rc::Rc;

/// Write `files` (relative path, content) under `root`, creating parents
pub fn write_tree(root: &Path, files: &[(&str, &[u8])]) {
    for (rel, content) in files {
        let path = root.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create parent dirs");
        }
        fs::write(&path, content).expect("write tree file");
    }
}

pub fn config_for(root: &Path, remote: &str, extra_excludes: &[&str]) -> Config {
    Config {
        local_root: root.to_path_buf(),
        remote_base: RemotePath::base(remote),
        exclusions: ExclusionSet::with_defaults(extra_excludes.iter().copied()),
        ..Config::default()
    }
}

/// Which operations should fail
#[derive(Debug, Clone, Default)]
pub struct Faults {
    pub refuse_connect: bool,
    pub reject_login: bool,
    /// 1-based index of the upload that fails
    pub upload_fails_at: Option<usize>,
    pub mkdir_denied: Option<String>,
    pub cwd_denied: Option<String>,
    pub quit_fails: bool,
}

/// [`MemoryTransport`] with injected failures
pub struct FaultyTransport {
    pub inner: MemoryTransport,
    pub faults: Faults,
    uploads: Rc<Cell<usize>>,
}

impl FaultyTransport {
    pub fn new(inner: MemoryTransport, faults: Faults) -> Self {
        Self {
            inner,
            faults,
            uploads: Rc::new(Cell::new(0)),
        }
    }
}

impl Transport for FaultyTransport {
    type Session = FaultySession;

    fn connect(&self, address: &str) -> Result<FaultySession, RemoteError> {
        if self.faults.refuse_connect {
            return Err(RemoteError::new(RemoteErrorKind::Connection, "Connection refused"));
        }
        Ok(FaultySession {
            inner: self.inner.connect(address)?,
            faults: self.faults.clone(),
            uploads: Rc::clone(&self.uploads),
        })
    }
}

pub struct FaultySession {
    inner: MemorySession,
    faults: Faults,
    uploads: Rc<Cell<usize>>,
}

impl RemoteSession for FaultySession {
    fn login(&mut self, username: &str, password: &str) -> Result<(), RemoteError> {
        if self.faults.reject_login {
            return Err(RemoteError::new(RemoteErrorKind::NotLoggedIn, "Login incorrect.").with_code(530));
        }
        self.inner.login(username, password)
    }

    fn change_dir(&mut self, path: &RemotePath) -> Result<(), RemoteError> {
        if self.faults.cwd_denied.as_deref() == Some(path.as_str()) {
            return Err(RemoteError::new(RemoteErrorKind::PermissionDenied, "Permission denied").with_code(550));
        }
        self.inner.change_dir(path)
    }

    fn make_dir(&mut self, path: &RemotePath) -> Result<(), RemoteError> {
        if self.faults.mkdir_denied.as_deref() == Some(path.as_str()) {
            return Err(RemoteError::new(RemoteErrorKind::PermissionDenied, "Permission denied").with_code(550));
        }
        self.inner.make_dir(path)
    }

    fn upload(&mut self, path: &RemotePath, reader: &mut dyn Read) -> Result<u64, RemoteError> {
        let attempt = self.uploads.get() + 1;
        self.uploads.set(attempt);
        if self.faults.upload_fails_at == Some(attempt) {
            return Err(RemoteError::new(RemoteErrorKind::Connection, "Transfer aborted").with_code(426));
        }
        self.inner.upload(path, reader)
    }

    fn quit(&mut self) -> Result<(), RemoteError> {
        self.inner.quit()?;
        if self.faults.quit_fails {
            return Err(RemoteError::new(RemoteErrorKind::Connection, "Broken pipe"));
        }
        Ok(())
    }
}
