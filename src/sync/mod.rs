//! Tree synchronization
//!
//! One pass, one session, strictly sequential:
//!
//! 1. connect and log in
//! 2. establish the remote base directory (create it component by component
//!    when missing)
//! 3. walk the local tree top-down; at each directory prune excluded
//!    subdirectories, create the remote counterparts of the rest, upload the
//!    non-excluded files, then descend
//! 4. quit, whatever happened before
//!
//! The first fatal error stops the walk. Files already uploaded stay on the
//! server.

mod session;

pub use session::ScopedSession;

use crate::config::Config;
use crate::local::LocalFs;
use crate::matcher::PathMatcher;
use crate::remote::{RemoteSession, Transport};
use crate::types::{LocalPath, RemotePath, SyncAction, SyncError, UploadReport};
use std::io::{self, Read};
use tracing::{debug, info};

/// Events emitted while a run progresses
#[derive(Debug, Clone)]
pub enum SyncEvent {
    /// Logged in to the server
    Connected { address: String },
    /// About to upload a file
    UploadStarted { local: LocalPath, remote: RemotePath },
    /// Step finished and added to the report
    Recorded(SyncAction),
}

/// Optional callback used to receive sync events
pub type SyncCallback<'a> = dyn Fn(&SyncEvent) + 'a;

/// Synchronize `config.local_root` to `config.remote_base` on the server
///
/// # Errors
/// * `SyncError::Config` for an invalid exclusion rule (before connecting)
/// * `SyncError::Connection` if the server is unreachable or rejects the login
/// * `SyncError::RemoteDirectory` if a remote directory cannot be entered or
///   created (an existing directory is not an error)
/// * `SyncError::LocalIo` if a local directory cannot be listed or a file read
/// * `SyncError::Transport` if an upload fails on the wire
pub fn synchronize<T, L>(
    config: &Config,
    transport: &T,
    local: &L,
    on_event: Option<&SyncCallback<'_>>,
) -> Result<UploadReport, SyncError>
where
    T: Transport,
    L: LocalFs,
{
    let matcher = PathMatcher::new(&config.exclusions)?;
    let mut synchronizer = TreeSynchronizer {
        config,
        matcher,
        local,
        report: UploadReport::new(),
        on_event,
    };

    let address = config.server.to_string();
    info!(%address, "Connecting to FTP server");
    let session = transport
        .connect(&address)
        .map_err(|source| SyncError::Connection {
            address: address.clone(),
            source,
        })?;

    let mut session = ScopedSession::new(session);
    let outcome = synchronizer.run(&mut *session, &address);
    session.close();

    outcome.map(|()| synchronizer.report)
}

struct TreeSynchronizer<'a, L: LocalFs> {
    config: &'a Config,
    matcher: PathMatcher,
    local: &'a L,
    report: UploadReport,
    on_event: Option<&'a SyncCallback<'a>>,
}

impl<L: LocalFs> TreeSynchronizer<'_, L> {
    fn run<S: RemoteSession>(&mut self, session: &mut S, address: &str) -> Result<(), SyncError> {
        let credentials = &self.config.credentials;
        session
            .login(&credentials.username, &credentials.password)
            .map_err(|source| SyncError::Connection {
                address: address.to_string(),
                source,
            })?;
        info!(user = %credentials.username, "Logged in");
        self.emit(SyncEvent::Connected {
            address: address.to_string(),
        });

        let base = self.config.remote_base.clone();
        self.establish_base(session, &base)?;

        info!(local = %self.config.local_root.display(), remote = %base, "Uploading tree");
        self.visit(session, &LocalPath::root(), &base)
    }

    /// Enter the remote base, creating it first when the server says it is missing
    fn establish_base<S: RemoteSession>(
        &mut self,
        session: &mut S,
        base: &RemotePath,
    ) -> Result<(), SyncError> {
        if base.is_root() {
            return Ok(());
        }

        match session.change_dir(base) {
            Ok(()) => {
                info!(remote = %base, "Using existing remote directory");
                return Ok(());
            }
            Err(e) if e.is_not_found() => {
                info!(remote = %base, "Remote directory does not exist, creating it");
            }
            Err(source) => {
                return Err(SyncError::RemoteDirectory {
                    path: base.to_string(),
                    source,
                })
            }
        }

        for prefix in base.prefixes() {
            self.ensure_dir(session, &prefix)?;
        }

        session
            .change_dir(base)
            .map_err(|source| SyncError::RemoteDirectory {
                path: base.to_string(),
                source,
            })
    }

    fn visit<S: RemoteSession>(
        &mut self,
        session: &mut S,
        dir: &LocalPath,
        remote_dir: &RemotePath,
    ) -> Result<(), SyncError> {
        let native = dir.to_native(&self.config.local_root);
        let listing = self
            .local
            .list_entries(&native)
            .map_err(|source| SyncError::LocalIo {
                path: native.clone(),
                source,
            })?;

        // Every surviving subdirectory exists remotely before any descent
        let mut descend = Vec::with_capacity(listing.directories.len());
        for name in &listing.directories {
            let child = dir.join(name);
            if self.matcher.should_exclude(child.as_str(), true) {
                debug!(path = %child, "Pruning excluded directory");
                self.record(SyncAction::Prune(child));
                continue;
            }
            let remote = remote_dir.child(name);
            self.ensure_dir(session, &remote)?;
            descend.push((child, remote));
        }

        for name in &listing.files {
            let file = dir.join(name);
            if self.matcher.should_exclude(file.as_str(), false) {
                debug!(path = %file, "Skipping excluded file");
                self.record(SyncAction::Skip(file));
                continue;
            }
            let remote = remote_dir.child(name);
            self.upload(session, file, remote)?;
        }

        for (child, remote) in descend {
            self.visit(session, &child, &remote)?;
        }
        Ok(())
    }

    /// Create a remote directory, accepting one that is already there
    fn ensure_dir<S: RemoteSession>(
        &mut self,
        session: &mut S,
        remote: &RemotePath,
    ) -> Result<(), SyncError> {
        match session.make_dir(remote) {
            Ok(()) => {
                info!(remote = %remote, "Created remote directory");
                self.record(SyncAction::CreateDir(remote.clone()));
                Ok(())
            }
            Err(e) if e.is_already_exists() => {
                debug!(remote = %remote, reply = %e, "Remote directory already exists");
                self.record(SyncAction::ExistingDir(remote.clone()));
                Ok(())
            }
            Err(source) => Err(SyncError::RemoteDirectory {
                path: remote.to_string(),
                source,
            }),
        }
    }

    fn upload<S: RemoteSession>(
        &mut self,
        session: &mut S,
        local: LocalPath,
        remote: RemotePath,
    ) -> Result<(), SyncError> {
        let native = local.to_native(&self.config.local_root);
        let reader = self
            .local
            .open_for_read(&native)
            .map_err(|source| SyncError::LocalIo {
                path: native.clone(),
                source,
            })?;

        self.emit(SyncEvent::UploadStarted {
            local: local.clone(),
            remote: remote.clone(),
        });

        let mut reader = TrackedReader::new(reader);
        let bytes = match session.upload(&remote, &mut reader) {
            Ok(bytes) => bytes,
            // A read failure surfaces as a transfer failure; blame the right side
            Err(source) => {
                return Err(match reader.take_error() {
                    Some(io_error) => SyncError::LocalIo {
                        path: native,
                        source: io_error,
                    },
                    None => SyncError::Transport {
                        path: remote.to_string(),
                        source,
                    },
                })
            }
        };

        info!(local = %local, remote = %remote, bytes, "Uploaded");
        self.record(SyncAction::Upload {
            local,
            remote,
            bytes,
        });
        Ok(())
    }

    fn record(&mut self, action: SyncAction) {
        self.emit(SyncEvent::Recorded(action.clone()));
        self.report.record(action);
    }

    fn emit(&self, event: SyncEvent) {
        if let Some(callback) = self.on_event {
            callback(&event);
        }
    }
}

/// Remembers the first read error so upload failures can be attributed
struct TrackedReader<R> {
    inner: R,
    error: Option<io::Error>,
}

impl<R: Read> TrackedReader<R> {
    fn new(inner: R) -> Self {
        Self { inner, error: None }
    }

    fn take_error(&mut self) -> Option<io::Error> {
        self.error.take()
    }
}

impl<R: Read> Read for TrackedReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.read(buf).map_err(|e| {
            if e.kind() != io::ErrorKind::Interrupted && self.error.is_none() {
                self.error = Some(io::Error::new(e.kind(), e.to_string()));
            }
            e
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::local::DiskFs;
    use crate::matcher::ExclusionSet;
    use crate::remote::{MemoryTransport, RemoteOp};
    use std::fs;
    use tempfile::TempDir;

    fn config_for(root: &std::path::Path, remote: &str) -> Config {
        Config {
            local_root: root.to_path_buf(),
            remote_base: RemotePath::base(remote),
            ..Config::default()
        }
    }

    #[test]
    fn test_tracked_reader_keeps_first_error() {
        struct Failing;
        impl Read for Failing {
            fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
                Err(io::Error::new(io::ErrorKind::PermissionDenied, "denied"))
            }
        }

        let mut reader = TrackedReader::new(Failing);
        let mut buf = [0u8; 4];
        assert!(reader.read(&mut buf).is_err());
        let err = reader.take_error().expect("error should be kept");
        assert_eq!(err.kind(), io::ErrorKind::PermissionDenied);
        assert!(reader.take_error().is_none());
    }

    #[test]
    fn test_root_base_skips_change_dir() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        fs::write(temp_dir.path().join("index.html"), b"<html>").expect("write file");

        let transport = MemoryTransport::new();
        let report = synchronize(&config_for(temp_dir.path(), ""), &transport, &DiskFs, None)
            .expect("sync should succeed");

        assert_eq!(report.uploaded_paths(), vec!["/index.html"]);
        let ops = transport.snapshot().ops;
        assert!(!ops.iter().any(|op| matches!(op, RemoteOp::ChangeDir(_))));
        assert_eq!(ops.last(), Some(&RemoteOp::Quit));
    }

    #[test]
    fn test_missing_base_created_component_by_component() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let transport = MemoryTransport::with_dirs(["/srv"]);

        let report = synchronize(
            &config_for(temp_dir.path(), "srv/www/site"),
            &transport,
            &DiskFs,
            None,
        )
        .expect("sync should succeed");

        assert_eq!(report.created_dirs(), vec!["/srv/www", "/srv/www/site"]);
        assert_eq!(report.stats.dirs_existing, 1);
        assert_eq!(transport.snapshot().cwd, "/srv/www/site");
    }

    #[test]
    fn test_invalid_rule_fails_before_connecting() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let config = Config {
            exclusions: ExclusionSet::with_defaults(["[oops"]),
            ..config_for(temp_dir.path(), "/site")
        };
        let transport = MemoryTransport::new();

        let err = synchronize(&config, &transport, &DiskFs, None).expect_err("bad rule");
        assert!(err.is_config_error());
        assert!(transport.snapshot().ops.is_empty(), "no connection attempted");
    }

    #[test]
    fn test_events_follow_report() {
        use std::cell::RefCell;

        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        fs::write(temp_dir.path().join("a.txt"), b"a").expect("write file");
        fs::write(temp_dir.path().join(".env"), b"SECRET=1").expect("write file");

        let events = RefCell::new(Vec::new());
        let callback = |event: &SyncEvent| events.borrow_mut().push(event.clone());
        let report = synchronize(
            &config_for(temp_dir.path(), "/"),
            &MemoryTransport::new(),
            &DiskFs,
            Some(&callback),
        )
        .expect("sync should succeed");

        let events = events.into_inner();
        assert!(matches!(events.first(), Some(SyncEvent::Connected { .. })));
        let recorded: Vec<SyncAction> = events
            .iter()
            .filter_map(|e| match e {
                SyncEvent::Recorded(action) => Some(action.clone()),
                _ => None,
            })
            .collect();
        assert_eq!(recorded, report.actions);
        assert_eq!(report.stats.files_skipped, 1);
        assert_eq!(report.stats.files_uploaded, 1);
    }
}
