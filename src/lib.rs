//! # ftpdeploy - Deploy a directory tree over FTP
//!
//! Mirrors a local directory onto an FTP server in one sequential pass:
//! remote directories are created as needed, every file is uploaded in
//! binary mode, and paths matching the exclusion rules are skipped (excluded
//! directories are never even walked).

// Module declarations
pub mod config;
pub mod local;
pub mod matcher;
pub mod remote;
pub mod sync;
pub mod ui;
pub mod commands;
pub mod types;

// Re-export commonly used types
pub use config::Config;
pub use matcher::{ExclusionSet, PathMatcher, DEFAULT_EXCLUDES};
pub use sync::{synchronize, SyncEvent};
pub use types::{LocalPath, RemotePath, SyncAction, SyncError, UploadReport};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
