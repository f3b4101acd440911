//! Core type definitions for ftpdeploy

mod action;
mod error;
mod path;
mod report;

pub use action::SyncAction;
pub use error::{RemoteError, RemoteErrorKind, SyncError};
pub use path::{normalize_separators, LocalPath, RemotePath};
pub use report::{ReportStats, UploadReport};
