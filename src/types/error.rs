//! Error types for ftpdeploy

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Error types for a deployment run
#[derive(Debug, Error)]
pub enum SyncError {
    /// Invalid or missing configuration, detected before any connection
    #[error("Configuration error: {0}")]
    Config(String),

    /// Server unreachable or login rejected
    #[error("Connection to {address} failed: {source}")]
    Connection {
        address: String,
        #[source]
        source: RemoteError,
    },

    /// Remote directory could not be entered or created
    #[error("Remote directory error at {path}: {source}")]
    RemoteDirectory {
        path: String,
        #[source]
        source: RemoteError,
    },

    /// Local path could not be listed or read
    #[error("Local I/O error at {}: {source}", .path.display())]
    LocalIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Upload failed on the transport side
    #[error("Upload of {path} failed: {source}")]
    Transport {
        path: String,
        #[source]
        source: RemoteError,
    },
}

impl SyncError {
    /// Check if this error was raised before any resource was acquired
    pub fn is_config_error(&self) -> bool {
        matches!(self, SyncError::Config(_))
    }

    /// Remote path involved in the failure, if any
    pub fn remote_path(&self) -> Option<&str> {
        match self {
            SyncError::RemoteDirectory { path, .. } | SyncError::Transport { path, .. } => {
                Some(path)
            }
            _ => None,
        }
    }

    /// Underlying remote error, if the failure came from the server
    pub fn remote_error(&self) -> Option<&RemoteError> {
        match self {
            SyncError::Connection { source, .. }
            | SyncError::RemoteDirectory { source, .. }
            | SyncError::Transport { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Structured classification of a remote failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteErrorKind {
    /// Directory (or file) already present on the server
    AlreadyExists,
    /// Path does not exist on the server
    NotFound,
    /// Server refused the operation
    PermissionDenied,
    /// Credentials rejected, or session not authenticated
    NotLoggedIn,
    /// TCP / DNS / socket failure
    Connection,
    /// Any other rejected command or malformed reply
    Protocol,
}

impl fmt::Display for RemoteErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            RemoteErrorKind::AlreadyExists => "already exists",
            RemoteErrorKind::NotFound => "not found",
            RemoteErrorKind::PermissionDenied => "permission denied",
            RemoteErrorKind::NotLoggedIn => "not logged in",
            RemoteErrorKind::Connection => "connection failure",
            RemoteErrorKind::Protocol => "rejected",
        };
        f.write_str(label)
    }
}

/// Error returned by a remote session operation
#[derive(Debug, Clone, Error)]
#[error("{kind}{}: {message}", .code.map(|c| format!(" ({c})")).unwrap_or_default())]
pub struct RemoteError {
    pub kind: RemoteErrorKind,
    /// Server reply code that triggered the error, if any
    pub code: Option<u16>,
    pub message: String,
}

impl RemoteError {
    pub fn new(kind: RemoteErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            code: None,
            message: message.into(),
        }
    }

    pub fn with_code(mut self, code: u16) -> Self {
        self.code = Some(code);
        self
    }

    pub fn already_exists(message: impl Into<String>) -> Self {
        Self::new(RemoteErrorKind::AlreadyExists, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(RemoteErrorKind::NotFound, message)
    }

    pub fn is_already_exists(&self) -> bool {
        self.kind == RemoteErrorKind::AlreadyExists
    }

    pub fn is_not_found(&self) -> bool {
        self.kind == RemoteErrorKind::NotFound
    }
}
