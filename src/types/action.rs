//! SyncAction - Steps recorded by the synchronizer

use super::{LocalPath, RemotePath};

/// One step of a deployment run, in traversal order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncAction {
    /// Remote directory created
    CreateDir(RemotePath),

    /// Remote directory was already present
    ExistingDir(RemotePath),

    /// Local directory excluded; its subtree was never visited
    Prune(LocalPath),

    /// File uploaded
    Upload {
        local: LocalPath,
        remote: RemotePath,
        bytes: u64,
    },

    /// File excluded
    Skip(LocalPath),
}

impl SyncAction {
    /// Short label used in logs and plan output
    pub fn label(&self) -> &'static str {
        match self {
            SyncAction::CreateDir(_) => "MKDIR",
            SyncAction::ExistingDir(_) => "EXISTS",
            SyncAction::Prune(_) => "PRUNE",
            SyncAction::Upload { .. } => "UPLOAD",
            SyncAction::Skip(_) => "SKIP",
        }
    }
}
