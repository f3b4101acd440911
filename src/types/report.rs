//! UploadReport - Accumulated outcome of a deployment run

use super::SyncAction;

/// Aggregate statistics about a run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReportStats {
    pub dirs_created: usize,
    pub dirs_existing: usize,
    pub dirs_pruned: usize,
    pub files_uploaded: usize,
    pub files_skipped: usize,
    pub bytes_uploaded: u64,
}

/// Ordered record of what a run did
#[derive(Debug, Clone, Default)]
pub struct UploadReport {
    /// Actions in traversal order
    pub actions: Vec<SyncAction>,

    pub stats: ReportStats,
}

impl UploadReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an action and update statistics
    pub fn record(&mut self, action: SyncAction) {
        match &action {
            SyncAction::CreateDir(_) => self.stats.dirs_created += 1,
            SyncAction::ExistingDir(_) => self.stats.dirs_existing += 1,
            SyncAction::Prune(_) => self.stats.dirs_pruned += 1,
            SyncAction::Upload { bytes, .. } => {
                self.stats.files_uploaded += 1;
                self.stats.bytes_uploaded += bytes;
            }
            SyncAction::Skip(_) => self.stats.files_skipped += 1,
        }
        self.actions.push(action);
    }

    /// Remote paths of uploaded files, in upload order
    pub fn uploaded_paths(&self) -> Vec<&str> {
        self.actions
            .iter()
            .filter_map(|action| match action {
                SyncAction::Upload { remote, .. } => Some(remote.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Remote directories created, in creation order
    pub fn created_dirs(&self) -> Vec<&str> {
        self.actions
            .iter()
            .filter_map(|action| match action {
                SyncAction::CreateDir(remote) => Some(remote.as_str()),
                _ => None,
            })
            .collect()
    }
}
