//! Local and remote path forms
//!
//! Paths cross from host-native form into the wire form in exactly one
//! place, [`normalize_separators`]. Everything past that boundary is
//! `/`-separated.

use std::fmt;
use std::path::{Path, PathBuf};

/// Convert a host-native path string into canonical `/`-separated form
pub fn normalize_separators(path: &str) -> String {
    path.replace('\\', "/")
}

/// Path relative to the synchronization root
///
/// Always `/`-separated. The top of the tree is `.`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LocalPath(String);

impl LocalPath {
    /// The synchronization root itself
    pub fn root() -> Self {
        Self(".".to_string())
    }

    /// Build from a host-native relative path
    pub fn from_native(path: &Path) -> Self {
        let normalized = normalize_separators(&path.to_string_lossy());
        let trimmed = normalized.trim_matches('/');
        if trimmed.is_empty() || trimmed == "." {
            Self::root()
        } else {
            Self(trimmed.to_string())
        }
    }

    pub fn is_root(&self) -> bool {
        self.0 == "."
    }

    /// Child entry of this directory
    pub fn join(&self, name: &str) -> Self {
        if self.is_root() {
            Self(name.to_string())
        } else {
            Self(format!("{}/{}", self.0, name))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Host-native path under `root`
    pub fn to_native(&self, root: &Path) -> PathBuf {
        if self.is_root() {
            return root.to_path_buf();
        }
        self.0.split('/').fold(root.to_path_buf(), |acc, part| acc.join(part))
    }
}

impl fmt::Display for LocalPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Absolute `/`-separated path on the remote server, without trailing slash
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RemotePath(String);

impl RemotePath {
    /// The server root
    pub fn root() -> Self {
        Self("/".to_string())
    }

    /// Normalize a configured remote base directory
    ///
    /// `""` and `"/"` are the server root, `"site/"` becomes `/site`, repeated
    /// separators collapse.
    pub fn base(raw: &str) -> Self {
        let normalized = normalize_separators(raw.trim());
        let parts: Vec<&str> = normalized
            .split('/')
            .filter(|part| !part.is_empty() && *part != ".")
            .collect();
        if parts.is_empty() {
            Self::root()
        } else {
            Self(format!("/{}", parts.join("/")))
        }
    }

    pub fn is_root(&self) -> bool {
        self.0 == "/"
    }

    /// Entry directly below this directory
    pub fn child(&self, name: &str) -> Self {
        if self.is_root() {
            Self(format!("/{name}"))
        } else {
            Self(format!("{}/{}", self.0, name))
        }
    }

    /// Remote counterpart of a local relative path under this base
    pub fn join(&self, local: &LocalPath) -> Self {
        if local.is_root() {
            return self.clone();
        }
        local.as_str().split('/').fold(self.clone(), |acc, part| acc.child(part))
    }

    /// Every ancestor from the root down to this path, inclusive
    ///
    /// `/a/b/c` yields `/a`, `/a/b`, `/a/b/c`. The root yields nothing.
    pub fn prefixes(&self) -> Vec<RemotePath> {
        let mut current = RemotePath::root();
        self.0
            .split('/')
            .filter(|part| !part.is_empty())
            .map(|part| {
                current = current.child(part);
                current.clone()
            })
            .collect()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RemotePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
