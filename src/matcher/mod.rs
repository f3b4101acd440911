//! Exclusion rules and path matching
//!
//! Rules are shell-glob patterns matched against the whole `/`-separated
//! relative path. A rule ending in `/` is a directory rule: it matches the
//! directory itself and, by literal prefix, everything beneath it.

use crate::types::{normalize_separators, SyncError};
use globset::{GlobBuilder, GlobSet, GlobSetBuilder};

/// Rules every run carries, ahead of any caller-supplied ones
pub const DEFAULT_EXCLUDES: &[&str] = &[
    ".git/",
    ".github/",
    "__pycache__/",
    "*.pyc",
    "*.DS_Store",
    "Thumbs.db",
    ".env",
    "ftpdeploy.toml",
];

/// Ordered exclusion rules: defaults first, then caller additions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExclusionSet {
    rules: Vec<String>,
}

impl ExclusionSet {
    /// Defaults extended with `extra`; blank entries are dropped
    pub fn with_defaults<I, S>(extra: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let rules = DEFAULT_EXCLUDES
            .iter()
            .map(|rule| rule.to_string())
            .chain(
                extra
                    .into_iter()
                    .map(|rule| rule.as_ref().trim().to_string())
                    .filter(|rule| !rule.is_empty()),
            )
            .collect();
        Self { rules }
    }

    pub fn rules(&self) -> &[String] {
        &self.rules
    }
}

impl Default for ExclusionSet {
    fn default() -> Self {
        Self::with_defaults(std::iter::empty::<&str>())
    }
}

/// Decides whether a relative path is excluded from synchronization
#[derive(Debug, Clone)]
pub struct PathMatcher {
    globs: GlobSet,
    dir_prefixes: Vec<String>,
}

impl PathMatcher {
    /// Compile an exclusion set
    ///
    /// # Errors
    /// * `SyncError::Config` naming the first rule that is not a valid glob
    pub fn new(exclusions: &ExclusionSet) -> Result<Self, SyncError> {
        let mut builder = GlobSetBuilder::new();
        let mut dir_prefixes = Vec::new();

        for rule in exclusions.rules() {
            // `*` crosses `/` and matching is case-sensitive, as in fnmatch.
            // Rules are taken as written; `\` escapes on every host.
            let glob = GlobBuilder::new(rule)
                .literal_separator(false)
                .case_insensitive(false)
                .backslash_escape(true)
                .build()
                .map_err(|e| {
                    SyncError::Config(format!("Invalid exclude pattern '{}': {}", rule, e))
                })?;
            builder.add(glob);

            if rule.ends_with('/') {
                dir_prefixes.push(rule.clone());
            }
        }

        let globs = builder
            .build()
            .map_err(|e| SyncError::Config(format!("Failed to build exclude patterns: {}", e)))?;

        Ok(Self {
            globs,
            dir_prefixes,
        })
    }

    /// Whether `path` (relative to the sync root) must be skipped
    ///
    /// Directories are matched with a trailing `/` so that directory rules
    /// apply to them. The empty path never matches.
    pub fn should_exclude(&self, path: &str, is_dir: bool) -> bool {
        if path.is_empty() {
            return false;
        }

        let mut candidate = normalize_separators(path);
        if is_dir && !candidate.ends_with('/') {
            candidate.push('/');
        }

        self.globs.is_match(&candidate)
            || self
                .dir_prefixes
                .iter()
                .any(|prefix| candidate.starts_with(prefix.as_str()))
    }
}
