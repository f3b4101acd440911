//! Remote filesystem access
//!
//! The synchronizer talks to the server only through [`Transport`] and
//! [`RemoteSession`]. Adapters classify server replies into
//! [`RemoteErrorKind`](crate::types::RemoteErrorKind) so callers never look
//! at reply text.

mod ftp;
mod memory;

pub use ftp::{classify_reply, FtpSession, FtpTransport};
pub use memory::{MemorySession, MemoryState, MemoryTransport, RemoteOp};

use crate::types::{RemoteError, RemotePath};
use std::fmt;
use std::io::Read;

/// Opens sessions against a server
pub trait Transport {
    type Session: RemoteSession;

    /// Open a control connection to `address` (`host:port`)
    fn connect(&self, address: &str) -> Result<Self::Session, RemoteError>;
}

/// One open, stateful session on the server
pub trait RemoteSession {
    fn login(&mut self, username: &str, password: &str) -> Result<(), RemoteError>;

    fn change_dir(&mut self, path: &RemotePath) -> Result<(), RemoteError>;

    /// Create a single directory; its parent must exist
    fn make_dir(&mut self, path: &RemotePath) -> Result<(), RemoteError>;

    /// Store the full contents of `reader` at `path` in binary mode
    fn upload(&mut self, path: &RemotePath, reader: &mut dyn Read) -> Result<u64, RemoteError>;

    fn quit(&mut self) -> Result<(), RemoteError>;
}

/// Login credentials
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credentials_debug_hides_password() {
        let creds = Credentials::new("deploy", "hunter2");
        let debug = format!("{:?}", creds);
        assert!(debug.contains("deploy"));
        assert!(!debug.contains("hunter2"));
    }
}
