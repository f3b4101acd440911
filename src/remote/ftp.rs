//! FTP adapter over `suppaftp`

use super::{RemoteSession, Transport};
use crate::types::{RemoteError, RemoteErrorKind, RemotePath};
use std::io::Read;
use std::net::ToSocketAddrs;
use std::time::Duration;
use suppaftp::types::FileType;
use suppaftp::{FtpError, FtpStream};
use tracing::debug;

/// Negated forms of "exists"; these mean the opposite
const NEGATED_EXISTS_PHRASES: &[&str] = &["does not exist", "doesn't exist", "not exist"];

const PERMISSION_PHRASES: &[&str] = &["permission denied", "access denied", "not allowed"];

const NOT_FOUND_PHRASES: &[&str] = &[
    "no such file",
    "no such directory",
    "not found",
    "does not exist",
    "doesn't exist",
    "cannot find",
    "can't find",
];

/// Map an FTP reply to an error kind
///
/// Codes alone are ambiguous: 550 covers "not found", "exists" and
/// "permission denied" depending on the server, so the reply text decides.
pub fn classify_reply(code: u16, text: &str) -> RemoteErrorKind {
    let lower = text.to_lowercase();
    let mentions = |phrases: &[&str]| phrases.iter().any(|p| lower.contains(p));

    match code {
        521 => RemoteErrorKind::AlreadyExists,
        530 | 332 => RemoteErrorKind::NotLoggedIn,
        532 => RemoteErrorKind::PermissionDenied,
        450 | 550 | 553 => {
            if lower.contains("exist") && !mentions(NEGATED_EXISTS_PHRASES) {
                RemoteErrorKind::AlreadyExists
            } else if mentions(PERMISSION_PHRASES) {
                RemoteErrorKind::PermissionDenied
            } else if code == 550 || mentions(NOT_FOUND_PHRASES) {
                RemoteErrorKind::NotFound
            } else {
                RemoteErrorKind::Protocol
            }
        }
        421 | 425 | 426 => RemoteErrorKind::Connection,
        _ => RemoteErrorKind::Protocol,
    }
}

fn from_ftp_error(err: FtpError) -> RemoteError {
    match err {
        FtpError::ConnectionError(e) => RemoteError::new(RemoteErrorKind::Connection, e.to_string()),
        FtpError::UnexpectedResponse(response) => {
            let text = String::from_utf8_lossy(&response.body).trim().to_string();
            match u16::try_from(response.status.code()) {
                Ok(code) => RemoteError::new(classify_reply(code, &text), text).with_code(code),
                Err(_) => RemoteError::new(RemoteErrorKind::Protocol, text),
            }
        }
        other => RemoteError::new(RemoteErrorKind::Protocol, other.to_string()),
    }
}

/// Connects to FTP servers in plain (non-TLS) mode
#[derive(Debug, Clone)]
pub struct FtpTransport {
    timeout: Duration,
}

impl FtpTransport {
    /// `timeout` bounds the connect and every subsequent socket read/write
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl Transport for FtpTransport {
    type Session = FtpSession;

    fn connect(&self, address: &str) -> Result<FtpSession, RemoteError> {
        let socket_addr = address
            .to_socket_addrs()
            .map_err(|e| {
                RemoteError::new(
                    RemoteErrorKind::Connection,
                    format!("cannot resolve {}: {}", address, e),
                )
            })?
            .next()
            .ok_or_else(|| {
                RemoteError::new(
                    RemoteErrorKind::Connection,
                    format!("{} resolved to no addresses", address),
                )
            })?;

        debug!(%socket_addr, "Opening control connection");
        let stream = FtpStream::connect_timeout(socket_addr, self.timeout).map_err(from_ftp_error)?;

        let socket = stream.get_ref();
        socket
            .set_read_timeout(Some(self.timeout))
            .and_then(|()| socket.set_write_timeout(Some(self.timeout)))
            .map_err(|e| RemoteError::new(RemoteErrorKind::Connection, e.to_string()))?;

        Ok(FtpSession { stream })
    }
}

/// Live FTP control connection
pub struct FtpSession {
    stream: FtpStream,
}

impl RemoteSession for FtpSession {
    fn login(&mut self, username: &str, password: &str) -> Result<(), RemoteError> {
        self.stream.login(username, password).map_err(from_ftp_error)?;
        // TYPE I once for the whole session
        self.stream
            .transfer_type(FileType::Binary)
            .map_err(from_ftp_error)
    }

    fn change_dir(&mut self, path: &RemotePath) -> Result<(), RemoteError> {
        self.stream.cwd(path.as_str()).map_err(from_ftp_error)
    }

    fn make_dir(&mut self, path: &RemotePath) -> Result<(), RemoteError> {
        self.stream.mkdir(path.as_str()).map_err(from_ftp_error)
    }

    fn upload(&mut self, path: &RemotePath, mut reader: &mut dyn Read) -> Result<u64, RemoteError> {
        self.stream
            .put_file(path.as_str(), &mut reader)
            .map_err(from_ftp_error)
    }

    fn quit(&mut self) -> Result<(), RemoteError> {
        self.stream.quit().map_err(from_ftp_error)
    }
}
