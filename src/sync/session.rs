//! Session lifetime guard

use crate::remote::RemoteSession;
use std::ops::{Deref, DerefMut};
use tracing::{info, warn};

/// Owns a remote session and quits it exactly once
///
/// Quitting happens on [`close`](ScopedSession::close) or, failing that, on
/// drop (early return or panic). A failed quit is logged and never turns
/// into a run error.
pub struct ScopedSession<S: RemoteSession> {
    inner: Option<S>,
}

impl<S: RemoteSession> ScopedSession<S> {
    pub fn new(session: S) -> Self {
        Self {
            inner: Some(session),
        }
    }

    pub fn close(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if let Some(mut session) = self.inner.take() {
            match session.quit() {
                Ok(()) => info!("Disconnected from FTP server"),
                Err(e) => warn!(error = %e, "Disconnect failed"),
            }
        }
    }
}

impl<S: RemoteSession> Deref for ScopedSession<S> {
    type Target = S;

    fn deref(&self) -> &S {
        self.inner
            .as_ref()
            .unwrap_or_else(|| unreachable!("session used after close"))
    }
}

impl<S: RemoteSession> DerefMut for ScopedSession<S> {
    fn deref_mut(&mut self) -> &mut S {
        self.inner
            .as_mut()
            .unwrap_or_else(|| unreachable!("session used after close"))
    }
}

impl<S: RemoteSession> Drop for ScopedSession<S> {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::{MemoryTransport, RemoteOp, Transport};

    fn quit_count(transport: &MemoryTransport) -> usize {
        transport
            .snapshot()
            .ops
            .iter()
            .filter(|op| **op == RemoteOp::Quit)
            .count()
    }

    #[test]
    fn test_close_quits_once() {
        let transport = MemoryTransport::new();
        let session = ScopedSession::new(transport.connect("memory:21").expect("connect"));
        session.close();
        assert_eq!(quit_count(&transport), 1);
    }

    #[test]
    fn test_drop_quits() {
        let transport = MemoryTransport::new();
        {
            let _session = ScopedSession::new(transport.connect("memory:21").expect("connect"));
        }
        assert_eq!(quit_count(&transport), 1);
    }

    #[test]
    fn test_panic_still_quits() {
        let transport = MemoryTransport::new();
        let session = transport.connect("memory:21").expect("connect");
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _guard = ScopedSession::new(session);
            panic!("fault mid-run");
        }));
        assert!(result.is_err());
        assert_eq!(quit_count(&transport), 1);
    }
}
