//! The seam to the playback service transport

use std::collections::HashSet;
use std::sync::mpsc;

use parking_lot::Mutex;

use crate::connection::{ServiceHandle, TokenId};
use crate::error::{ConnectorError, Result};

/// Asynchronous notification from the binder to the connection owner
#[derive(Debug, Clone)]
pub enum ConnectionSignal {
    /// The service is bound and ready
    Connected(ServiceHandle),
    /// The service went away; the binding itself is still held
    Disconnected,
}

/// Return path from a binder to the owner of one binding
///
/// Signals are queued and applied when the owner polls its
/// [`ServiceConnection`](crate::ServiceConnection), so the binder may report
/// from any thread.
#[derive(Debug, Clone)]
pub struct ConnectionLink {
    token: TokenId,
    tx: mpsc::Sender<ConnectionSignal>,
}

impl ConnectionLink {
    pub(crate) fn new(token: TokenId, tx: mpsc::Sender<ConnectionSignal>) -> Self {
        Self { token, tx }
    }

    /// The binding this link reports for
    pub fn token(&self) -> TokenId {
        self.token
    }

    /// Report that the service is connected
    ///
    /// Returns `false` if the owner has already released the binding.
    pub fn connected(&self, service: ServiceHandle) -> bool {
        self.send(ConnectionSignal::Connected(service))
    }

    /// Report that the service went away
    pub fn disconnected(&self) -> bool {
        self.send(ConnectionSignal::Disconnected)
    }

    fn send(&self, signal: ConnectionSignal) -> bool {
        if self.tx.send(signal).is_err() {
            tracing::trace!("{} released before signal could be delivered", self.token);
            return false;
        }
        true
    }
}

/// Transport used to reach the playback service
///
/// `bind` only starts the binding; the outcome is reported later through the
/// link. A binder that never reports leaves the connection pending.
pub trait ServiceBinder: Send + Sync {
    /// Start binding for `token`
    fn bind(&self, token: TokenId, link: ConnectionLink) -> Result<()>;

    /// Release the binding for `token`
    fn unbind(&self, token: TokenId) -> Result<()>;
}

/// In-process binder that connects immediately to a fixed service
///
/// Useful when the service lives in the same process, and in tests.
pub struct LocalBinder {
    service: ServiceHandle,
    bound: Mutex<HashSet<TokenId>>,
}

impl LocalBinder {
    pub fn new(service: ServiceHandle) -> Self {
        Self {
            service,
            bound: Mutex::new(HashSet::new()),
        }
    }

    /// Number of bindings currently held
    pub fn bound_count(&self) -> usize {
        self.bound.lock().len()
    }

    pub fn is_bound(&self, token: TokenId) -> bool {
        self.bound.lock().contains(&token)
    }
}

impl ServiceBinder for LocalBinder {
    fn bind(&self, token: TokenId, link: ConnectionLink) -> Result<()> {
        if !self.bound.lock().insert(token) {
            return Err(ConnectorError::Bind(format!("{} is already bound", token)));
        }
        link.connected(self.service.clone());
        Ok(())
    }

    fn unbind(&self, token: TokenId) -> Result<()> {
        if !self.bound.lock().remove(&token) {
            return Err(ConnectorError::Unbind {
                token,
                reason: "not bound".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_link_reports_to_receiver() {
        let (tx, rx) = mpsc::channel();
        let link = ConnectionLink::new(TokenId::new(1), tx);

        assert!(link.connected(ServiceHandle::new(())));
        assert!(link.disconnected());

        let signals: Vec<_> = rx.try_iter().collect();
        assert!(matches!(signals[0], ConnectionSignal::Connected(_)));
        assert!(matches!(signals[1], ConnectionSignal::Disconnected));
    }

    #[test]
    fn test_link_after_release() {
        let (tx, rx) = mpsc::channel();
        let link = ConnectionLink::new(TokenId::new(1), tx);
        drop(rx);

        assert!(!link.connected(ServiceHandle::new(())));
    }

    #[test]
    fn test_local_binder_bind_unbind() {
        let binder = LocalBinder::new(ServiceHandle::new("player"));
        let (tx, rx) = mpsc::channel();
        let token = TokenId::new(5);

        binder.bind(token, ConnectionLink::new(token, tx.clone())).unwrap();
        assert!(binder.is_bound(token));
        assert_eq!(rx.try_iter().count(), 1);

        // Binding the same token twice is refused
        assert!(binder.bind(token, ConnectionLink::new(token, tx)).is_err());

        binder.unbind(token).unwrap();
        assert_eq!(binder.bound_count(), 0);
        assert!(matches!(
            binder.unbind(token),
            Err(ConnectorError::Unbind { .. })
        ));
    }
}
