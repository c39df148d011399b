//! Per-owner connection state

use std::any::Any;
use std::sync::{mpsc, Arc};

use crate::binder::ConnectionSignal;

/// Identifier of one binding to the playback service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TokenId(u64);

impl TokenId {
    pub(crate) fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the raw ID value
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for TokenId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "token-{}", self.0)
    }
}

/// Proof of an active binding to the playback service
///
/// Not `Clone`: a token is consumed when the binding is released, so it can
/// never be used again afterwards.
#[derive(Debug, PartialEq, Eq)]
pub struct ConnectionToken {
    id: TokenId,
}

impl ConnectionToken {
    pub(crate) fn new(id: TokenId) -> Self {
        Self { id }
    }

    pub fn id(&self) -> TokenId {
        self.id
    }
}

/// Type-erased handle to the bound playback service
#[derive(Clone)]
pub struct ServiceHandle {
    inner: Arc<dyn Any + Send + Sync>,
}

impl ServiceHandle {
    pub fn new<T: Any + Send + Sync>(service: T) -> Self {
        Self {
            inner: Arc::new(service),
        }
    }

    /// Wrap an already shared service
    pub fn from_arc<T: Any + Send + Sync>(service: Arc<T>) -> Self {
        Self { inner: service }
    }

    /// Access the service as a concrete type
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.inner.downcast_ref::<T>()
    }

    /// Whether two handles refer to the same service instance
    pub fn ptr_eq(&self, other: &ServiceHandle) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl std::fmt::Debug for ServiceHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceHandle").finish_non_exhaustive()
    }
}

/// Connection state owned by a single owner
///
/// Holds the owner's token, the live service handle (absent until the binder
/// reports `Connected`, and again after `Disconnected` or release), and the
/// queue of signals the binder has sent.
#[derive(Debug, Default)]
pub struct ServiceConnection {
    pub(crate) token: Option<ConnectionToken>,
    pub(crate) service: Option<ServiceHandle>,
    pub(crate) signals: Option<mpsc::Receiver<ConnectionSignal>>,
}

impl ServiceConnection {
    pub fn new() -> Self {
        Self::default()
    }

    /// The id of the held token, if any
    pub fn token(&self) -> Option<TokenId> {
        self.token.as_ref().map(ConnectionToken::id)
    }

    /// Whether a binding has been requested and not yet released
    pub fn is_bound(&self) -> bool {
        self.token.is_some()
    }

    /// Whether the service has reported itself connected
    pub fn is_connected(&self) -> bool {
        self.service.is_some()
    }

    /// The live service, if connected
    pub fn service(&self) -> Option<&ServiceHandle> {
        self.service.as_ref()
    }

    /// Apply every signal the binder has sent since the last poll
    ///
    /// `Connected` stores the service handle and `Disconnected` clears it.
    /// The applied signals are returned so the owner can react to them.
    pub fn poll_signals(&mut self) -> Vec<ConnectionSignal> {
        let Some(rx) = self.signals.as_ref() else {
            return Vec::new();
        };

        let signals: Vec<ConnectionSignal> = rx.try_iter().collect();
        for signal in &signals {
            match signal {
                ConnectionSignal::Connected(handle) => {
                    tracing::debug!("Playback service connected on {:?}", self.token());
                    self.service = Some(handle.clone());
                }
                ConnectionSignal::Disconnected => {
                    tracing::debug!("Playback service disconnected on {:?}", self.token());
                    self.service = None;
                }
            }
        }
        signals
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_connection_is_idle() {
        let mut connection = ServiceConnection::new();
        assert!(!connection.is_bound());
        assert!(!connection.is_connected());
        assert!(connection.token().is_none());
        assert!(connection.poll_signals().is_empty());
    }

    #[test]
    fn test_poll_applies_signals_in_order() {
        let (tx, rx) = mpsc::channel();
        let mut connection = ServiceConnection {
            token: Some(ConnectionToken::new(TokenId::new(7))),
            service: None,
            signals: Some(rx),
        };

        tx.send(ConnectionSignal::Connected(ServiceHandle::new(42u32))).unwrap();
        let signals = connection.poll_signals();
        assert_eq!(signals.len(), 1);
        assert_eq!(
            connection.service().and_then(|s| s.downcast_ref::<u32>()),
            Some(&42)
        );

        tx.send(ConnectionSignal::Disconnected).unwrap();
        tx.send(ConnectionSignal::Connected(ServiceHandle::new(43u32))).unwrap();
        let signals = connection.poll_signals();
        assert_eq!(signals.len(), 2);
        assert!(connection.is_connected());
        assert_eq!(
            connection.service().and_then(|s| s.downcast_ref::<u32>()),
            Some(&43)
        );
    }

    #[test]
    fn test_handle_identity() {
        let shared = Arc::new(String::from("player"));
        let a = ServiceHandle::from_arc(Arc::clone(&shared));
        let b = a.clone();
        let c = ServiceHandle::new(String::from("player"));

        assert!(a.ptr_eq(&b));
        assert!(!a.ptr_eq(&c));
        assert!(a.downcast_ref::<u32>().is_none());
    }

    #[test]
    fn test_token_display() {
        assert_eq!(TokenId::new(3).to_string(), "token-3");
    }
}
