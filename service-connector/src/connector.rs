//! Connect/disconnect against a [`ServiceBinder`]

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{mpsc, Arc};

use crate::binder::{ConnectionLink, ServiceBinder};
use crate::connection::{ConnectionToken, ServiceConnection, TokenId};
use crate::error::{ConnectorError, Result};

/// Establishes and releases bindings to the playback service
///
/// The connector holds no per-owner state: every call operates on the
/// [`ServiceConnection`] the owner passes in.
pub struct ServiceConnector {
    binder: Arc<dyn ServiceBinder>,
    next_token: AtomicU64,
}

impl ServiceConnector {
    pub fn new(binder: Arc<dyn ServiceBinder>) -> Self {
        Self {
            binder,
            next_token: AtomicU64::new(1),
        }
    }

    /// Bind `connection` to the playback service
    ///
    /// On success the connection holds a fresh token and waits for the
    /// binder's `Connected` signal. Calling this while the connection already
    /// holds a token is a programming error and fails with
    /// [`ConnectorError::AlreadyConnected`].
    pub fn connect(&self, connection: &mut ServiceConnection) -> Result<TokenId> {
        if let Some(existing) = connection.token() {
            return Err(ConnectorError::AlreadyConnected(existing));
        }

        let token = TokenId::new(self.next_token.fetch_add(1, Ordering::Relaxed));
        let (tx, rx) = mpsc::channel();

        // Install the receiver first so a binder that reports synchronously
        // is not lost
        connection.signals = Some(rx);
        if let Err(e) = self.binder.bind(token, ConnectionLink::new(token, tx)) {
            connection.signals = None;
            return Err(e);
        }

        connection.token = Some(ConnectionToken::new(token));
        connection.service = None;
        tracing::debug!("Requested playback service binding {}", token);
        Ok(token)
    }

    /// Release the binding held by `connection`
    ///
    /// A connection without a token is left alone and `Ok(false)` returned.
    /// Otherwise the connection is reset to "absent" before the binder is asked
    /// to unbind, so a binder failure never leaves stale state behind.
    pub fn disconnect(&self, connection: &mut ServiceConnection) -> Result<bool> {
        let Some(token) = connection.token.take() else {
            return Ok(false);
        };

        connection.service = None;
        connection.signals = None;

        let id = token.id();
        drop(token);
        self.binder.unbind(id)?;

        tracing::debug!("Released playback service binding {}", id);
        Ok(true)
    }
}

impl std::fmt::Debug for ServiceConnector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceConnector")
            .field("next_token", &self.next_token.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}
