//! Error types for playback-surface

use playback_events::ChannelError;
use service_connector::ConnectorError;
use thiserror::Error;

use crate::lifecycle::Phase;

/// Errors returned by host surface operations
#[derive(Error, Debug)]
pub enum SurfaceError {
    /// Structural misuse by the caller, such as a surface observing itself
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    /// The requested lifecycle transition is not allowed
    #[error("Invalid lifecycle transition from {from} to {to}")]
    InvalidTransition { from: Phase, to: Phase },

    /// The surface has been destroyed
    #[error("Host surface has been destroyed")]
    Destroyed,

    /// Error from the event channel
    #[error("Event channel error: {0}")]
    Channel(#[from] ChannelError),

    /// Error from the service connector
    #[error("Service connector error: {0}")]
    Connector(#[from] ConnectorError),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),
}

/// A failure swallowed during teardown
///
/// Teardown always runs to completion; these are collected in a
/// [`TeardownReport`](crate::TeardownReport) and logged, never returned as errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TeardownFault {
    #[error("Failed to release event subscription: {0}")]
    Unsubscribe(ChannelError),

    #[error("Failed to release playback service binding: {0}")]
    Disconnect(ConnectorError),
}

/// Result type for playback-surface operations
pub type Result<T> = std::result::Result<T, SurfaceError>;
