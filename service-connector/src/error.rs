use thiserror::Error;

use crate::connection::TokenId;

/// Errors that can occur while binding to the playback service
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConnectorError {
    /// `connect` was called while the owner already holds a token
    #[error("Connection already established with {0}")]
    AlreadyConnected(TokenId),

    /// The binder refused to bind
    #[error("Failed to bind playback service: {0}")]
    Bind(String),

    /// The binder failed to release a binding
    #[error("Failed to unbind {token}: {reason}")]
    Unbind { token: TokenId, reason: String },
}

/// Result type for connector operations
pub type Result<T> = std::result::Result<T, ConnectorError>;
