use thiserror::Error;

use crate::liveness::OwnerId;
use crate::subscription::SubscriptionId;

/// Errors that can occur on the event channel
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChannelError {
    /// The channel has been shut down
    #[error("Event channel has been closed")]
    Closed,

    /// The owner was released before it subscribed
    #[error("Owner {0} has already been released")]
    OwnerReleased(OwnerId),

    /// Invalid channel configuration
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The subscription was created by a different channel
    #[error("Subscription {0} does not belong to this channel")]
    ForeignSubscription(SubscriptionId),
}

/// Result type for event channel operations
pub type Result<T> = std::result::Result<T, ChannelError>;
