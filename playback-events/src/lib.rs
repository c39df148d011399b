//! # Playback Events
//!
//! The process-wide channel that carries playback-state notifications from the
//! playback service to whichever host surfaces are currently listening.
//!
//! ## Overview
//!
//! - **Closed event set**: [`PlaybackEvent`] has exactly five variants, matched
//!   exhaustively by consumers
//! - **Filtered subscriptions**: each [`Subscription`] names the [`EventKind`]s it wants
//! - **FIFO per subscriber**: events reach a subscriber in emission order
//! - **Owner-aware delivery**: subscriptions reference their owner by [`OwnerId`]
//!   and a shared [`LivenessTable`], never by a strong reference
//!
//! ## Usage
//!
//! ```rust
//! use playback_events::{EventChannel, EventFilter, PlaybackEvent};
//!
//! let channel = EventChannel::new();
//! let owner = channel.register_owner();
//! let subscription = channel.subscribe(owner, EventFilter::all()).unwrap();
//!
//! channel.publish(PlaybackEvent::MetaChanged);
//!
//! let envelope = subscription.try_next().unwrap();
//! assert_eq!(envelope.event, PlaybackEvent::MetaChanged);
//! assert_eq!(envelope.owner, owner);
//! ```
//!
//! Delivery is pull-based: the subscriber drains its queue on its own thread,
//! which is how events get marshalled off the publisher's execution context.

pub mod channel;
pub mod error;
pub mod event;
pub mod liveness;
pub mod subscription;

pub use channel::{ChannelConfig, Envelope, EventChannel};
pub use error::{ChannelError, Result};
pub use event::{EventFilter, EventKind, PlaybackEvent};
pub use liveness::{LivenessTable, OwnerId};
pub use subscription::{PendingEvents, Subscription, SubscriptionId};

/// Commonly used types for convenient importing
pub mod prelude {
    pub use crate::{
        ChannelConfig, ChannelError, Envelope, EventChannel, EventFilter, EventKind, OwnerId,
        PlaybackEvent, Subscription,
    };
}
