//! The process-wide event channel
//!
//! Any component may publish; each subscriber owns its own bounded queue and
//! drains it on its own thread. Publication is serialized so every subscriber
//! sees events in emission order.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{mpsc, Arc};

use parking_lot::Mutex;

use crate::error::{ChannelError, Result};
use crate::event::{EventFilter, PlaybackEvent};
use crate::liveness::{LivenessTable, OwnerId};
use crate::subscription::{Subscription, SubscriptionId};

/// Configuration for the [`EventChannel`]
#[derive(Debug, Clone)]
pub struct ChannelConfig {
    /// Maximum number of undelivered events queued per subscriber
    /// Default: 256
    pub subscriber_buffer: usize,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            subscriber_buffer: 256,
        }
    }
}

impl ChannelConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_subscriber_buffer(mut self, size: usize) -> Self {
        self.subscriber_buffer = size;
        self
    }

    /// Validate the configuration and return any issues
    pub fn validate(&self) -> Result<()> {
        if self.subscriber_buffer == 0 {
            return Err(ChannelError::Configuration(
                "Subscriber buffer must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

/// One delivery to one subscriber
///
/// Carries the id of the owner it is addressed to rather than the owner itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    /// Owner the event is addressed to
    pub owner: OwnerId,
    /// Channel-wide emission sequence number
    pub sequence: u64,
    pub event: PlaybackEvent,
}

struct Subscriber {
    id: SubscriptionId,
    owner: OwnerId,
    filter: EventFilter,
    tx: mpsc::SyncSender<Envelope>,
    active: Arc<AtomicBool>,
}

pub(crate) struct ChannelInner {
    config: ChannelConfig,
    subscribers: Mutex<Vec<Subscriber>>,
    liveness: LivenessTable,
    next_subscription: AtomicU64,
    next_sequence: AtomicU64,
    closed: AtomicBool,
}

impl ChannelInner {
    /// Remove a subscriber, returning whether it was still attached
    pub(crate) fn detach(&self, id: SubscriptionId) -> bool {
        let mut subscribers = self.subscribers.lock();
        let before = subscribers.len();
        subscribers.retain(|s| s.id != id);
        before != subscribers.len()
    }
}

/// Publish/subscribe channel for playback events
///
/// Cloning is cheap and every clone refers to the same channel. The channel
/// has no owner; it lives as long as any clone or subscription refers to it.
///
/// # Example
///
/// ```rust
/// use playback_events::{EventChannel, EventFilter, EventKind, PlaybackEvent};
///
/// let channel = EventChannel::new();
/// let owner = channel.register_owner();
/// let meta_only = EventFilter::none().with(EventKind::MetaChanged);
/// let subscription = channel.subscribe(owner, meta_only).unwrap();
///
/// assert_eq!(channel.publish(PlaybackEvent::PlaylistChanged), 0);
/// assert_eq!(channel.publish(PlaybackEvent::MetaChanged), 1);
/// assert_eq!(subscription.pending().count(), 1);
/// ```
#[derive(Clone)]
pub struct EventChannel {
    inner: Arc<ChannelInner>,
}

impl EventChannel {
    /// Create a channel with the default configuration
    pub fn new() -> Self {
        Self::build(ChannelConfig::default())
    }

    /// Create a channel with a custom configuration
    pub fn with_config(config: ChannelConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: ChannelConfig) -> Self {
        Self {
            inner: Arc::new(ChannelInner {
                config,
                subscribers: Mutex::new(Vec::new()),
                liveness: LivenessTable::new(),
                next_subscription: AtomicU64::new(1),
                next_sequence: AtomicU64::new(0),
                closed: AtomicBool::new(false),
            }),
        }
    }

    /// The liveness table consulted on every delivery
    pub fn liveness(&self) -> &LivenessTable {
        &self.inner.liveness
    }

    /// Register a new owner with this channel's liveness table
    pub fn register_owner(&self) -> OwnerId {
        self.inner.liveness.register()
    }

    /// Mark an owner as gone
    ///
    /// Events already queued for its subscriptions will not be handed out.
    pub fn release_owner(&self, owner: OwnerId) -> bool {
        self.inner.liveness.release(owner)
    }

    /// Subscribe `owner` to the kinds in `filter`
    pub fn subscribe(&self, owner: OwnerId, filter: EventFilter) -> Result<Subscription> {
        if self.is_closed() {
            return Err(ChannelError::Closed);
        }
        if !self.inner.liveness.is_alive(owner) {
            return Err(ChannelError::OwnerReleased(owner));
        }

        let id = SubscriptionId::new(self.inner.next_subscription.fetch_add(1, Ordering::Relaxed));
        let (tx, rx) = mpsc::sync_channel(self.inner.config.subscriber_buffer);
        let active = Arc::new(AtomicBool::new(true));

        self.inner.subscribers.lock().push(Subscriber {
            id,
            owner,
            filter: filter.clone(),
            tx,
            active: Arc::clone(&active),
        });

        tracing::debug!("{} subscribed {} to {} event kinds", owner, id, filter.len());

        Ok(Subscription::new(
            id,
            owner,
            filter,
            rx,
            active,
            self.inner.liveness.clone(),
            Arc::downgrade(&self.inner),
        ))
    }

    /// Cancel a subscription
    ///
    /// Idempotent: returns `Ok(false)` if it was already cancelled. Once this
    /// returns, the subscription hands out no further events, including ones
    /// already queued. The subscription is deactivated even when an error is
    /// returned.
    pub fn unsubscribe(&self, subscription: &Subscription) -> Result<bool> {
        if !subscription.belongs_to(&self.inner) {
            return Err(ChannelError::ForeignSubscription(subscription.id()));
        }

        let was_active = subscription.deactivate();
        if self.is_closed() {
            return Err(ChannelError::Closed);
        }

        let detached = self.inner.detach(subscription.id());
        if was_active {
            tracing::debug!("{} unsubscribed {}", subscription.owner(), subscription.id());
        }
        Ok(was_active || detached)
    }

    /// Publish an event to every matching subscriber
    ///
    /// Returns the number of subscribers the event was queued for. Subscribers
    /// whose owner has been released are skipped and pruned.
    pub fn publish(&self, event: PlaybackEvent) -> usize {
        if self.is_closed() {
            tracing::trace!("Dropping {} published on closed channel", event);
            return 0;
        }

        let kind = event.kind();
        let mut subscribers = self.inner.subscribers.lock();
        let sequence = self.inner.next_sequence.fetch_add(1, Ordering::Relaxed);
        let mut delivered = 0;

        subscribers.retain(|subscriber| {
            if !subscriber.active.load(Ordering::Acquire) {
                return false;
            }
            if !self.inner.liveness.is_alive(subscriber.owner) {
                tracing::trace!(
                    "Skipping {} for released {}, pruning {}",
                    event,
                    subscriber.owner,
                    subscriber.id
                );
                return false;
            }
            if !subscriber.filter.matches(kind) {
                return true;
            }

            let envelope = Envelope {
                owner: subscriber.owner,
                sequence,
                event: event.clone(),
            };
            match subscriber.tx.try_send(envelope) {
                Ok(()) => {
                    delivered += 1;
                    true
                }
                Err(mpsc::TrySendError::Full(_)) => {
                    tracing::warn!(
                        "Queue for {} is full ({} events), dropping {}",
                        subscriber.id,
                        self.inner.config.subscriber_buffer,
                        event
                    );
                    true
                }
                Err(mpsc::TrySendError::Disconnected(_)) => false,
            }
        });

        tracing::trace!("Published {} (seq {}) to {} subscribers", event, sequence, delivered);
        delivered
    }

    /// Number of attached subscriptions
    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers.lock().len()
    }

    /// Close the channel
    ///
    /// All subscriptions are deactivated; further publishes are dropped and
    /// further subscribe/unsubscribe calls fail with [`ChannelError::Closed`].
    pub fn shutdown(&self) {
        if self.inner.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        let mut subscribers = self.inner.subscribers.lock();
        for subscriber in subscribers.iter() {
            subscriber.active.store(false, Ordering::Release);
        }
        tracing::debug!("Event channel shut down with {} subscriptions", subscribers.len());
        subscribers.clear();
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::Acquire)
    }
}

impl Default for EventChannel {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EventChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventChannel")
            .field("subscribers", &self.subscriber_count())
            .field("owners", &self.inner.liveness.len())
            .field("closed", &self.is_closed())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::EventKind;

    #[test]
    fn test_default_config() {
        let config = ChannelConfig::default();
        assert_eq!(config.subscriber_buffer, 256);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let config = ChannelConfig::new().with_subscriber_buffer(0);
        assert!(matches!(
            config.validate(),
            Err(ChannelError::Configuration(_))
        ));
        assert!(EventChannel::with_config(config).is_err());
    }

    #[test]
    fn test_publish_without_subscribers() {
        let channel = EventChannel::new();
        assert_eq!(channel.publish(PlaybackEvent::MetaChanged), 0);
    }

    #[test]
    fn test_filter_applies() {
        let channel = EventChannel::new();
        let owner = channel.register_owner();
        let sub = channel
            .subscribe(owner, EventFilter::none().with(EventKind::PlaylistChanged))
            .unwrap();

        assert_eq!(channel.publish(PlaybackEvent::MetaChanged), 0);
        assert_eq!(channel.publish(PlaybackEvent::PlaylistChanged), 1);

        let envelope = sub.try_next().unwrap();
        assert_eq!(envelope.event, PlaybackEvent::PlaylistChanged);
        assert!(sub.try_next().is_none());
    }

    #[test]
    fn test_subscribe_released_owner_fails() {
        let channel = EventChannel::new();
        let owner = channel.register_owner();
        channel.release_owner(owner);

        let result = channel.subscribe(owner, EventFilter::all());
        assert_eq!(result.err(), Some(ChannelError::OwnerReleased(owner)));
    }

    #[test]
    fn test_released_owner_is_pruned_on_publish() {
        let channel = EventChannel::new();
        let owner = channel.register_owner();
        let _sub = channel.subscribe(owner, EventFilter::all()).unwrap();
        assert_eq!(channel.subscriber_count(), 1);

        channel.release_owner(owner);
        assert_eq!(channel.publish(PlaybackEvent::MetaChanged), 0);
        assert_eq!(channel.subscriber_count(), 0);
    }

    #[test]
    fn test_full_queue_drops_event() {
        let channel = EventChannel::with_config(ChannelConfig::new().with_subscriber_buffer(1)).unwrap();
        let owner = channel.register_owner();
        let sub = channel.subscribe(owner, EventFilter::all()).unwrap();

        assert_eq!(channel.publish(PlaybackEvent::MetaChanged), 1);
        assert_eq!(channel.publish(PlaybackEvent::PlaylistChanged), 0);

        // Subscription survives and keeps the first event
        assert_eq!(channel.subscriber_count(), 1);
        assert_eq!(sub.try_next().unwrap().event, PlaybackEvent::MetaChanged);
        assert!(sub.try_next().is_none());
    }

    #[test]
    fn test_shutdown() {
        let channel = EventChannel::new();
        let owner = channel.register_owner();
        let sub = channel.subscribe(owner, EventFilter::all()).unwrap();

        channel.shutdown();
        assert!(channel.is_closed());
        assert!(!sub.is_active());
        assert_eq!(channel.publish(PlaybackEvent::MetaChanged), 0);
        assert_eq!(channel.unsubscribe(&sub), Err(ChannelError::Closed));
        assert!(matches!(
            channel.subscribe(owner, EventFilter::all()),
            Err(ChannelError::Closed)
        ));

        // Idempotent
        channel.shutdown();
    }

    #[test]
    fn test_foreign_subscription_rejected() {
        let first = EventChannel::new();
        let second = EventChannel::new();
        let owner = first.register_owner();
        let sub = first.subscribe(owner, EventFilter::all()).unwrap();

        assert_eq!(
            second.unsubscribe(&sub),
            Err(ChannelError::ForeignSubscription(sub.id()))
        );
        assert!(sub.is_active());
    }
}
