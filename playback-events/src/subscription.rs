//! The receiving end of a channel subscription

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc, Weak};

use crate::channel::{ChannelInner, Envelope};
use crate::event::EventFilter;
use crate::liveness::{LivenessTable, OwnerId};

/// Unique identifier for a subscription
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    pub(crate) fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the raw ID value
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

/// A live subscription to an [`EventChannel`](crate::EventChannel)
///
/// Events queue up here until the owner drains them with [`try_next`] or
/// [`pending`]. Nothing is handed out once the subscription is cancelled or
/// its owner has been released. Dropping the subscription detaches it from
/// the channel.
///
/// [`try_next`]: Subscription::try_next
/// [`pending`]: Subscription::pending
pub struct Subscription {
    id: SubscriptionId,
    owner: OwnerId,
    filter: EventFilter,
    rx: mpsc::Receiver<Envelope>,
    active: Arc<AtomicBool>,
    liveness: LivenessTable,
    channel: Weak<ChannelInner>,
}

impl Subscription {
    pub(crate) fn new(
        id: SubscriptionId,
        owner: OwnerId,
        filter: EventFilter,
        rx: mpsc::Receiver<Envelope>,
        active: Arc<AtomicBool>,
        liveness: LivenessTable,
        channel: Weak<ChannelInner>,
    ) -> Self {
        Self {
            id,
            owner,
            filter,
            rx,
            active,
            liveness,
            channel,
        }
    }

    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    pub fn owner(&self) -> OwnerId {
        self.owner
    }

    pub fn filter(&self) -> &EventFilter {
        &self.filter
    }

    /// Whether this subscription can still hand out events
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    /// Take the next queued event without blocking
    ///
    /// Returns `None` when the queue is empty, the subscription has been
    /// cancelled, or the owner has been released.
    pub fn try_next(&self) -> Option<Envelope> {
        if !self.is_active() {
            return None;
        }
        if !self.liveness.is_alive(self.owner) {
            if self.deactivate() {
                tracing::trace!("{} released, discarding queued events for {}", self.owner, self.id);
            }
            return None;
        }
        self.rx.try_recv().ok()
    }

    /// Non-blocking iterator over currently queued events
    pub fn pending(&self) -> PendingEvents<'_> {
        PendingEvents { inner: self }
    }

    /// Returns whether the subscription was active before this call
    pub(crate) fn deactivate(&self) -> bool {
        self.active.swap(false, Ordering::AcqRel)
    }

    pub(crate) fn belongs_to(&self, channel: &Arc<ChannelInner>) -> bool {
        std::ptr::eq(self.channel.as_ptr(), Arc::as_ptr(channel))
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(channel) = self.channel.upgrade() {
            if channel.detach(self.id) {
                tracing::trace!("{} dropped, detached from channel", self.id);
            }
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("owner", &self.owner)
            .field("filter", &self.filter)
            .field("active", &self.is_active())
            .finish()
    }
}

/// Non-blocking iterator over the events queued on a [`Subscription`]
pub struct PendingEvents<'a> {
    inner: &'a Subscription,
}

impl<'a> Iterator for PendingEvents<'a> {
    type Item = Envelope;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.try_next()
    }
}
