//! Weakly-held delivery target handed to event sources

use std::sync::Weak;

use playback_events::{Envelope, LivenessTable, OwnerId, PlaybackEvent};

use crate::surface::HostSurface;

/// What happened to one delivery attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// The surface handled the event
    Dispatched,
    /// The surface no longer exists or has been destroyed; nothing ran
    OwnerAbsent,
    /// The envelope was addressed to a different owner
    Misaddressed,
}

/// Delivery target for one [`HostSurface`]
///
/// Holds the surface's owner id and a `Weak` reference, never a strong one.
/// The liveness table is consulted before the surface is touched, so a
/// receiver outliving its surface is harmless.
#[derive(Clone)]
pub struct StatusReceiver {
    owner: OwnerId,
    surface: Weak<HostSurface>,
    liveness: LivenessTable,
}

impl StatusReceiver {
    pub(crate) fn new(owner: OwnerId, surface: Weak<HostSurface>, liveness: LivenessTable) -> Self {
        Self {
            owner,
            surface,
            liveness,
        }
    }

    pub fn owner(&self) -> OwnerId {
        self.owner
    }

    /// Whether the target surface is still alive
    pub fn is_live(&self) -> bool {
        self.liveness.is_alive(self.owner) && self.surface.strong_count() > 0
    }

    /// Hand `event` to the surface if it is still alive
    ///
    /// Must be called on the surface's callback thread.
    pub fn deliver(&self, event: &PlaybackEvent) -> DeliveryOutcome {
        if !self.liveness.is_alive(self.owner) {
            tracing::trace!("{} released, dropping {}", self.owner, event);
            return DeliveryOutcome::OwnerAbsent;
        }
        let Some(surface) = self.surface.upgrade() else {
            tracing::trace!("Surface for {} is gone, dropping {}", self.owner, event);
            return DeliveryOutcome::OwnerAbsent;
        };

        match surface.dispatch(event) {
            Ok(()) => DeliveryOutcome::Dispatched,
            Err(_) => DeliveryOutcome::OwnerAbsent,
        }
    }

    /// Deliver an envelope taken from a subscription
    pub fn deliver_envelope(&self, envelope: &Envelope) -> DeliveryOutcome {
        if envelope.owner != self.owner {
            tracing::warn!(
                "Envelope for {} handed to receiver of {}, ignoring",
                envelope.owner,
                self.owner
            );
            return DeliveryOutcome::Misaddressed;
        }
        self.deliver(&envelope.event)
    }
}

impl std::fmt::Debug for StatusReceiver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatusReceiver")
            .field("owner", &self.owner)
            .field("live", &self.is_live())
            .finish()
    }
}
