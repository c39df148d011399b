//! Host surface lifecycle phases
//!
//! ```text
//! Created → Started ⇄ Resumed
//!              ↓  ↑
//!            Stopped
//!
//! any phase → Destroyed (terminal)
//! ```

use std::fmt;

use crate::error::{Result, SurfaceError};

/// Where a host surface is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Constructed, service binding requested, not yet listening
    Created,
    /// Subscribed to the event channel
    Started,
    /// Started and in the foreground
    Resumed,
    /// No longer listening; may be started again
    Stopped,
    /// Torn down; terminal
    Destroyed,
}

impl Phase {
    /// Whether moving from `self` to `next` is a legal transition
    pub fn can_transition_to(self, next: Phase) -> bool {
        use Phase::*;
        matches!(
            (self, next),
            (Created, Started)
                | (Started, Resumed)
                | (Resumed, Started)
                | (Started, Stopped)
                | (Stopped, Started)
                | (Created | Started | Resumed | Stopped, Destroyed)
        )
    }

    /// Fail unless `self → next` is a legal transition
    pub fn check_transition(self, next: Phase) -> Result<()> {
        if self == Phase::Destroyed {
            return Err(SurfaceError::Destroyed);
        }
        if !self.can_transition_to(next) {
            return Err(SurfaceError::InvalidTransition {
                from: self,
                to: next,
            });
        }
        Ok(())
    }

    /// Whether the surface is subscribed to the event channel in this phase
    pub fn is_listening(self) -> bool {
        matches!(self, Phase::Started | Phase::Resumed)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Created => "created",
            Phase::Started => "started",
            Phase::Resumed => "resumed",
            Phase::Stopped => "stopped",
            Phase::Destroyed => "destroyed",
        };
        f.write_str(name)
    }
}
