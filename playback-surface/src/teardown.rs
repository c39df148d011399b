//! Result of tearing a host surface down

use crate::error::TeardownFault;
use crate::lifecycle::Phase;

/// What [`HostSurface::destroy`](crate::HostSurface::destroy) did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TeardownReport {
    /// Phase the surface was in, or `None` if it was already destroyed
    pub previous: Option<Phase>,
    /// Whether an event subscription was released
    pub released_subscription: bool,
    /// Whether a service binding was released
    pub released_connection: bool,
    /// Observer registrations dropped when the registry was cleared
    pub cleared_observers: usize,
    /// Failures that were logged and swallowed along the way
    pub faults: Vec<TeardownFault>,
}

impl TeardownReport {
    pub(crate) fn already_destroyed_report() -> Self {
        Self::default()
    }

    /// Whether every step completed without a fault
    pub fn is_clean(&self) -> bool {
        self.faults.is_empty()
    }

    /// Whether this call found the surface already destroyed
    pub fn already_destroyed(&self) -> bool {
        self.previous.is_none()
    }
}
