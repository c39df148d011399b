//! Observer capability set and identity-based handles

use std::sync::{Arc, Weak};

/// Receiver of playback state notifications
///
/// Implemented by sub-surfaces (panels, lists) that want to follow playback
/// while their host surface is alive. [`HostSurface`](crate::HostSurface)
/// implements it too: calling these methods on a surface fans the
/// notification out to everything registered with it.
pub trait PlaybackObserver: Send + Sync {
    /// The current track's metadata changed
    fn on_meta_changed(&self);

    /// Some underlying list changed; re-query it
    fn on_list_refresh_needed(&self);

    /// A playlist changed
    fn on_playlist_changed(&self);
}

struct NoObserver;

impl PlaybackObserver for NoObserver {
    fn on_meta_changed(&self) {}
    fn on_list_refresh_needed(&self) {}
    fn on_playlist_changed(&self) {}
}

/// Non-owning, identity-compared reference to an observer
///
/// Registering a handle never keeps the observer alive. Two handles are equal
/// when they point at the same observer instance, whatever its value.
#[derive(Clone)]
pub struct ObserverHandle {
    inner: Weak<dyn PlaybackObserver>,
}

impl ObserverHandle {
    pub fn new<O: PlaybackObserver + 'static>(observer: &Arc<O>) -> Self {
        let weak: Weak<O> = Arc::downgrade(observer);
        Self { inner: weak }
    }

    /// A handle that refers to nothing
    pub fn absent() -> Self {
        let weak: Weak<NoObserver> = Weak::new();
        Self { inner: weak }
    }

    pub(crate) fn from_weak(inner: Weak<dyn PlaybackObserver>) -> Self {
        Self { inner }
    }

    /// The observer, if it still exists
    pub fn upgrade(&self) -> Option<Arc<dyn PlaybackObserver>> {
        self.inner.upgrade()
    }

    /// Whether the observer is gone (or never existed)
    pub fn is_absent(&self) -> bool {
        self.inner.strong_count() == 0
    }

    /// Whether both handles refer to the same observer instance
    pub fn same_as(&self, other: &ObserverHandle) -> bool {
        Weak::ptr_eq(&self.inner, &other.inner)
    }
}

impl PartialEq for ObserverHandle {
    fn eq(&self, other: &Self) -> bool {
        self.same_as(other)
    }
}

impl Eq for ObserverHandle {}

impl<O: PlaybackObserver + 'static> From<&Arc<O>> for ObserverHandle {
    fn from(observer: &Arc<O>) -> Self {
        ObserverHandle::new(observer)
    }
}

impl<O: PlaybackObserver + 'static> From<Option<&Arc<O>>> for ObserverHandle {
    fn from(observer: Option<&Arc<O>>) -> Self {
        observer.map_or_else(ObserverHandle::absent, ObserverHandle::new)
    }
}

impl std::fmt::Debug for ObserverHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObserverHandle")
            .field("alive", &!self.is_absent())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct Counter(AtomicUsize);

    impl PlaybackObserver for Counter {
        fn on_meta_changed(&self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
        fn on_list_refresh_needed(&self) {}
        fn on_playlist_changed(&self) {}
    }

    #[test]
    fn test_identity_not_value() {
        let a = Arc::new(Counter::default());
        let b = Arc::new(Counter::default());

        assert_eq!(ObserverHandle::new(&a), ObserverHandle::new(&a));
        assert_ne!(ObserverHandle::new(&a), ObserverHandle::new(&b));
    }

    #[test]
    fn test_handle_does_not_keep_observer_alive() {
        let observer = Arc::new(Counter::default());
        let handle = ObserverHandle::new(&observer);
        assert!(!handle.is_absent());

        drop(observer);
        assert!(handle.is_absent());
        assert!(handle.upgrade().is_none());
    }

    #[test]
    fn test_absent_handle() {
        let handle = ObserverHandle::absent();
        assert!(handle.is_absent());

        let none: Option<&Arc<Counter>> = None;
        assert!(ObserverHandle::from(none).is_absent());
    }

    #[test]
    fn test_upgrade_calls_through() {
        let observer = Arc::new(Counter::default());
        let handle = ObserverHandle::from(&observer);

        handle.upgrade().unwrap().on_meta_changed();
        assert_eq!(observer.0.load(Ordering::SeqCst), 1);
    }
}
