//! Ordered, duplicate-free observer registry
//!
//! Fan-out iterates a snapshot taken when the pass starts, and the lock is
//! never held while an observer runs. Observers may therefore add or remove
//! observers (themselves included) from inside a callback; those changes take
//! effect from the next pass.

use std::panic::{catch_unwind, AssertUnwindSafe};

use parking_lot::Mutex;

use crate::observer::ObserverHandle;
use crate::route::Notification;

/// Outcome of one fan-out pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FanOut {
    /// Observers whose callback ran to completion
    pub notified: usize,
    /// Handles whose observer no longer exists
    pub skipped: usize,
    /// Observers whose callback panicked
    pub faulted: usize,
}

/// Observers registered with one host surface, in insertion order
#[derive(Debug, Default)]
pub struct ObserverRegistry {
    observers: Mutex<Vec<ObserverHandle>>,
}

impl ObserverRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an observer
    ///
    /// Absent handles and handles already registered are ignored; returns
    /// whether the registry changed.
    pub fn add(&self, handle: ObserverHandle) -> bool {
        if handle.is_absent() {
            return false;
        }
        let mut observers = self.observers.lock();
        if observers.iter().any(|existing| existing.same_as(&handle)) {
            return false;
        }
        observers.push(handle);
        true
    }

    /// Remove an observer; returns whether it was registered
    pub fn remove(&self, handle: &ObserverHandle) -> bool {
        let mut observers = self.observers.lock();
        let before = observers.len();
        observers.retain(|existing| !existing.same_as(handle));
        before != observers.len()
    }

    pub fn contains(&self, handle: &ObserverHandle) -> bool {
        self.observers
            .lock()
            .iter()
            .any(|existing| existing.same_as(handle))
    }

    /// Number of registered handles, including any whose observer has gone
    pub fn len(&self) -> usize {
        self.observers.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.observers.lock().is_empty()
    }

    /// Copy of the current registrations
    pub fn snapshot(&self) -> Vec<ObserverHandle> {
        self.observers.lock().clone()
    }

    /// Drop every registration, returning how many there were
    pub fn clear(&self) -> usize {
        let mut observers = self.observers.lock();
        let count = observers.len();
        observers.clear();
        count
    }

    /// Drop handles whose observer no longer exists
    pub fn prune(&self) -> usize {
        let mut observers = self.observers.lock();
        let before = observers.len();
        observers.retain(|handle| !handle.is_absent());
        before - observers.len()
    }

    /// Deliver `notification` to every observer in the current snapshot
    ///
    /// Observers that have gone away are skipped, and a panicking observer is
    /// logged and skipped; neither stops the pass.
    pub fn notify_all(&self, notification: Notification) -> FanOut {
        let mut fan_out = FanOut::default();

        for handle in self.snapshot() {
            let Some(observer) = handle.upgrade() else {
                fan_out.skipped += 1;
                continue;
            };

            match catch_unwind(AssertUnwindSafe(|| notification.deliver(observer.as_ref()))) {
                Ok(()) => fan_out.notified += 1,
                Err(_) => {
                    tracing::error!("Observer panicked handling {:?}, skipping it", notification);
                    fan_out.faulted += 1;
                }
            }
        }

        if fan_out.skipped > 0 {
            let pruned = self.prune();
            tracing::trace!("Pruned {} observers that no longer exist", pruned);
        }

        fan_out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observer::PlaybackObserver;
    use proptest::prelude::*;
    use std::sync::Arc;

    #[derive(Default)]
    struct Log(Mutex<Vec<&'static str>>);

    struct Named {
        name: &'static str,
        log: Arc<Log>,
    }

    impl PlaybackObserver for Named {
        fn on_meta_changed(&self) {
            self.log.0.lock().push(self.name);
        }
        fn on_list_refresh_needed(&self) {}
        fn on_playlist_changed(&self) {}
    }

    struct Panicking;

    impl PlaybackObserver for Panicking {
        fn on_meta_changed(&self) {
            panic!("observer failure");
        }
        fn on_list_refresh_needed(&self) {}
        fn on_playlist_changed(&self) {}
    }

    fn named(name: &'static str, log: &Arc<Log>) -> Arc<Named> {
        Arc::new(Named {
            name,
            log: Arc::clone(log),
        })
    }

    #[test]
    fn test_no_duplicates() {
        let log = Arc::new(Log::default());
        let a = named("a", &log);
        let registry = ObserverRegistry::new();

        assert!(registry.add(ObserverHandle::new(&a)));
        assert!(!registry.add(ObserverHandle::new(&a)));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_absent_handle_ignored() {
        let registry = ObserverRegistry::new();
        assert!(!registry.add(ObserverHandle::absent()));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_remove_unknown_is_noop() {
        let log = Arc::new(Log::default());
        let a = named("a", &log);
        let b = named("b", &log);
        let registry = ObserverRegistry::new();
        registry.add(ObserverHandle::new(&a));

        assert!(!registry.remove(&ObserverHandle::new(&b)));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_fan_out_in_insertion_order() {
        let log = Arc::new(Log::default());
        let (a, b, c) = (named("a", &log), named("b", &log), named("c", &log));
        let registry = ObserverRegistry::new();
        registry.add(ObserverHandle::new(&b));
        registry.add(ObserverHandle::new(&a));
        registry.add(ObserverHandle::new(&c));

        let fan_out = registry.notify_all(Notification::MetaChanged);

        assert_eq!(fan_out.notified, 3);
        assert_eq!(*log.0.lock(), vec!["b", "a", "c"]);
    }

    #[test]
    fn test_dropped_observer_skipped_and_pruned() {
        let log = Arc::new(Log::default());
        let a = named("a", &log);
        let b = named("b", &log);
        let registry = ObserverRegistry::new();
        registry.add(ObserverHandle::new(&a));
        registry.add(ObserverHandle::new(&b));

        drop(a);
        let fan_out = registry.notify_all(Notification::MetaChanged);

        assert_eq!(fan_out, FanOut { notified: 1, skipped: 1, faulted: 0 });
        assert_eq!(*log.0.lock(), vec!["b"]);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_panicking_observer_does_not_stop_pass() {
        let log = Arc::new(Log::default());
        let bad = Arc::new(Panicking);
        let good = named("good", &log);
        let registry = ObserverRegistry::new();
        registry.add(ObserverHandle::new(&bad));
        registry.add(ObserverHandle::new(&good));

        let fan_out = registry.notify_all(Notification::MetaChanged);

        assert_eq!(fan_out.faulted, 1);
        assert_eq!(fan_out.notified, 1);
        assert_eq!(*log.0.lock(), vec!["good"]);
    }

    proptest! {
        #[test]
        fn prop_registry_never_holds_duplicates(ops in prop::collection::vec((any::<bool>(), 0usize..4), 0..64)) {
            let log = Arc::new(Log::default());
            let pool: Vec<_> = ["a", "b", "c", "d"].iter().map(|n| named(*n, &log)).collect();
            let registry = ObserverRegistry::new();
            let mut model: Vec<usize> = Vec::new();

            for (insert, index) in ops {
                let handle = ObserverHandle::new(&pool[index]);
                if insert {
                    let added = registry.add(handle);
                    prop_assert_eq!(added, !model.contains(&index));
                    if added {
                        model.push(index);
                    }
                } else {
                    let removed = registry.remove(&handle);
                    prop_assert_eq!(removed, model.contains(&index));
                    model.retain(|i| *i != index);
                }
            }

            let snapshot = registry.snapshot();
            prop_assert_eq!(snapshot.len(), model.len());
            for (handle, index) in snapshot.iter().zip(&model) {
                prop_assert!(handle.same_as(&ObserverHandle::new(&pool[*index])));
            }
        }
    }
}
