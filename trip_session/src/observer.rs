// SPDX-FileCopyrightText: 2026 All contributors
//
// SPDX-License-Identifier: GPL-2.0-or-later

use common::location::{EnhancedLocation, RawLocation};
use common::route::RouteProgress;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, RwLock};
use tracing::error;

/// Observer for location changes of an active trip.
///
/// Raw fixes arrive as fast as the provider delivers them, enhanced
/// locations at the engine poll rate. Callbacks run on the session's
/// dispatch tasks and must not block.
pub trait LocationObserver: Send + Sync {
    /// Called with every raw provider fix.
    fn on_raw_location_changed(&self, location: &RawLocation);

    /// Called with every engine-fused location snapshot.
    fn on_enhanced_location_changed(&self, location: &EnhancedLocation);
}

/// Observer for route progress changes of an active trip.
pub trait RouteProgressObserver: Send + Sync {
    /// Called with every progress update computed by the navigation engine.
    fn on_route_progress_changed(&self, progress: &RouteProgress);
}

/// A thread-safe, unordered membership set of observers.
///
/// Membership is tracked by pointer identity: removing an [`Arc`] that was
/// never added is a no-op. [`snapshot`](Self::snapshot) hands out a copy of
/// the current membership so one notification round always sees a consistent
/// set, regardless of concurrent registration.
pub(crate) struct ObserverSet<T: ?Sized> {
    observers: RwLock<Vec<Arc<T>>>,
}

impl<T: ?Sized> ObserverSet<T> {
    pub fn new() -> Self {
        ObserverSet {
            observers: RwLock::new(Vec::new()),
        }
    }

    pub fn add(&self, observer: Arc<T>) {
        let mut observers = self.observers.write().unwrap_or_else(|e| e.into_inner());
        observers.push(observer);
    }

    pub fn remove(&self, observer: &Arc<T>) {
        let mut observers = self.observers.write().unwrap_or_else(|e| e.into_inner());
        observers.retain(|registered| !Arc::ptr_eq(registered, observer));
    }

    pub fn snapshot(&self) -> Vec<Arc<T>> {
        let observers = self.observers.read().unwrap_or_else(|e| e.into_inner());
        observers.clone()
    }
}

/// Notifies every observer in the slice, isolating individual failures.
///
/// A panicking observer is logged and skipped; delivery to the remaining
/// observers continues.
pub(crate) fn notify_each<T: ?Sized>(observers: &[Arc<T>], kind: &str, mut notify: impl FnMut(&T)) {
    for observer in observers {
        if catch_unwind(AssertUnwindSafe(|| notify(observer))).is_err() {
            error!("A {kind} observer panicked during notification and was skipped");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingObserver {
        notifications: AtomicUsize,
    }

    impl CountingObserver {
        fn new() -> Arc<Self> {
            Arc::new(CountingObserver {
                notifications: AtomicUsize::new(0),
            })
        }

        fn count(&self) -> usize {
            self.notifications.load(Ordering::SeqCst)
        }

        fn bump(&self) {
            self.notifications.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn snapshot_reflects_added_and_removed_observers() {
        let set = ObserverSet::<CountingObserver>::new();
        let first = CountingObserver::new();
        let second = CountingObserver::new();
        set.add(first.clone());
        set.add(second.clone());
        assert_eq!(set.snapshot().len(), 2);

        set.remove(&first);
        let snapshot = set.snapshot();
        assert_eq!(snapshot.len(), 1);
        assert!(Arc::ptr_eq(&snapshot[0], &second));
    }

    #[test]
    fn removing_a_non_member_leaves_the_set_untouched() {
        let set = ObserverSet::<CountingObserver>::new();
        let member = CountingObserver::new();
        let stranger = CountingObserver::new();
        set.add(member.clone());

        set.remove(&stranger);
        let snapshot = set.snapshot();
        assert_eq!(snapshot.len(), 1);
        assert!(Arc::ptr_eq(&snapshot[0], &member));
    }

    #[test]
    fn a_panicking_observer_does_not_starve_the_rest() {
        let set = ObserverSet::<CountingObserver>::new();
        let panicking = CountingObserver::new();
        let surviving = CountingObserver::new();
        set.add(panicking.clone());
        set.add(surviving.clone());

        let snapshot = set.snapshot();
        notify_each(&snapshot, "counting", |observer| {
            if std::ptr::eq(observer, Arc::as_ptr(&panicking)) {
                panic!("misbehaving observer");
            }
            observer.bump();
        });

        assert_eq!(panicking.count(), 0);
        assert_eq!(surviving.count(), 1);
    }
}
