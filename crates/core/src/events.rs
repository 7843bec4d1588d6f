//! Typed publish/subscribe bus for library change notifications
//!
//! The set of events is closed: every event name and its payload shape is
//! declared in this module, and `LibraryEvent` is sealed so no other crate can
//! add one. Dispatch is keyed on the event's string name.
//!
//! Delivery is synchronous, in registration order, to the listeners that were
//! registered when `emit` was called. Nothing is buffered: an event emitted
//! while nobody listens is dropped.

use crate::types::{AuthorId, BookId};
use std::any::Any;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, Weak};

mod sealed {
    pub trait Sealed {}
}

/// An event that can travel over the [`EventEmitter`]
pub trait LibraryEvent: sealed::Sealed + Send + Sync + 'static {
    /// Wire name of the event
    const NAME: &'static str;
}

/// A book was added to the library
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookCreated {
    pub book_id: BookId,
}

/// A book's metadata changed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookUpdated {
    pub book_id: BookId,
}

/// One or more authors were created
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorCreated {
    pub author_ids: Vec<AuthorId>,
}

/// An author's metadata changed or the author was removed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorUpdated {
    pub author_id: AuthorId,
}

macro_rules! library_event {
    ($ty:ty, $name:literal) => {
        impl sealed::Sealed for $ty {}
        impl LibraryEvent for $ty {
            const NAME: &'static str = $name;
        }
    };
}

library_event!(BookCreated, "book-created");
library_event!(BookUpdated, "book-updated");
library_event!(AuthorCreated, "author-created");
library_event!(AuthorUpdated, "author-updated");

/// Every event name the bus knows about
pub const EVENT_NAMES: [&str; 4] = [
    BookCreated::NAME,
    BookUpdated::NAME,
    AuthorCreated::NAME,
    AuthorUpdated::NAME,
];

type Callback = Arc<dyn Fn(&dyn Any) + Send + Sync>;

struct Listener {
    id: u64,
    callback: Callback,
}

#[derive(Default)]
struct Registry {
    next_id: u64,
    listeners: HashMap<&'static str, Vec<Listener>>,
}

/// Cheaply cloneable handle to a shared event bus
#[derive(Clone, Default)]
pub struct EventEmitter {
    registry: Arc<Mutex<Registry>>,
}

impl EventEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `callback` for events of type `E`
    ///
    /// The listener stays registered until [`Subscription::unsubscribe`] is
    /// called; dropping the subscription does not remove it.
    pub fn listen<E, F>(&self, callback: F) -> Subscription
    where
        E: LibraryEvent,
        F: Fn(&E) + Send + Sync + 'static,
    {
        let callback: Callback = Arc::new(move |payload: &dyn Any| {
            if let Some(event) = payload.downcast_ref::<E>() {
                callback(event);
            }
        });

        let mut registry = self.lock();
        let id = registry.next_id;
        registry.next_id += 1;
        registry
            .listeners
            .entry(E::NAME)
            .or_default()
            .push(Listener { id, callback });

        Subscription {
            registry: Arc::downgrade(&self.registry),
            name: E::NAME,
            id,
        }
    }

    /// Delivers `event` to every listener currently registered for it
    pub fn emit<E: LibraryEvent>(&self, event: E) {
        // Snapshot so callbacks may listen/unsubscribe without deadlocking.
        let callbacks: Vec<Callback> = {
            let registry = self.lock();
            registry
                .listeners
                .get(E::NAME)
                .map(|listeners| listeners.iter().map(|l| Arc::clone(&l.callback)).collect())
                .unwrap_or_default()
        };

        if callbacks.is_empty() {
            log::trace!("Dropping '{}' event: no listeners", E::NAME);
            return;
        }

        log::debug!("Emitting '{}' to {} listener(s)", E::NAME, callbacks.len());
        for callback in callbacks {
            callback(&event);
        }
    }

    /// Number of listeners registered for `E`
    pub fn listener_count<E: LibraryEvent>(&self) -> usize {
        self.lock()
            .listeners
            .get(E::NAME)
            .map(Vec::len)
            .unwrap_or(0)
    }

    fn lock(&self) -> MutexGuard<'_, Registry> {
        self.registry
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl std::fmt::Debug for EventEmitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let registry = self.lock();
        let counts: HashMap<&str, usize> = registry
            .listeners
            .iter()
            .map(|(name, listeners)| (*name, listeners.len()))
            .collect();
        f.debug_struct("EventEmitter").field("listeners", &counts).finish()
    }
}

/// Handle returned by [`EventEmitter::listen`]
#[must_use = "dropping a Subscription leaves the listener registered"]
pub struct Subscription {
    registry: Weak<Mutex<Registry>>,
    name: &'static str,
    id: u64,
}

impl Subscription {
    /// Removes the listener; later emits no longer reach it
    pub fn unsubscribe(self) {
        let Some(registry) = self.registry.upgrade() else {
            return;
        };
        let mut registry = registry
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(listeners) = registry.listeners.get_mut(self.name) {
            listeners.retain(|listener| listener.id != self.id);
            if listeners.is_empty() {
                registry.listeners.remove(self.name);
            }
        }
    }

    /// Name of the event this subscription listens to
    pub fn event_name(&self) -> &'static str {
        self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn book_updated(id: &str) -> BookUpdated {
        BookUpdated {
            book_id: BookId::from(id),
        }
    }

    #[test]
    fn test_event_names_are_distinct() {
        let mut names = EVENT_NAMES.to_vec();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), EVENT_NAMES.len());
    }

    #[test]
    fn test_emit_reaches_listener_with_payload() {
        let emitter = EventEmitter::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let sink = Arc::clone(&seen);
        let _subscription = emitter.listen::<BookUpdated, _>(move |event| {
            sink.lock().unwrap().push(event.book_id.clone());
        });

        emitter.emit(book_updated("7"));
        assert_eq!(*seen.lock().unwrap(), vec![BookId::from("7")]);
    }

    #[test]
    fn test_listeners_run_in_registration_order() {
        let emitter = EventEmitter::new();
        let order = Arc::new(Mutex::new(Vec::new()));

        for label in ["first", "second", "third"] {
            let order = Arc::clone(&order);
            let _ = emitter.listen::<BookCreated, _>(move |_| order.lock().unwrap().push(label));
        }

        emitter.emit(BookCreated {
            book_id: BookId::from("1"),
        });
        assert_eq!(*order.lock().unwrap(), vec!["first", "second", "third"]);
    }

    #[test]
    fn test_unsubscribe_stops_delivery() {
        let emitter = EventEmitter::new();
        let calls = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&calls);
        let subscription = emitter.listen::<BookUpdated, _>(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        emitter.emit(book_updated("1"));
        subscription.unsubscribe();
        emitter.emit(book_updated("1"));

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(emitter.listener_count::<BookUpdated>(), 0);
    }

    #[test]
    fn test_unsubscribe_removes_only_that_listener() {
        let emitter = EventEmitter::new();
        let calls = Arc::new(AtomicUsize::new(0));

        let a = Arc::clone(&calls);
        let first = emitter.listen::<AuthorUpdated, _>(move |_| {
            a.fetch_add(1, Ordering::SeqCst);
        });
        let b = Arc::clone(&calls);
        let _second = emitter.listen::<AuthorUpdated, _>(move |_| {
            b.fetch_add(10, Ordering::SeqCst);
        });

        first.unsubscribe();
        emitter.emit(AuthorUpdated {
            author_id: AuthorId::from("a"),
        });

        assert_eq!(calls.load(Ordering::SeqCst), 10);
    }

    #[test]
    fn test_events_are_routed_by_name() {
        let emitter = EventEmitter::new();
        let calls = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&calls);
        let _subscription = emitter.listen::<AuthorCreated, _>(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        emitter.emit(book_updated("1"));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_emit_without_listeners_is_dropped() {
        let emitter = EventEmitter::new();
        emitter.emit(book_updated("1"));

        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let _subscription = emitter.listen::<BookUpdated, _>(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        // No replay of the earlier event
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_listener_added_during_dispatch_is_not_invoked() {
        let emitter = EventEmitter::new();
        let late_calls = Arc::new(AtomicUsize::new(0));

        let inner_emitter = emitter.clone();
        let late = Arc::clone(&late_calls);
        let _subscription = emitter.listen::<BookUpdated, _>(move |_| {
            let late = Arc::clone(&late);
            let _ = inner_emitter.listen::<BookUpdated, _>(move |_| {
                late.fetch_add(1, Ordering::SeqCst);
            });
        });

        emitter.emit(book_updated("1"));
        assert_eq!(late_calls.load(Ordering::SeqCst), 0);
        assert_eq!(emitter.listener_count::<BookUpdated>(), 2);
    }

    #[test]
    fn test_subscription_outliving_emitter() {
        let emitter = EventEmitter::new();
        let subscription = emitter.listen::<BookUpdated, _>(|_| {});
        assert_eq!(subscription.event_name(), "book-updated");
        drop(emitter);
        subscription.unsubscribe();
    }
}
