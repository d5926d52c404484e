//! Event source abstraction and the in-process listener registry.
//!
//! Decouples the matcher from any concrete collaborator. Production code
//! adapts the external client's emission surface to [`EventSource`];
//! simulation code uses [`EventBus`] directly.

use std::{
    collections::HashMap,
    fmt,
    hash::Hash,
    sync::{
        Arc, Mutex, PoisonError,
        atomic::{AtomicU64, Ordering},
    },
};

/// An event discriminated by a cheap, copyable kind.
///
/// The kind is what subscriptions key on; predicates inspect the payload.
pub trait TypedEvent: Clone + Send + Sync + 'static {
    /// Discriminant identifying the event's type.
    type Kind: Copy + Eq + Hash + fmt::Debug + Send + Sync + 'static;

    /// The kind of this event.
    fn kind(&self) -> Self::Kind;
}

/// Callback invoked for every emitted event of a subscribed kind.
pub type EventHandler<E> = Arc<dyn Fn(&E) + Send + Sync>;

/// Opaque handle for one registered listener.
///
/// Ids are unique per source for the lifetime of the process, so a stale
/// handle can never remove somebody else's listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Anything capable of asynchronously emitting typed events to subscribers.
///
/// # Invariants
///
/// - `off` with an unknown or already-removed id is a no-op.
/// - `remove_all_listeners` is idempotent.
/// - Listener registrations from concurrent waits are independent; removing
///   one wait's listeners never disturbs another's.
pub trait EventSource<E: TypedEvent> {
    /// Register `handler` for events of `kind`.
    fn on(&self, kind: E::Kind, handler: EventHandler<E>) -> ListenerId;

    /// Remove a single listener. Unknown ids are ignored.
    fn off(&self, listener: ListenerId);

    /// Drop every registered listener.
    ///
    /// Housekeeping hook run by scenario teardown. In-flight waits are not
    /// cancelled; their pending futures run out their deadline instead.
    fn remove_all_listeners(&self);
}

type ListenerTable<E> = HashMap<<E as TypedEvent>::Kind, Vec<(ListenerId, EventHandler<E>)>>;

struct BusInner<E: TypedEvent> {
    next_id: AtomicU64,
    listeners: Mutex<ListenerTable<E>>,
}

/// Shared in-process listener registry.
///
/// Cloning yields another handle to the same registry, so a simulated client
/// and the scenarios driving it observe one set of listeners. Handlers for an
/// event's kind run synchronously in registration order; emitters that need
/// asynchronous delivery spawn the emission.
pub struct EventBus<E: TypedEvent> {
    inner: Arc<BusInner<E>>,
}

impl<E: TypedEvent> Clone for EventBus<E> {
    fn clone(&self) -> Self {
        Self { inner: Arc::clone(&self.inner) }
    }
}

impl<E: TypedEvent> Default for EventBus<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: TypedEvent> fmt::Debug for EventBus<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus").field("listeners", &self.listener_count()).finish()
    }
}

impl<E: TypedEvent> EventBus<E> {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(BusInner {
                next_id: AtomicU64::new(0),
                listeners: Mutex::new(HashMap::new()),
            }),
        }
    }

    fn table(&self) -> std::sync::MutexGuard<'_, ListenerTable<E>> {
        // A poisoned registry only means a handler panicked; the table
        // itself is still consistent.
        self.inner.listeners.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Deliver `event` to every listener registered for its kind.
    ///
    /// Handlers are cloned out of the registry before running, so a handler
    /// may subscribe or unsubscribe without deadlocking.
    pub fn emit(&self, event: &E) {
        let handlers: Vec<EventHandler<E>> = self
            .table()
            .get(&event.kind())
            .map(|entries| entries.iter().map(|(_, h)| Arc::clone(h)).collect())
            .unwrap_or_default();

        tracing::trace!(kind = ?event.kind(), listeners = handlers.len(), "emit");
        for handler in handlers {
            handler(event);
        }
    }

    /// Total number of registered listeners across all kinds.
    pub fn listener_count(&self) -> usize {
        self.table().values().map(Vec::len).sum()
    }
}

impl<E: TypedEvent> EventSource<E> for EventBus<E> {
    fn on(&self, kind: E::Kind, handler: EventHandler<E>) -> ListenerId {
        let id = ListenerId(self.inner.next_id.fetch_add(1, Ordering::Relaxed));
        self.table().entry(kind).or_default().push((id, handler));
        tracing::trace!(?kind, ?id, "listener registered");
        id
    }

    fn off(&self, listener: ListenerId) {
        let mut table = self.table();
        for entries in table.values_mut() {
            entries.retain(|(id, _)| *id != listener);
        }
        table.retain(|_, entries| !entries.is_empty());
    }

    fn remove_all_listeners(&self) {
        let removed = {
            let mut table = self.table();
            let removed: usize = table.values().map(Vec::len).sum();
            table.clear();
            removed
        };
        if removed > 0 {
            tracing::debug!(removed, "all listeners removed");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Ping {
        Hello(u32),
        Bye,
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    enum PingKind {
        Hello,
        Bye,
    }

    impl TypedEvent for Ping {
        type Kind = PingKind;

        fn kind(&self) -> PingKind {
            match self {
                Ping::Hello(_) => PingKind::Hello,
                Ping::Bye => PingKind::Bye,
            }
        }
    }

    #[test]
    fn emit_reaches_only_matching_kind() {
        let bus = EventBus::<Ping>::new();
        let hits = Arc::new(AtomicUsize::new(0));

        let hits_clone = Arc::clone(&hits);
        bus.on(
            PingKind::Hello,
            Arc::new(move |_| {
                hits_clone.fetch_add(1, Ordering::SeqCst);
            }),
        );

        bus.emit(&Ping::Bye);
        assert_eq!(hits.load(Ordering::SeqCst), 0);

        bus.emit(&Ping::Hello(7));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn off_removes_exactly_one_listener() {
        let bus = EventBus::<Ping>::new();
        let hits = Arc::new(AtomicUsize::new(0));

        let a = {
            let hits = Arc::clone(&hits);
            bus.on(
                PingKind::Hello,
                Arc::new(move |_| {
                    hits.fetch_add(1, Ordering::SeqCst);
                }),
            )
        };
        let _b = {
            let hits = Arc::clone(&hits);
            bus.on(
                PingKind::Hello,
                Arc::new(move |_| {
                    hits.fetch_add(1, Ordering::SeqCst);
                }),
            )
        };

        bus.off(a);
        bus.emit(&Ping::Hello(1));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(bus.listener_count(), 1);
    }

    #[test]
    fn off_is_idempotent() {
        let bus = EventBus::<Ping>::new();
        let id = bus.on(PingKind::Bye, Arc::new(|_| {}));

        bus.off(id);
        bus.off(id);
        assert_eq!(bus.listener_count(), 0);
    }

    #[test]
    fn remove_all_listeners_twice_is_harmless() {
        let bus = EventBus::<Ping>::new();
        bus.on(PingKind::Hello, Arc::new(|_| {}));
        bus.on(PingKind::Bye, Arc::new(|_| {}));

        bus.remove_all_listeners();
        bus.remove_all_listeners();
        assert_eq!(bus.listener_count(), 0);
    }

    #[test]
    fn clones_share_one_registry() {
        let bus = EventBus::<Ping>::new();
        let other = bus.clone();
        other.on(PingKind::Hello, Arc::new(|_| {}));

        assert_eq!(bus.listener_count(), 1);
        bus.remove_all_listeners();
        assert_eq!(other.listener_count(), 0);
    }
}
