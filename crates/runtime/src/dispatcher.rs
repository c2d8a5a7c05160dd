//! Per-kind listener sets and synchronous fan-out.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use indexmap::IndexMap;
use kq_protocol::{EventKind, GameEvent};
use parking_lot::Mutex;

/// Opaque token identifying one registered listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

static NEXT_LISTENER_ID: AtomicU64 = AtomicU64::new(1);

/// Returns a fresh, globally-unique listener id.
pub fn next_listener_id() -> ListenerId {
    ListenerId(NEXT_LISTENER_ID.fetch_add(1, Ordering::SeqCst))
}

/// Listener callback, invoked synchronously on the task that decoded the
/// frame.
pub type EventCallback = Arc<dyn Fn(&GameEvent) + Send + Sync>;

/// Fans decoded events out to per-kind listener sets.
///
/// Listeners run in registration order. A publish operates on a snapshot
/// of the listener set, so subscribing or unsubscribing from inside a
/// callback never affects the publish in flight.
#[derive(Default)]
pub struct Dispatcher {
    listeners: Mutex<HashMap<EventKind, IndexMap<ListenerId, EventCallback>>>,
}

impl Dispatcher {
    pub fn new() -> Dispatcher {
        Dispatcher::default()
    }

    /// Registers a callback for one event kind. The per-kind set is
    /// created lazily on first use, so subscribing to a kind nothing has
    /// subscribed to before is not an error.
    pub fn subscribe<F>(&self, kind: EventKind, callback: F) -> ListenerId
    where
        F: Fn(&GameEvent) + Send + Sync + 'static,
    {
        let id = next_listener_id();
        self.listeners
            .lock()
            .entry(kind)
            .or_default()
            .insert(id, Arc::new(callback));
        id
    }

    /// Removes one listener. Returns true iff it existed.
    pub fn unsubscribe(&self, kind: EventKind, id: ListenerId) -> bool {
        self.listeners
            .lock()
            .get_mut(&kind)
            .is_some_and(|set| set.shift_remove(&id).is_some())
    }

    /// Removes every listener for a kind. Returns true iff any existed.
    pub fn unsubscribe_all(&self, kind: EventKind) -> bool {
        self.listeners
            .lock()
            .remove(&kind)
            .is_some_and(|set| !set.is_empty())
    }

    pub fn listener_count(&self, kind: EventKind) -> usize {
        self.listeners.lock().get(&kind).map_or(0, IndexMap::len)
    }

    /// Invokes every listener registered for the event's kind at the
    /// moment of the call. Only the pipeline publishes.
    pub(crate) fn publish(&self, event: &GameEvent) {
        let snapshot: Vec<EventCallback> = {
            let listeners = self.listeners.lock();
            match listeners.get(&event.kind()) {
                Some(set) => set.values().cloned().collect(),
                None => return,
            }
        };
        for callback in snapshot {
            callback(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kq_protocol::PlayerNames;
    use std::sync::atomic::AtomicUsize;

    fn names_event() -> GameEvent {
        GameEvent::PlayerNames(PlayerNames {})
    }

    #[test]
    fn fans_out_in_registration_order() {
        let dispatcher = Dispatcher::new();
        let order = Arc::new(Mutex::new(Vec::new()));
        for tag in 1..=3 {
            let order = Arc::clone(&order);
            dispatcher.subscribe(EventKind::PlayerNames, move |_| order.lock().push(tag));
        }

        dispatcher.publish(&names_event());

        assert_eq!(*order.lock(), vec![1, 2, 3]);
    }

    #[test]
    fn unsubscribe_is_idempotent() {
        let dispatcher = Dispatcher::new();
        let id = dispatcher.subscribe(EventKind::PlayerKill, |_| {});

        assert!(dispatcher.unsubscribe(EventKind::PlayerKill, id));
        assert!(!dispatcher.unsubscribe(EventKind::PlayerKill, id));
    }

    #[test]
    fn unsubscribe_all_reports_whether_any_existed() {
        let dispatcher = Dispatcher::new();
        assert!(!dispatcher.unsubscribe_all(EventKind::CurrentMatch));

        dispatcher.subscribe(EventKind::CurrentMatch, |_| {});
        dispatcher.subscribe(EventKind::CurrentMatch, |_| {});
        assert!(dispatcher.unsubscribe_all(EventKind::CurrentMatch));
        assert_eq!(dispatcher.listener_count(EventKind::CurrentMatch), 0);
    }

    #[test]
    fn ids_are_scoped_to_their_kind() {
        let dispatcher = Dispatcher::new();
        let id = dispatcher.subscribe(EventKind::PlayerKill, |_| {});
        assert!(!dispatcher.unsubscribe(EventKind::PlayerNames, id));
        assert!(dispatcher.unsubscribe(EventKind::PlayerKill, id));
    }

    #[test]
    fn mutation_during_dispatch_does_not_affect_the_publish_in_flight() {
        let dispatcher = Arc::new(Dispatcher::new());
        let victim_calls = Arc::new(AtomicUsize::new(0));
        let victim_slot: Arc<Mutex<Option<ListenerId>>> = Arc::new(Mutex::new(None));

        // The remover runs first and unsubscribes the victim mid-publish.
        let dispatcher_for_remover = Arc::clone(&dispatcher);
        let victim_slot_for_remover = Arc::clone(&victim_slot);
        dispatcher.subscribe(EventKind::PlayerNames, move |_| {
            if let Some(victim) = *victim_slot_for_remover.lock() {
                dispatcher_for_remover.unsubscribe(EventKind::PlayerNames, victim);
            }
        });

        let victim_calls_inner = Arc::clone(&victim_calls);
        let victim = dispatcher.subscribe(EventKind::PlayerNames, move |_| {
            victim_calls_inner.fetch_add(1, Ordering::SeqCst);
        });
        *victim_slot.lock() = Some(victim);

        // The victim was removed before its turn, but it was in the
        // snapshot taken at publish time, so it still runs once.
        dispatcher.publish(&names_event());
        assert_eq!(victim_calls.load(Ordering::SeqCst), 1);

        dispatcher.publish(&names_event());
        assert_eq!(victim_calls.load(Ordering::SeqCst), 1);
    }
}
