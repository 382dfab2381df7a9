use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use crate::event::{Event, EventHandler, EventId};

type SharedHandler = Arc<EventHandler>;

#[derive(Default)]
struct Listeners {
    global: HashMap<&'static str, Vec<(EventId, SharedHandler)>>,
    scoped: HashMap<(&'static str, String), Vec<(EventId, SharedHandler)>>,
    next_id: EventId,
}

/// Synchronous event dispatcher.
///
/// Every dispatch runs the global listeners of the event name first, in
/// registration order, then the listeners scoped to the event's scope.
/// Handlers are invoked outside the internal lock, so a handler may register
/// further listeners or dispatch nested events.
pub struct EventDispatcher {
    listeners: Mutex<Listeners>,
}

/// Dispatcher handle shared between the catalog, the lifecycle dispatcher and
/// bootstraps
pub type SharedEventDispatcher = Arc<EventDispatcher>;

// Manual Debug implementation for EventDispatcher
impl fmt::Debug for EventDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let listeners = self.lock();
        let global_count: usize = listeners.global.values().map(|v| v.len()).sum();
        let scoped_count: usize = listeners.scoped.values().map(|v| v.len()).sum();
        f.debug_struct("EventDispatcher")
            .field("global_handlers_count", &global_count)
            .field("scoped_handlers_count", &scoped_count)
            .finish()
    }
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self {
            listeners: Mutex::new(Listeners {
                next_id: 1,
                ..Listeners::default()
            }),
        }
    }

    /// Create a dispatcher ready to be shared
    pub fn shared() -> SharedEventDispatcher {
        Arc::new(Self::new())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Listeners> {
        self.listeners.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Listen to every event with the given name
    pub fn listen<F>(&self, event_name: &'static str, handler: F) -> EventId
    where
        F: Fn(&dyn Event) + Send + Sync + 'static,
    {
        let mut listeners = self.lock();
        let id = listeners.next_id;
        listeners.next_id += 1;
        listeners
            .global
            .entry(event_name)
            .or_default()
            .push((id, Arc::new(Box::new(handler))));
        id
    }

    /// Listen to events with the given name whose scope equals `scope`
    pub fn listen_scoped<F>(&self, event_name: &'static str, scope: impl Into<String>, handler: F) -> EventId
    where
        F: Fn(&dyn Event) + Send + Sync + 'static,
    {
        let mut listeners = self.lock();
        let id = listeners.next_id;
        listeners.next_id += 1;
        listeners
            .scoped
            .entry((event_name, scope.into()))
            .or_default()
            .push((id, Arc::new(Box::new(handler))));
        id
    }

    /// Listen to every event of a concrete type, whatever its name
    pub fn listen_typed<E, F>(&self, event_name: &'static str, handler: F) -> EventId
    where
        E: Event,
        F: Fn(&E) + Send + Sync + 'static,
    {
        self.listen(event_name, move |event| {
            if let Some(typed) = event.as_any().downcast_ref::<E>() {
                handler(typed);
            }
        })
    }

    /// Remove a listener. Returns whether it was registered.
    pub fn unlisten(&self, id: EventId) -> bool {
        let mut listeners = self.lock();
        let mut found = false;
        for handlers in listeners.global.values_mut() {
            let len_before = handlers.len();
            handlers.retain(|(h_id, _)| *h_id != id);
            found |= handlers.len() < len_before;
        }
        for handlers in listeners.scoped.values_mut() {
            let len_before = handlers.len();
            handlers.retain(|(h_id, _)| *h_id != id);
            found |= handlers.len() < len_before;
        }
        found
    }

    /// Deliver an event. Returns the number of listeners invoked.
    pub fn dispatch(&self, event: &dyn Event) -> usize {
        let handlers: Vec<SharedHandler> = {
            let listeners = self.lock();
            let global = listeners.global.get(event.name()).into_iter().flatten();
            let scoped = event
                .scope()
                .and_then(|scope| listeners.scoped.get(&(event.name(), scope.to_string())))
                .into_iter()
                .flatten();
            global.chain(scoped).map(|(_, handler)| Arc::clone(handler)).collect()
        };

        log::debug!(
            "Dispatching '{}'{} to {} listener(s)",
            event.name(),
            event.scope().map(|scope| format!(" [{}]", scope)).unwrap_or_default(),
            handlers.len()
        );

        for handler in &handlers {
            (**handler)(event);
        }
        handlers.len()
    }

    /// Whether anything listens to the given event name (globally or scoped)
    pub fn has_listeners(&self, event_name: &str) -> bool {
        let listeners = self.lock();
        listeners.global.get(event_name).is_some_and(|h| !h.is_empty())
            || listeners
                .scoped
                .iter()
                .any(|((name, _), h)| *name == event_name && !h.is_empty())
    }
}

impl Default for EventDispatcher {
    fn default() -> Self {
        Self::new()
    }
}
