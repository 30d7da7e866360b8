//! In-page message bus abstraction.
//!
//! Stands in for the host window's named-event channel. The broker receives a
//! bus explicitly so it can run against a real host binding or against
//! [`LocalBus`] in tests.

use std::any::Any;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

/// Type-erased event payload, the equivalent of a `CustomEvent`'s `detail`.
pub type Detail = Arc<dyn Any + Send + Sync>;

/// Callback invoked for every matching event.
pub type Handler = Arc<dyn Fn(&Event) + Send + Sync>;

/// Identifies a registered listener so it can be removed again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

impl ListenerId {
    pub(crate) fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        ListenerId(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// A named event with an optional payload.
#[derive(Clone)]
pub struct Event {
    pub name: String,
    pub detail: Option<Detail>,
}

impl Event {
    pub fn new(name: impl Into<String>, detail: Option<Detail>) -> Self {
        Self {
            name: name.into(),
            detail,
        }
    }

    /// Downcast the payload, `None` if absent or of another type.
    pub fn detail<T: Any + Send + Sync>(&self) -> Option<&T> {
        self.detail.as_deref()?.downcast_ref::<T>()
    }
}

impl std::fmt::Debug for Event {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Event")
            .field("name", &self.name)
            .field("has_detail", &self.detail.is_some())
            .finish()
    }
}

/// A process-wide named-event channel.
pub trait MessageBus: Send + Sync {
    /// Dispatch `name` with an optional payload to every listener for `name`.
    fn emit(&self, name: &str, detail: Option<Detail>);

    /// Register `handler` for `name`.
    fn on(&self, name: &str, handler: Handler) -> ListenerId;

    /// Remove a listener. Returns `false` if it was not registered.
    fn off(&self, id: ListenerId) -> bool;
}

struct Listener {
    id: ListenerId,
    name: String,
    handler: Handler,
}

/// In-process bus with synchronous FIFO dispatch.
///
/// Handlers run in registration order on the emitting thread. Dispatch works
/// on a snapshot of the listener table, so handlers may emit, register or
/// remove listeners themselves.
#[derive(Default)]
pub struct LocalBus {
    listeners: RwLock<Vec<Listener>>,
}

impl LocalBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of listeners registered for `name`.
    pub fn listener_count(&self, name: &str) -> usize {
        self.listeners
            .read()
            .map(|l| l.iter().filter(|x| x.name == name).count())
            .unwrap_or(0)
    }
}

impl MessageBus for LocalBus {
    fn emit(&self, name: &str, detail: Option<Detail>) {
        let handlers: Vec<Handler> = match self.listeners.read() {
            Ok(listeners) => listeners
                .iter()
                .filter(|l| l.name == name)
                .map(|l| Arc::clone(&l.handler))
                .collect(),
            Err(_) => return,
        };

        tracing::trace!(event = name, listeners = handlers.len(), "dispatching event");

        let event = Event::new(name, detail);
        for handler in handlers {
            handler(&event);
        }
    }

    fn on(&self, name: &str, handler: Handler) -> ListenerId {
        let id = ListenerId::next();
        if let Ok(mut listeners) = self.listeners.write() {
            listeners.push(Listener {
                id,
                name: name.to_string(),
                handler,
            });
        }
        id
    }

    fn off(&self, id: ListenerId) -> bool {
        let Ok(mut listeners) = self.listeners.write() else {
            return false;
        };
        let before = listeners.len();
        listeners.retain(|l| l.id != id);
        listeners.len() != before
    }
}
