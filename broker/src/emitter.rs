//! Payload-less named notifications for broker observers.

use std::sync::{Arc, RwLock};

use crate::bus::ListenerId;

/// Observer callback. Notifications carry no payload; observers re-read state.
pub type Callback = Arc<dyn Fn() + Send + Sync>;

#[derive(Default)]
pub struct EventEmitter {
    listeners: RwLock<Vec<(ListenerId, String, Callback)>>,
}

impl EventEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(&self, name: &str, callback: Callback) -> ListenerId {
        let id = ListenerId::next();
        if let Ok(mut listeners) = self.listeners.write() {
            listeners.push((id, name.to_string(), callback));
        }
        id
    }

    pub fn off(&self, id: ListenerId) -> bool {
        let Ok(mut listeners) = self.listeners.write() else {
            return false;
        };
        let before = listeners.len();
        listeners.retain(|(lid, _, _)| *lid != id);
        listeners.len() != before
    }

    /// Call every listener for `name`. Returns how many were called.
    pub fn emit(&self, name: &str) -> usize {
        let callbacks: Vec<Callback> = match self.listeners.read() {
            Ok(listeners) => listeners
                .iter()
                .filter(|(_, n, _)| n == name)
                .map(|(_, _, cb)| Arc::clone(cb))
                .collect(),
            Err(_) => return 0,
        };
        for callback in &callbacks {
            callback();
        }
        callbacks.len()
    }

    pub fn listener_count(&self, name: &str) -> usize {
        self.listeners
            .read()
            .map(|l| l.iter().filter(|(_, n, _)| n == name).count())
            .unwrap_or(0)
    }
}
