use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use super::DrawingManagerId;

type Listeners = RefCell<HashMap<DrawingManagerId, usize>>;

/// Tracks which drawing managers currently have live listeners
#[derive(Default)]
pub struct ListenerRegistry {
    listeners: Rc<Listeners>,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener for `manager`
    pub fn subscribe(&self, manager: DrawingManagerId) -> Subscription {
        *self.listeners.borrow_mut().entry(manager).or_insert(0) += 1;
        Subscription {
            listeners: Rc::downgrade(&self.listeners),
            manager,
        }
    }

    pub fn is_subscribed(&self, manager: DrawingManagerId) -> bool {
        self.listeners.borrow().contains_key(&manager)
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.borrow().values().sum()
    }
}

/// A live event registration. Dropping it unregisters the listener.
#[must_use = "dropping a subscription immediately stops event delivery"]
pub struct Subscription {
    listeners: Weak<Listeners>,
    manager: DrawingManagerId,
}

impl Subscription {
    /// Unregister now instead of at end of scope
    pub fn release(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        // Registry may already be gone if the map was torn down first
        let Some(listeners) = self.listeners.upgrade() else {
            return;
        };
        let mut listeners = listeners.borrow_mut();
        if let Some(count) = listeners.get_mut(&self.manager) {
            *count -= 1;
            if *count == 0 {
                listeners.remove(&self.manager);
            }
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("manager", &self.manager)
            .finish()
    }
}
