//! Property change notification.
//!
//! Generated proxies expose a `PropertyChangedHandlers` slot through the
//! `NotifyPropertyChanged` trait and raise it with the changed property's
//! name every time an intercepted mutator runs.

use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Arguments of a property-changed notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyChangedEventArgs {
    property_name: String,
}

impl PropertyChangedEventArgs {
    /// Creates event arguments for the named property.
    #[must_use]
    pub fn new(property_name: impl Into<String>) -> Self {
        Self {
            property_name: property_name.into(),
        }
    }

    /// Returns the name of the property that changed.
    #[must_use]
    pub fn property_name(&self) -> &str {
        &self.property_name
    }
}

/// Identifies a registered listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

type Handler = Arc<dyn Fn(&PropertyChangedEventArgs) + Send + Sync>;

/// Listener list for property-changed notifications.
pub struct PropertyChangedHandlers {
    handlers: RwLock<Vec<(SubscriptionId, Handler)>>,
    next_id: AtomicU64,
}

impl PropertyChangedHandlers {
    /// Creates an empty listener list.
    #[must_use]
    pub fn new() -> Self {
        Self {
            handlers: RwLock::new(Vec::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Registers a listener and returns its id.
    pub fn subscribe<F>(&self, handler: F) -> SubscriptionId
    where
        F: Fn(&PropertyChangedEventArgs) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.handlers.write().push((id, Arc::new(handler)));
        id
    }

    /// Removes a listener. Returns false if it was not registered.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut handlers = self.handlers.write();
        let before = handlers.len();
        handlers.retain(|(existing, _)| *existing != id);
        handlers.len() != before
    }

    /// Invokes every listener in registration order.
    ///
    /// Listeners run outside the lock, so they may subscribe or unsubscribe.
    pub fn raise(&self, args: &PropertyChangedEventArgs) {
        let snapshot: Vec<Handler> = self
            .handlers
            .read()
            .iter()
            .map(|(_, h)| Arc::clone(h))
            .collect();
        for handler in snapshot {
            handler(args);
        }
    }

    /// Returns true if no listener is attached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.read().is_empty()
    }

    /// Returns the number of attached listeners.
    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.read().len()
    }
}

impl Default for PropertyChangedHandlers {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for PropertyChangedHandlers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyChangedHandlers")
            .field("listeners", &self.len())
            .finish()
    }
}

/// Change-notification capability of a generated proxy.
pub trait NotifyPropertyChanged {
    /// Returns the proxy's listener list.
    fn property_changed(&self) -> &PropertyChangedHandlers;

    /// Registers a listener.
    fn subscribe<F>(&self, handler: F) -> SubscriptionId
    where
        F: Fn(&PropertyChangedEventArgs) + Send + Sync + 'static,
        Self: Sized,
    {
        self.property_changed().subscribe(handler)
    }

    /// Removes a listener.
    fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.property_changed().unsubscribe(id)
    }
}
