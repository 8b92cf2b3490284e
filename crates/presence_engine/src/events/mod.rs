//! Event system with explicit registration
//!
//! Key principles:
//! - Registration returns a token (only registered handlers are notified)
//! - Dropping the token unregisters the handler (scoped release)
//! - Delivery is immediate and synchronous, in registration order
//!
//! Handlers are free to subscribe or unsubscribe on the source that is
//! currently calling them. A handler is never re-entered by a nested emit
//! of the same source; the nested emit skips it.

use slotmap::{new_key_type, SlotMap};
use std::cell::RefCell;
use std::rc::{Rc, Weak};

new_key_type! {
    /// Key identifying one registered listener inside an [`EventSource`]
    pub struct ListenerKey;
}

type Handler<T> = Box<dyn FnMut(&T)>;

/// A slot is `None` while its handler is being called
type Listeners<T> = SlotMap<ListenerKey, Option<Handler<T>>>;

/// Type-erased detach, so a [`Subscription`] does not carry the payload type
trait Detach {
    fn detach(&self, key: ListenerKey);
}

impl<T> Detach for RefCell<Listeners<T>> {
    fn detach(&self, key: ListenerKey) {
        // The handler may own tokens for this same source; drop it unborrowed
        let removed = self.borrow_mut().remove(key);
        drop(removed);
    }
}

/// Broadcasts values of type `T` to registered handlers
pub struct EventSource<T> {
    listeners: Rc<RefCell<Listeners<T>>>,
}

impl<T: 'static> EventSource<T> {
    /// Create a source with no listeners
    pub fn new() -> Self {
        Self {
            listeners: Rc::new(RefCell::new(SlotMap::with_key())),
        }
    }

    /// Register a handler. It stays registered for as long as the returned
    /// token is alive (or forever, after [`Subscription::forget`]).
    #[must_use = "dropping the subscription unregisters the handler"]
    pub fn subscribe<F>(&self, handler: F) -> Subscription
    where
        F: FnMut(&T) + 'static,
    {
        let key = self.listeners.borrow_mut().insert(Some(Box::new(handler)));
        let listeners: Weak<RefCell<Listeners<T>>> = Rc::downgrade(&self.listeners);
        let source: Weak<dyn Detach> = listeners;
        Subscription {
            source: Some(source),
            key,
        }
    }

    /// Deliver `value` to every listener registered at the time of the call
    pub fn emit(&self, value: &T) {
        let keys: Vec<ListenerKey> = self.listeners.borrow().keys().collect();
        for key in keys {
            // Take the handler out so no borrow is held while it runs
            let handler = self.listeners.borrow_mut().get_mut(key).and_then(Option::take);
            if let Some(mut handler) = handler {
                handler(value);
                if let Some(slot) = self.listeners.borrow_mut().get_mut(key) {
                    *slot = Some(handler);
                }
            }
        }
    }

    /// Number of registered listeners
    pub fn listener_count(&self) -> usize {
        self.listeners.borrow().len()
    }
}

impl<T: 'static> Default for EventSource<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Token returned by [`EventSource::subscribe`]
///
/// Unregisters its handler when dropped. A token that outlives its source
/// does nothing.
pub struct Subscription {
    source: Option<Weak<dyn Detach>>,
    key: ListenerKey,
}

impl Subscription {
    /// Unregister the handler now
    pub fn unsubscribe(self) {
        drop(self);
    }

    /// Keep the handler registered for the whole lifetime of the source
    pub fn forget(mut self) {
        self.source = None;
    }

    /// True while both the token and its source are alive
    pub fn is_active(&self) -> bool {
        self.source
            .as_ref()
            .is_some_and(|source| source.strong_count() > 0)
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(source) = self.source.take().and_then(|weak| weak.upgrade()) {
            source.detach(self.key);
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("key", &self.key)
            .field("active", &self.is_active())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_emit_reaches_listeners_in_registration_order() {
        let source = EventSource::<u32>::new();
        let log = Rc::new(RefCell::new(Vec::new()));

        let first_log = Rc::clone(&log);
        let _first = source.subscribe(move |v| first_log.borrow_mut().push(("first", *v)));
        let second_log = Rc::clone(&log);
        let _second = source.subscribe(move |v| second_log.borrow_mut().push(("second", *v)));

        source.emit(&7);

        assert_eq!(*log.borrow(), vec![("first", 7), ("second", 7)]);
    }

    #[test]
    fn test_dropping_token_unsubscribes() {
        let source = EventSource::<()>::new();
        let hits = Rc::new(Cell::new(0));

        let counter = Rc::clone(&hits);
        let token = source.subscribe(move |()| counter.set(counter.get() + 1));
        source.emit(&());
        assert_eq!(source.listener_count(), 1);

        token.unsubscribe();
        source.emit(&());

        assert_eq!(hits.get(), 1);
        assert_eq!(source.listener_count(), 0);
    }

    #[test]
    fn test_forget_keeps_listener() {
        let source = EventSource::<()>::new();
        let hits = Rc::new(Cell::new(0));

        let counter = Rc::clone(&hits);
        source.subscribe(move |()| counter.set(counter.get() + 1)).forget();
        source.emit(&());
        source.emit(&());

        assert_eq!(hits.get(), 2);
    }

    #[test]
    fn test_token_outliving_source_is_inert() {
        let source = EventSource::<u8>::new();
        let token = source.subscribe(|_| {});
        assert!(token.is_active());

        drop(source);

        assert!(!token.is_active());
        drop(token);
    }

    #[test]
    fn test_handler_may_unsubscribe_itself() {
        let source = EventSource::<()>::new();
        let hits = Rc::new(Cell::new(0));
        let slot: Rc<RefCell<Option<Subscription>>> = Rc::new(RefCell::new(None));

        let counter = Rc::clone(&hits);
        let own_slot = Rc::clone(&slot);
        let token = source.subscribe(move |()| {
            counter.set(counter.get() + 1);
            own_slot.borrow_mut().take();
        });
        *slot.borrow_mut() = Some(token);

        source.emit(&());
        source.emit(&());

        assert_eq!(hits.get(), 1);
        assert_eq!(source.listener_count(), 0);
    }

    #[test]
    fn test_dropping_handler_that_owns_a_token_releases_both() {
        let source = EventSource::<()>::new();
        let inner = source.subscribe(|()| {});
        let outer = source.subscribe(move |()| {
            let _keep = &inner;
        });
        assert_eq!(source.listener_count(), 2);

        drop(outer);

        assert_eq!(source.listener_count(), 0);
    }

    #[test]
    fn test_handler_may_drop_a_sibling_token() {
        let source = EventSource::<()>::new();
        let hits = Rc::new(Cell::new(0));

        let counter = Rc::clone(&hits);
        let chained = source.subscribe(move |()| counter.set(counter.get() + 1));
        let holder = Rc::new(RefCell::new(Some(source.subscribe(move |()| {
            let _keep = &chained;
        }))));
        let held = Rc::clone(&holder);
        let _dropper = source.subscribe(move |()| {
            held.borrow_mut().take();
        });

        source.emit(&());
        source.emit(&());

        // The first emit reaches `chained` before its owner is dropped
        assert_eq!(hits.get(), 1);
        assert_eq!(source.listener_count(), 1);
        assert!(holder.borrow().is_none());
    }

    #[test]
    fn test_listener_added_during_emit_waits_for_next_emit() {
        let source = Rc::new(EventSource::<()>::new());
        let late_hits = Rc::new(Cell::new(0));
        let late_tokens: Rc<RefCell<Vec<Subscription>>> = Rc::new(RefCell::new(Vec::new()));

        let inner_source = Rc::clone(&source);
        let counter = Rc::clone(&late_hits);
        let tokens = Rc::clone(&late_tokens);
        let _spawner = source.subscribe(move |()| {
            let counter = Rc::clone(&counter);
            let token = inner_source.subscribe(move |()| counter.set(counter.get() + 1));
            tokens.borrow_mut().push(token);
        });

        source.emit(&());
        assert_eq!(late_hits.get(), 0);

        source.emit(&());
        assert_eq!(late_hits.get(), 1);
    }
}
