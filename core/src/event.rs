//! Synchronous notification lists used by hosts and stores.
//!
//! A [`ListenerList`] owns only weak references to its callbacks. Registering returns
//! a [`Listener`] handle that keeps the callback alive; dropping the handle removes
//! the entry right away. Anything async is layered on top by
//! [`Subscription`](crate::subscription::Subscription).

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use crossbeam_skiplist::SkipMap;

/// Marker for payloads that can be dispatched.
pub trait Event: fmt::Debug + Send + Sync + 'static {}

type Callback<E> = dyn Fn(&E) + Send + Sync;
type Entries<E> = SkipMap<u64, Weak<Callback<E>>>;

static NEXT_LISTENER_ID: AtomicU64 = AtomicU64::new(0);

/// Callbacks for one event type, called in registration order.
pub struct ListenerList<E: Event> {
    entries: Arc<Entries<E>>,
}

impl<E: Event> ListenerList<E> {
    pub fn new() -> Self {
        ListenerList { entries: Arc::new(SkipMap::new()) }
    }

    /// Registers `callback` until the returned handle is dropped.
    pub fn listen<F>(&self, callback: F) -> Listener<E>
    where
        F: Fn(&E) + Send + Sync + 'static,
    {
        let id = NEXT_LISTENER_ID.fetch_add(1, Ordering::Relaxed);
        let callback: Arc<Callback<E>> = Arc::new(callback);
        self.entries.insert(id, Arc::downgrade(&callback));
        Listener {
            _callback: callback,
            id,
            entries: Arc::downgrade(&self.entries),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Only code in this crate dispatches; hosts and stores wrap it in typed
    /// helpers such as [`HostEvents::drop_paths`](crate::host::HostEvents::drop_paths).
    pub(crate) fn dispatch(&self, event: &E) {
        for entry in self.entries.iter() {
            // A handle dropped on another thread mid-dispatch leaves a dead weak ref.
            if let Some(callback) = entry.value().upgrade() {
                callback(event);
            }
        }
    }
}

impl<E: Event> Default for ListenerList<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Event> fmt::Debug for ListenerList<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerList").field("listeners", &self.len()).finish()
    }
}

/// Registration handle returned by [`ListenerList::listen`].
pub struct Listener<E: Event> {
    _callback: Arc<Callback<E>>,
    id: u64,
    entries: Weak<Entries<E>>,
}

impl<E: Event> Drop for Listener<E> {
    fn drop(&mut self) {
        if let Some(entries) = self.entries.upgrade() {
            entries.remove(&self.id);
        }
    }
}

impl<E: Event> fmt::Debug for Listener<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listener").field("id", &self.id).finish()
    }
}

/// Declares a struct with one public [`ListenerList`] per named event.
macro_rules! define_event_listeners {
    ($(#[$meta:meta])* $name:ident { $($field:ident: $event:ty),* $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Default)]
        pub struct $name {
            $(pub $field: $crate::event::ListenerList<$event>,)*
        }

        impl $name {
            pub fn new() -> Self {
                Self::default()
            }
        }
    };
}

pub(crate) use define_event_listeners;

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use uuid::Uuid;

    use super::*;
    use crate::host::{FilesDropped, HostEvents};
    use crate::storage::{StoreChanged, StoreEvents};

    #[test]
    fn test_drop_event_reaches_listeners_in_order() {
        let events = HostEvents::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let (first, second) = (seen.clone(), seen.clone());

        let _a = events.files_dropped.listen(move |e: &FilesDropped| {
            first.lock().unwrap().push(format!("a:{}", e.paths.len()))
        });
        let _b = events.files_dropped.listen(move |e: &FilesDropped| {
            second.lock().unwrap().push(format!("b:{}", e.paths[0]))
        });

        events.drop_paths(vec!["/x.txt".into(), "/y.txt".into()]);
        assert_eq!(*seen.lock().unwrap(), vec!["a:2", "b:/x.txt"]);
    }

    #[test]
    fn test_empty_drop_is_not_dispatched() {
        let events = HostEvents::new();
        let calls = Arc::new(Mutex::new(0));
        let counter = calls.clone();
        let _l = events.files_dropped.listen(move |_| *counter.lock().unwrap() += 1);

        events.drop_paths(Vec::new());
        assert_eq!(*calls.lock().unwrap(), 0);
    }

    #[test]
    fn test_dropping_handle_deregisters_immediately() {
        let events = StoreEvents::new();
        let keys = Arc::new(Mutex::new(Vec::new()));
        let sink = keys.clone();
        let listener = events.changed.listen(move |e: &StoreChanged| sink.lock().unwrap().push(e.key.clone()));
        assert_eq!(events.changed.len(), 1);

        let origin = Uuid::new_v4();
        events.notify("launchdeck_files", origin);
        drop(listener);
        assert!(events.changed.is_empty());

        events.notify("launchdeck_categories", origin);
        assert_eq!(*keys.lock().unwrap(), vec!["launchdeck_files"]);
    }

    #[test]
    fn test_handle_may_outlive_list() {
        let events = StoreEvents::new();
        let listener = events.changed.listen(|_| {});
        drop(events);
        drop(listener);
    }
}
