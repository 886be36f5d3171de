use std::future::Future;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::event::{Event, Listener, ListenerList};

/// Forwards events from a [`ListenerList`] to an async handler running on its own task.
///
/// Listener callbacks run synchronously inside `dispatch`, so they only push the
/// extracted payload into a channel. The task drains the channel in order, one
/// handler call at a time. Dropping the subscription deregisters the listener and
/// aborts the task; [`Subscription::finish`] lets queued payloads drain first.
pub struct Subscription<E: Event> {
    listener: Option<Listener<E>>,
    task: Option<JoinHandle<()>>,
}

impl<E: Event> Subscription<E> {
    /// Must be called from within a tokio runtime.
    pub fn spawn<T, X, H, Fut>(listeners: &ListenerList<E>, extract: X, mut handler: H) -> Self
    where
        T: Send + 'static,
        X: Fn(&E) -> Option<T> + Send + Sync + 'static,
        H: FnMut(T) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send,
    {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let listener = listeners.listen(move |event: &E| {
            if let Some(payload) = extract(event) {
                // The receiver is gone only while shutting down.
                let _ = tx.send(payload);
            }
        });
        let task = tokio::spawn(async move {
            while let Some(payload) = rx.recv().await {
                handler(payload).await;
            }
            debug!("Subscription channel closed");
        });
        Subscription { listener: Some(listener), task: Some(task) }
    }

    /// Stops listening and waits until every payload already queued is handled.
    pub async fn finish(mut self) {
        self.listener.take();
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl<E: Event> Drop for Subscription<E> {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl<E: Event> std::fmt::Debug for Subscription<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("listening", &self.listener.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::event::define_event_listeners;

    #[derive(Debug, Clone)]
    pub struct Word(&'static str);
    impl Event for Word {}

    define_event_listeners!(WordEvents { word: Word });

    fn collector() -> (Arc<Mutex<Vec<&'static str>>>, impl FnMut(&'static str) -> std::future::Ready<()> + Send + 'static) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        (seen, move |w| {
            sink.lock().unwrap().push(w);
            std::future::ready(())
        })
    }

    #[tokio::test]
    async fn test_payloads_are_handled_in_order() {
        let events = WordEvents::new();
        let (seen, handler) = collector();
        let subscription = Subscription::spawn(&events.word, |w: &Word| Some(w.0), handler);

        events.word.dispatch(&Word("a"));
        events.word.dispatch(&Word("b"));
        subscription.finish().await;

        assert_eq!(*seen.lock().unwrap(), vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_extract_filters_events() {
        let events = WordEvents::new();
        let (seen, handler) = collector();
        let subscription = Subscription::spawn(
            &events.word,
            |w: &Word| (w.0 != "skip").then_some(w.0),
            handler,
        );

        events.word.dispatch(&Word("skip"));
        events.word.dispatch(&Word("keep"));
        subscription.finish().await;

        assert_eq!(*seen.lock().unwrap(), vec!["keep"]);
    }

    #[tokio::test]
    async fn test_dropped_subscription_stops_listening() {
        let events = WordEvents::new();
        let (seen, handler) = collector();
        drop(Subscription::spawn(&events.word, |w: &Word| Some(w.0), handler));

        events.word.dispatch(&Word("late"));
        assert!(seen.lock().unwrap().is_empty());
        assert!(events.word.is_empty());
    }
}
