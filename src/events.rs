//! Content change notifications.
//!
//! Writers dispatch a [`SlotEvent`] after every successful mutation; handlers
//! registered at startup react to it (the cache clears itself).

use std::sync::{Arc, RwLock};

use crate::cache::SlotsCache;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotEvent {
    Created { id: i64 },
    Updated { id: i64 },
    Deleted { id: i64 },
    MetaChanged { id: i64 },
}

type Handler = Box<dyn Fn(&SlotEvent) + Send + Sync>;

#[derive(Default)]
pub struct Dispatcher {
    handlers: RwLock<Vec<Handler>>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F>(&self, handler: F)
    where
        F: Fn(&SlotEvent) + Send + Sync + 'static,
    {
        match self.handlers.write() {
            Ok(mut handlers) => handlers.push(Box::new(handler)),
            Err(poisoned) => poisoned.into_inner().push(Box::new(handler)),
        }
    }

    pub fn dispatch(&self, event: SlotEvent) {
        tracing::debug!(?event, "Dispatching slot event");
        let handlers = match self.handlers.read() {
            Ok(h) => h,
            Err(poisoned) => poisoned.into_inner(),
        };
        for handler in handlers.iter() {
            handler(&event);
        }
    }
}

/// Any slot change invalidates every cached query.
pub fn register_cache_invalidation(dispatcher: &Dispatcher, cache: Arc<SlotsCache>) {
    dispatcher.register(move |_| cache.clear_all());
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use super::*;

    #[test]
    fn handlers_receive_events() {
        let dispatcher = Dispatcher::new();
        let seen = Arc::new(AtomicUsize::new(0));
        let counter = seen.clone();
        dispatcher.register(move |event| {
            if matches!(event, SlotEvent::MetaChanged { id: 3 }) {
                counter.fetch_add(1, Ordering::SeqCst);
            }
        });
        let total = Arc::new(AtomicUsize::new(0));
        let all = total.clone();
        dispatcher.register(move |_| {
            all.fetch_add(1, Ordering::SeqCst);
        });
        dispatcher.dispatch(SlotEvent::MetaChanged { id: 3 });
        dispatcher.dispatch(SlotEvent::Created { id: 4 });
        assert_eq!(seen.load(Ordering::SeqCst), 1);
        assert_eq!(total.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn cache_cleared_on_any_event() {
        let cache = Arc::new(SlotsCache::new(true, Duration::from_secs(60)));
        let dispatcher = Dispatcher::new();
        register_cache_invalidation(&dispatcher, cache.clone());

        cache.set("grid_recent_12", &vec![1u32]);
        dispatcher.dispatch(SlotEvent::Deleted { id: 1 });
        assert!(cache.is_empty());
    }
}
