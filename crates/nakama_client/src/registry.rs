//! Pending continuations keyed by request handle.

use crate::handle::RequestHandle;
use std::collections::HashMap;
use tracing::warn;

/// A stored continuation for one result shape.
pub type Callback<T> = Box<dyn FnOnce(T) + Send + 'static>;

/// Holds at most one pending continuation per handle for a single result type.
///
/// Entries are inserted when a request is issued and removed when it resolves.
/// Resolving an unknown handle is a silent no-op since fire-and-forget calls
/// never register anything.
pub struct CallbackRegistry<T> {
    entries: HashMap<RequestHandle, Callback<T>>,
}

impl<T> CallbackRegistry<T> {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Stores `callback` under `handle`. The sentinel handle is ignored.
    pub fn register(&mut self, handle: RequestHandle, callback: Callback<T>) {
        if handle.is_none() {
            return;
        }
        if self.entries.insert(handle, callback).is_some() {
            warn!(handle = %handle, "⚠️ Replaced a pending callback for a reused handle");
        }
    }

    /// Invokes and removes the continuation for `handle`.
    ///
    /// Returns `true` when a continuation ran.
    pub fn resolve(&mut self, handle: RequestHandle, value: T) -> bool {
        match self.entries.remove(&handle) {
            Some(callback) => {
                callback(value);
                true
            }
            None => false,
        }
    }

    /// Removes the continuation for `handle` without running it.
    pub fn discard(&mut self, handle: RequestHandle) -> bool {
        self.entries.remove(&handle).is_some()
    }

    pub fn contains(&self, handle: RequestHandle) -> bool {
        self.entries.contains_key(&handle)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drops every pending continuation without running any of them.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl<T> Default for CallbackRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> std::fmt::Debug for CallbackRegistry<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallbackRegistry")
            .field("pending", &self.entries.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    fn counting(counter: &Arc<AtomicUsize>) -> Callback<u32> {
        let counter = counter.clone();
        Box::new(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[test]
    fn test_resolve_fires_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut registry = CallbackRegistry::new();
        registry.register(RequestHandle(7), counting(&calls));

        assert!(registry.resolve(RequestHandle(7), 1));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(registry.is_empty());

        assert!(!registry.resolve(RequestHandle(7), 2));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_resolve_unknown_handle_is_noop() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut registry = CallbackRegistry::new();
        registry.register(RequestHandle(1), counting(&calls));

        assert!(!registry.resolve(RequestHandle(2), 0));
        assert!(!registry.resolve(RequestHandle::NONE, 0));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_register_sentinel_is_ignored() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut registry = CallbackRegistry::new();
        registry.register(RequestHandle::NONE, counting(&calls));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_value_reaches_callback() {
        let received = Arc::new(Mutex::new(None));
        let sink = received.clone();
        let mut registry: CallbackRegistry<String> = CallbackRegistry::new();
        registry.register(
            RequestHandle(3),
            Box::new(move |value| *sink.lock().unwrap() = Some(value)),
        );
        registry.resolve(RequestHandle(3), "hello".to_string());
        assert_eq!(received.lock().unwrap().as_deref(), Some("hello"));
    }

    #[test]
    fn test_discard_and_clear_do_not_invoke() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut registry = CallbackRegistry::new();
        registry.register(RequestHandle(1), counting(&calls));
        registry.register(RequestHandle(2), counting(&calls));
        registry.register(RequestHandle(3), counting(&calls));

        assert!(registry.discard(RequestHandle(1)));
        assert!(!registry.discard(RequestHandle(1)));
        registry.clear();
        assert!(registry.is_empty());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }
}
