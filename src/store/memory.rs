//! Implements the `Store` trait in memory.
//!
//! Note: this is compiled even in the "production" version of this app so that the whole program
//! can run without a data directory (see `StoreMode::Memory`).

use crate::store::{channel, validate_key, ContextId, Store, StoreEvent, Subscription};
use crate::Result;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::{broadcast, Mutex};

#[derive(Debug)]
struct Shared {
    data: Mutex<BTreeMap<String, String>>,
    tx: broadcast::Sender<StoreEvent>,
}

/// An in-memory `Store`. Handles created with `new_context` share the same data and see each
/// other's changes, the way two browser tabs share local storage.
#[derive(Debug)]
pub struct MemoryStore {
    shared: Arc<Shared>,
    context: ContextId,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Shared {
                data: Mutex::new(BTreeMap::new()),
                tx: channel(),
            }),
            context: ContextId::new(),
        }
    }

    /// Creates another handle, with its own identity, on the same data.
    pub fn new_context(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
            context: ContextId::new(),
        }
    }

    fn notify(&self, key: &str, new_value: Option<String>) {
        // Nobody listening is fine.
        let _ = self
            .shared
            .tx
            .send(StoreEvent::new(key, new_value, self.context));
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl Store for MemoryStore {
    fn context(&self) -> ContextId {
        self.context
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        validate_key(key)?;
        Ok(self.shared.data.lock().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        validate_key(key)?;
        self.shared
            .data
            .lock()
            .await
            .insert(key.to_string(), value.to_string());
        self.notify(key, Some(value.to_string()));
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        validate_key(key)?;
        let removed = self.shared.data.lock().await.remove(key);
        if removed.is_some() {
            self.notify(key, None);
        }
        Ok(())
    }

    fn subscribe(&self) -> Subscription {
        Subscription::new(self.shared.tx.subscribe(), self.context)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_contexts_share_data() {
        let a = MemoryStore::new();
        let b = a.new_context();
        a.set("k", "1").await.unwrap();
        assert_eq!(b.get("k").await.unwrap().as_deref(), Some("1"));
        assert_ne!(a.context(), b.context());
    }

    #[tokio::test]
    async fn test_other_context_is_notified() {
        let a = MemoryStore::new();
        let b = a.new_context();
        let mut sub_a = a.subscribe();
        let mut sub_b = b.subscribe();

        a.set("k", "1").await.unwrap();

        let event = sub_b.try_next().unwrap();
        assert_eq!(event.key(), "k");
        assert_eq!(event.new_value(), Some("1"));
        assert_eq!(event.origin(), a.context());

        // A context never hears about its own writes.
        assert!(sub_a.try_next().is_none());
    }

    #[tokio::test]
    async fn test_remove_notifies_without_value() {
        let a = MemoryStore::new();
        let b = a.new_context();
        a.set("k", "1").await.unwrap();
        let mut sub_b = b.subscribe();

        a.remove("k").await.unwrap();
        let event = sub_b.next().await.unwrap();
        assert_eq!(event.new_value(), None);

        // Removing a missing key is silent.
        a.remove("k").await.unwrap();
        assert!(sub_b.try_next().is_none());
    }
}
