//! Local key-value persistence for the financial state.
//!
//! A `Store` holds string values under string keys. Each store handle is an execution context
//! (the CLI equivalent of a browser tab); handles that share a backing store notify each other of
//! changes through a `Subscription`, but never notify themselves.
//!
//! `Storage` wraps a `Store` and is the adapter the rest of the program uses. It serializes
//! values to JSON and treats persistence as best-effort: failures are logged, not returned.

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use crate::Result;
use anyhow::Context;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt::{Display, Formatter};
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::{RecvError, TryRecvError};
use tracing::{error, trace, warn};
use uuid::Uuid;

/// Key of the transactions collection.
pub const TRANSACTIONS_KEY: &str = "budgetmaster-transactions";

/// Key of the budgets collection.
pub const BUDGETS_KEY: &str = "budgetmaster-budgets";

/// Key of the last-selected view. Not part of the financial state.
pub const ACTIVE_TAB_KEY: &str = "budgetmaster-active-tab";

/// How many change notifications a slow subscriber may fall behind before it starts missing them.
const CHANNEL_CAPACITY: usize = 64;

/// Identifies the store handle (execution context) that made a change.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub struct ContextId(Uuid);

impl ContextId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// The origin used for changes that were made outside this process.
    pub fn external() -> Self {
        Self(Uuid::nil())
    }
}

impl Default for ContextId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for ContextId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.0, f)
    }
}

/// A change to one key, made by some execution context.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct StoreEvent {
    key: String,
    new_value: Option<String>,
    origin: ContextId,
}

impl StoreEvent {
    pub fn new(key: impl Into<String>, new_value: Option<String>, origin: ContextId) -> Self {
        Self {
            key: key.into(),
            new_value,
            origin,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// The value now stored under `key`, or `None` if the key was removed.
    pub fn new_value(&self) -> Option<&str> {
        self.new_value.as_deref()
    }

    pub fn origin(&self) -> ContextId {
        self.origin
    }
}

/// Creates the sending half of a change-notification channel.
pub(crate) fn channel() -> broadcast::Sender<StoreEvent> {
    broadcast::channel(CHANNEL_CAPACITY).0
}

/// Receives changes made by other execution contexts. Delivery is at most once per change and is
/// not guaranteed: a subscriber that falls too far behind skips the changes it missed.
#[derive(Debug)]
pub struct Subscription {
    rx: broadcast::Receiver<StoreEvent>,
    own: ContextId,
}

impl Subscription {
    pub(crate) fn new(rx: broadcast::Receiver<StoreEvent>, own: ContextId) -> Self {
        Self { rx, own }
    }

    /// Waits for the next change made by another context. Returns `None` once the store is gone.
    pub async fn next(&mut self) -> Option<StoreEvent> {
        loop {
            match self.rx.recv().await {
                Ok(event) if event.origin == self.own => continue,
                Ok(event) => return Some(event),
                Err(RecvError::Lagged(missed)) => {
                    warn!("Missed {missed} storage change notifications");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }

    /// Returns the next pending change made by another context without waiting.
    pub fn try_next(&mut self) -> Option<StoreEvent> {
        loop {
            match self.rx.try_recv() {
                Ok(event) if event.origin == self.own => continue,
                Ok(event) => return Some(event),
                Err(TryRecvError::Lagged(missed)) => {
                    warn!("Missed {missed} storage change notifications");
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => return None,
            }
        }
    }
}

/// A key-value store shared by one or more execution contexts.
#[async_trait::async_trait]
pub trait Store: Send + Sync {
    /// The identity of this handle. Changes it makes are reported with this origin.
    fn context(&self) -> ContextId;

    /// Returns the value under `key`, or `None` if there is none.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Writes `value` under `key` and notifies other contexts.
    async fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Removes `key`, if present, and notifies other contexts.
    async fn remove(&self, key: &str) -> Result<()>;

    /// Subscribes to changes made by other contexts.
    fn subscribe(&self) -> Subscription;
}

/// Selects the store backend. When `BUDGET_IN_MEMORY` is set and non-empty the program runs
/// against an empty in-memory store, which lets the whole app run top-to-bottom without touching
/// the data directory.
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq)]
pub enum StoreMode {
    #[default]
    File,
    Memory,
}

impl StoreMode {
    pub fn from_env() -> Self {
        match std::env::var("BUDGET_IN_MEMORY") {
            Ok(value) if !value.is_empty() => StoreMode::Memory,
            _ => StoreMode::File,
        }
    }
}

/// The persistent store adapter.
#[derive(Clone)]
pub struct Storage {
    store: Arc<dyn Store>,
}

impl std::fmt::Debug for Storage {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Storage")
            .field("context", &self.store.context())
            .finish()
    }
}

impl Storage {
    pub fn new(store: impl Store + 'static) -> Self {
        Self {
            store: Arc::new(store),
        }
    }

    /// Serializes `value` and writes it under `key`. Failures are logged and otherwise ignored.
    pub async fn save<T>(&self, key: &str, value: &T)
    where
        T: Serialize + ?Sized,
    {
        if let Err(e) = self.write(key, value).await {
            error!("Failed to save '{key}': {e:#}");
        }
    }

    /// Serializes `value` and writes it under `key`, returning any failure to the caller.
    pub async fn write<T>(&self, key: &str, value: &T) -> Result<()>
    where
        T: Serialize + ?Sized,
    {
        let json = serde_json::to_string(value)
            .with_context(|| format!("Unable to serialize the value for '{key}'"))?;
        trace!("Writing {} bytes to '{key}'", json.len());
        self.store.set(key, &json).await
    }

    /// Deserializes the value under `key`. Returns `default` when the key is absent, unreadable or
    /// does not deserialize.
    pub async fn load<T>(&self, key: &str, default: T) -> T
    where
        T: DeserializeOwned,
    {
        let raw = match self.store.get(key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return default,
            Err(e) => {
                error!("Failed to load '{key}': {e:#}");
                return default;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(value) => value,
            Err(e) => {
                error!("Failed to parse the stored value of '{key}': {e}");
                default
            }
        }
    }

    /// Returns the raw stored value under `key`.
    pub async fn read_raw(&self, key: &str) -> Result<Option<String>> {
        self.store.get(key).await
    }

    /// Writes a raw, already serialized value under `key`.
    pub async fn write_raw(&self, key: &str, value: &str) -> Result<()> {
        self.store.set(key, value).await
    }

    /// Removes `key`, returning any failure to the caller.
    pub async fn delete(&self, key: &str) -> Result<()> {
        self.store.remove(key).await
    }

    /// Removes `key`. Failures are logged and otherwise ignored.
    pub async fn remove(&self, key: &str) {
        if let Err(e) = self.store.remove(key).await {
            error!("Failed to remove '{key}': {e:#}");
        }
    }

    pub fn subscribe(&self) -> Subscription {
        self.store.subscribe()
    }

    pub fn context(&self) -> ContextId {
        self.store.context()
    }
}

/// Store keys become file names, so they are limited to a safe character set.
pub(crate) fn validate_key(key: &str) -> Result<()> {
    anyhow::ensure!(
        !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'),
        "Invalid storage key '{key}'"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
    struct Thing {
        name: String,
    }

    #[tokio::test]
    async fn test_save_and_load() {
        let storage = Storage::new(MemoryStore::new());
        let value = vec![Thing {
            name: "a".to_string(),
        }];
        storage.save("things", &value).await;
        let loaded: Vec<Thing> = storage.load("things", Vec::new()).await;
        assert_eq!(loaded, value);
    }

    #[tokio::test]
    async fn test_load_missing_returns_default() {
        let storage = Storage::new(MemoryStore::new());
        let loaded: Vec<Thing> = storage.load("nothing", Vec::new()).await;
        assert!(loaded.is_empty());
    }

    #[tokio::test]
    async fn test_load_garbage_returns_default() {
        let storage = Storage::new(MemoryStore::new());
        storage.write_raw("things", "{not json").await.unwrap();
        let loaded: Vec<Thing> = storage
            .load(
                "things",
                vec![Thing {
                    name: "fallback".to_string(),
                }],
            )
            .await;
        assert_eq!(loaded[0].name, "fallback");
    }

    #[tokio::test]
    async fn test_save_invalid_key_is_swallowed() {
        let storage = Storage::new(MemoryStore::new());
        // Does not panic or return an error.
        storage.save("../escape", &1).await;
        assert!(storage.write("../escape", &1).await.is_err());
        assert!(storage.read_raw("../escape").await.is_err());
    }

    #[tokio::test]
    async fn test_remove() {
        let storage = Storage::new(MemoryStore::new());
        storage.save("k", &1).await;
        storage.remove("k").await;
        assert_eq!(storage.read_raw("k").await.unwrap(), None);
        // Removing again is fine.
        storage.remove("k").await;
    }

    #[test]
    fn test_validate_key() {
        assert!(validate_key(TRANSACTIONS_KEY).is_ok());
        assert!(validate_key(ACTIVE_TAB_KEY).is_ok());
        assert!(validate_key("").is_err());
        assert!(validate_key("a/b").is_err());
        assert!(validate_key("a.json").is_err());
    }

    #[test]
    fn test_store_mode_default() {
        assert_eq!(StoreMode::default(), StoreMode::File);
    }
}
