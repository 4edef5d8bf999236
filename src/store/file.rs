//! Implements the `Store` trait with one JSON file per key in a directory.
//!
//! Handles opened in the same process share a notification channel. Changes made by other
//! processes are picked up by an optional background watcher that polls the directory.

use crate::store::{channel, validate_key, ContextId, Store, StoreEvent, Subscription};
use crate::{utils, Result};
use anyhow::Context;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

const EXTENSION: &str = "json";

#[derive(Debug)]
struct Shared {
    dir: PathBuf,
    tx: broadcast::Sender<StoreEvent>,
    /// The last contents of each key file seen or written by this process. Holding the lock
    /// across a write keeps the watcher from reporting this process's own writes.
    known: Mutex<HashMap<String, String>>,
}

/// A `Store` that keeps each key in `<dir>/<key>.json`.
#[derive(Debug)]
pub struct FileStore {
    shared: Arc<Shared>,
    context: ContextId,
    watcher: Option<JoinHandle<()>>,
}

impl FileStore {
    /// Opens (creating if needed) the store directory at `dir`.
    pub async fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        utils::make_dir(&dir)
            .await
            .context("Unable to create the store directory")?;
        let known = scan(&dir).await?;
        debug!("Opened store at {} with {} keys", dir.display(), known.len());
        Ok(Self {
            shared: Arc::new(Shared {
                dir,
                tx: channel(),
                known: Mutex::new(known),
            }),
            context: ContextId::new(),
            watcher: None,
        })
    }

    /// Creates another handle, with its own identity, on the same directory.
    pub fn new_context(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
            context: ContextId::new(),
            watcher: None,
        }
    }

    /// Starts polling the directory every `interval` for changes made by other processes. Each
    /// changed, added or removed key file is reported once, with an external origin. Calling this
    /// again replaces the running watcher.
    pub fn watch(&mut self, interval: Duration) {
        self.close();
        let shared = Arc::clone(&self.shared);
        self.watcher = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                if let Err(e) = poll(&shared).await {
                    warn!("Unable to check the store for outside changes: {e:#}");
                }
            }
        }));
    }

    /// Stops the background watcher, if one is running.
    pub fn close(&mut self) {
        if let Some(handle) = self.watcher.take() {
            handle.abort();
        }
    }

    fn path(&self, key: &str) -> PathBuf {
        self.shared.dir.join(format!("{key}.{EXTENSION}"))
    }

    fn notify(&self, key: &str, new_value: Option<String>) {
        let _ = self
            .shared
            .tx
            .send(StoreEvent::new(key, new_value, self.context));
    }
}

impl Drop for FileStore {
    fn drop(&mut self) {
        self.close();
    }
}

#[async_trait::async_trait]
impl Store for FileStore {
    fn context(&self) -> ContextId {
        self.context
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        validate_key(key)?;
        let path = self.path(key);
        if !path.is_file() {
            return Ok(None);
        }
        utils::read(&path).await.map(Some)
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        validate_key(key)?;
        let path = self.path(key);
        let tmp = path.with_extension(format!("{EXTENSION}.tmp"));
        let mut known = self.shared.known.lock().await;
        utils::write(&tmp, value).await?;
        utils::rename(&tmp, &path).await?;
        known.insert(key.to_string(), value.to_string());
        drop(known);
        trace!("Wrote {}", path.display());
        self.notify(key, Some(value.to_string()));
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        validate_key(key)?;
        let path = self.path(key);
        let mut known = self.shared.known.lock().await;
        known.remove(key);
        if !path.is_file() {
            return Ok(());
        }
        utils::remove(&path).await?;
        drop(known);
        self.notify(key, None);
        Ok(())
    }

    fn subscribe(&self) -> Subscription {
        Subscription::new(self.shared.tx.subscribe(), self.context)
    }
}

/// Reads every key file in `dir`.
async fn scan(dir: &Path) -> Result<HashMap<String, String>> {
    let mut found = HashMap::new();
    let mut entries = utils::read_dir(dir).await?;
    while let Some(entry) = entries
        .next_entry()
        .await
        .context("Failed to read directory entry")?
    {
        let path = entry.path();
        let key = match key_of(&path) {
            Some(key) => key,
            None => continue,
        };
        match utils::read(&path).await {
            Ok(contents) => {
                found.insert(key, contents);
            }
            // The file may have been removed between listing and reading.
            Err(e) => trace!("Skipping {}: {e:#}", path.display()),
        }
    }
    Ok(found)
}

/// Returns the key for a `<key>.json` path, or `None` for any other file.
fn key_of(path: &Path) -> Option<String> {
    if path.extension()? != EXTENSION {
        return None;
    }
    let key = path.file_stem()?.to_str()?;
    validate_key(key).ok()?;
    Some(key.to_string())
}

/// Compares the directory with what this process last saw and reports the differences.
async fn poll(shared: &Shared) -> Result<()> {
    let mut known = shared.known.lock().await;
    let current = scan(&shared.dir).await?;

    for (key, contents) in &current {
        if known.get(key) != Some(contents) {
            debug!("Key '{key}' was changed outside this process");
            let _ = shared.tx.send(StoreEvent::new(
                key.as_str(),
                Some(contents.clone()),
                ContextId::external(),
            ));
        }
    }
    for key in known.keys() {
        if !current.contains_key(key) {
            debug!("Key '{key}' was removed outside this process");
            let _ = shared
                .tx
                .send(StoreEvent::new(key.as_str(), None, ContextId::external()));
        }
    }

    *known = current;
    Ok(())
}
