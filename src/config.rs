//! Configuration file handling for budgetmaster.
//!
//! The configuration file is stored at `$BUDGET_HOME/config.json` and contains settings for the
//! application such as how many backups to keep, how many recent transactions the dashboard shows
//! and where the store lives.

use crate::backup::Backup;
use crate::store::{FileStore, MemoryStore, Storage, StoreMode};
use crate::{utils, Result};
use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

const APP_NAME: &str = "budgetmaster";
const CONFIG_VERSION: u8 = 1;
const BACKUP_COPIES: u32 = 5;
const RECENT_LIMIT: usize = 5;
const WATCH_INTERVAL_MS: u64 = 1000;
const BACKUPS: &str = ".backups";
const STORE: &str = "store";
const CONFIG_JSON: &str = "config.json";

/// The `Config` object represents the configuration of the app. You instantiate it by providing
/// the path to `$BUDGET_HOME` and from there it loads `$BUDGET_HOME/config.json`. It provides
/// paths to other items that are either configurable or are expected in a certain location within
/// the home directory.
#[derive(Debug, Clone)]
pub struct Config {
    root: PathBuf,
    backups: PathBuf,
    config_path: PathBuf,
    config_file: ConfigFile,
}

impl Config {
    /// Creates the home directory, its subdirectories and an initial `config.json` with default
    /// settings.
    ///
    /// # Errors
    /// - Returns an error if `dir` already holds a `config.json`.
    /// - Returns an error if any file operations fail.
    pub async fn create(dir: impl Into<PathBuf>) -> Result<Self> {
        let maybe_relative = dir.into();
        utils::make_dir(&maybe_relative)
            .await
            .context("Unable to create the budgetmaster home directory")?;
        let root = utils::canonicalize(&maybe_relative).await?;

        let config_path = root.join(CONFIG_JSON);
        if config_path.is_file() {
            bail!(
                "budgetmaster is already initialized at '{}'",
                root.display()
            )
        }

        let backups = root.join(BACKUPS);
        utils::make_dir(&backups).await?;
        utils::make_dir(&root.join(STORE)).await?;

        let config_file = ConfigFile::default();
        config_file.save(&config_path).await?;
        debug!("Created {}", config_path.display());

        Ok(Self {
            root,
            backups,
            config_path,
            config_file,
        })
    }

    /// This will
    /// - validate that the `budget_home` exists and that the config file exists
    /// - load the config file
    /// - validate that the backups directory exists
    /// - return the loaded configuration object
    pub async fn load(budget_home: impl Into<PathBuf>) -> Result<Self> {
        let maybe_relative = budget_home.into();
        let root = utils::canonicalize(&maybe_relative)
            .await
            .context("The budgetmaster home directory is missing, did you run 'budget init'?")?;

        let config_path = root.join(CONFIG_JSON);
        if !config_path.is_file() {
            bail!(
                "The config file is missing '{}', did you run 'budget init'?",
                config_path.display()
            )
        }
        let config_file = ConfigFile::load(&config_path).await?;

        let config = Self {
            backups: root.join(BACKUPS),
            root,
            config_path,
            config_file,
        };
        if !config.backups.is_dir() {
            bail!(
                "The backups directory is missing '{}'",
                config.backups.display()
            )
        }
        Ok(config)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn backups(&self) -> &Path {
        &self.backups
    }

    pub fn backup_copies(&self) -> u32 {
        self.config_file.backup_copies
    }

    /// How many transactions the dashboard lists.
    pub fn recent_limit(&self) -> usize {
        self.config_file.recent_limit
    }

    /// How often `budget watch` checks the store for changes made by other processes.
    pub fn watch_interval(&self) -> Duration {
        Duration::from_millis(self.config_file.watch_interval_ms.max(1))
    }

    /// Returns the stored `store_path` if it is absolute, otherwise resolves it against the home
    /// directory.
    pub fn store_path(&self) -> PathBuf {
        let p = self.config_file.store_path();
        if p.is_absolute() {
            return p;
        }
        self.root.join(p)
    }

    /// Creates a new `Backup` instance for managing backup files.
    pub fn backup(&self) -> Backup {
        Backup::new(self)
    }

    /// Opens the store selected by `mode`. With `watch`, the file store also polls its directory
    /// for changes made by other processes.
    pub async fn storage(&self, mode: StoreMode, watch: bool) -> Result<Storage> {
        match mode {
            StoreMode::Memory => {
                debug!("Using the in-memory store");
                Ok(Storage::new(MemoryStore::new()))
            }
            StoreMode::File => {
                let mut store = FileStore::open(self.store_path()).await?;
                if watch {
                    store.watch(self.watch_interval());
                }
                Ok(Storage::new(store))
            }
        }
    }
}

/// Represents the serialization and deserialization format of the configuration file.
///
/// Example configuration:
/// ```json
/// {
///   "app_name": "budgetmaster",
///   "config_version": 1,
///   "backup_copies": 5,
///   "recent_limit": 5,
///   "watch_interval_ms": 1000,
///   "store_path": "store"
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
struct ConfigFile {
    /// Application name, should always be "budgetmaster"
    app_name: String,

    /// Configuration file version
    config_version: u8,

    /// Number of backup copies to keep
    #[serde(default = "default_backup_copies")]
    backup_copies: u32,

    /// Number of transactions shown on the dashboard
    #[serde(default = "default_recent_limit")]
    recent_limit: usize,

    /// Polling interval of `budget watch`, in milliseconds
    #[serde(default = "default_watch_interval_ms")]
    watch_interval_ms: u64,

    /// Path to the store directory (optional, relative to config.json or absolute)
    /// Defaults to $BUDGET_HOME/store if not specified
    #[serde(skip_serializing_if = "Option::is_none")]
    store_path: Option<PathBuf>,
}

fn default_backup_copies() -> u32 {
    BACKUP_COPIES
}

fn default_recent_limit() -> usize {
    RECENT_LIMIT
}

fn default_watch_interval_ms() -> u64 {
    WATCH_INTERVAL_MS
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            app_name: APP_NAME.to_string(),
            config_version: CONFIG_VERSION,
            backup_copies: BACKUP_COPIES,
            recent_limit: RECENT_LIMIT,
            watch_interval_ms: WATCH_INTERVAL_MS,
            store_path: None,
        }
    }
}

impl ConfigFile {
    /// Loads a ConfigFile asynchronously from the specified path.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed, or if it belongs to another app
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = utils::read(path).await?;

        let config: ConfigFile = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file at {}", path.display()))?;

        anyhow::ensure!(
            config.app_name == APP_NAME,
            "Invalid app_name in config file: expected '{}', got '{}'",
            APP_NAME,
            config.app_name
        );

        Ok(config)
    }

    /// Saves the ConfigFile to the specified path.
    pub async fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let p = path.as_ref();
        let data = serde_json::to_string_pretty(self).context("Unable to serialize config")?;
        utils::write(p, data)
            .await
            .context("Unable to write config file")
    }

    /// Gets the store path. If None, defaults to `store`.
    pub fn store_path(&self) -> PathBuf {
        self.store_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(STORE))
    }
}
