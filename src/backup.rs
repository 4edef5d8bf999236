//! Backup management for local file backups taken before destructive operations.

use crate::transfer::Snapshot;
use crate::{utils, Config, Result};
use anyhow::Context;
use chrono::Local;
use std::path::PathBuf;
use tracing::debug;

/// Prefix for backups taken before an import replaces the stored data.
pub const PRE_IMPORT: &str = "pre-import";

/// Prefix for backups taken before all data is cleared.
pub const PRE_CLEAR: &str = "pre-clear";

const EXTENSION: &str = "json";

/// Manages backup file creation and rotation.
///
/// The `Backup` struct is immutable and owns copies of the paths and settings it needs.
/// Create a new instance via `Config::backup()` or `Backup::new()`.
#[derive(Debug, Clone)]
pub struct Backup {
    backups_dir: PathBuf,
    backup_copies: u32,
}

impl Backup {
    /// Creates a new `Backup` instance from a `Config`.
    pub fn new(config: &Config) -> Self {
        Self {
            backups_dir: config.backups().to_path_buf(),
            backup_copies: config.backup_copies(),
        }
    }

    /// Saves a `Snapshot` as a pretty-printed JSON backup file.
    ///
    /// The filename format is `{prefix}.YYYY-MM-DD-NNN.json` where NNN is a sequence number.
    /// Automatically rotates old backups, keeping only `backup_copies` files.
    ///
    /// Returns the path to the created backup file.
    pub async fn save_json(&self, prefix: &str, data: &Snapshot) -> Result<PathBuf> {
        let date = today();
        let seq = self.next_sequence_number(prefix, &date).await?;
        let filename = format!("{prefix}.{date}-{seq:03}.{EXTENSION}");
        let path = self.backups_dir.join(&filename);

        let json = data.to_json().context("Failed to serialize the backup")?;
        utils::write(&path, json).await?;
        debug!("Wrote backup {}", path.display());

        self.rotate(prefix).await?;

        Ok(path)
    }

    /// Scans the backups directory for existing files with the given prefix and date,
    /// and returns the next sequence number.
    async fn next_sequence_number(&self, prefix: &str, date: &str) -> Result<u32> {
        let mut max_seq: u32 = 0;

        let mut dir = utils::read_dir(&self.backups_dir).await?;
        while let Some(entry) = dir
            .next_entry()
            .await
            .context("Failed to read directory entry")?
        {
            let file_name = entry.file_name();
            let name = file_name.to_string_lossy();
            if let Some(seq) = parse_sequence_number(&name, prefix, date) {
                max_seq = max_seq.max(seq);
            }
        }

        Ok(max_seq + 1)
    }

    /// Rotates old backup files, keeping only `backup_copies` files with the given prefix.
    async fn rotate(&self, prefix: &str) -> Result<()> {
        let mut files: Vec<(PathBuf, String)> = Vec::new();

        let mut dir = utils::read_dir(&self.backups_dir).await?;
        while let Some(entry) = dir
            .next_entry()
            .await
            .context("Failed to read directory entry")?
        {
            let name = entry.file_name().to_string_lossy().to_string();
            if is_backup_file(&name, prefix) {
                files.push((entry.path(), name));
            }
        }

        // Sorting by name sorts by date and then sequence number.
        files.sort_by(|a, b| a.1.cmp(&b.1));

        let to_delete = files.len().saturating_sub(self.backup_copies as usize);
        for (path, _) in files.into_iter().take(to_delete) {
            debug!("Rotating out backup {}", path.display());
            utils::remove(&path).await?;
        }

        Ok(())
    }
}

/// Returns today's date in YYYY-MM-DD format.
fn today() -> String {
    Local::now().format("%Y-%m-%d").to_string()
}

/// Parses the sequence number from a backup filename.
/// Returns None if the filename doesn't match the expected pattern.
fn parse_sequence_number(filename: &str, prefix: &str, date: &str) -> Option<u32> {
    filename
        .strip_prefix(&format!("{prefix}.{date}-"))?
        .strip_suffix(&format!(".{EXTENSION}"))?
        .parse()
        .ok()
}

/// Checks if a filename is a backup file with the given prefix.
fn is_backup_file(filename: &str, prefix: &str) -> bool {
    filename.starts_with(&format!("{prefix}.")) && filename.ends_with(&format!(".{EXTENSION}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::TestEnv;

    #[test]
    fn test_parse_sequence_number() {
        assert_eq!(
            parse_sequence_number("pre-import.2025-12-14-001.json", "pre-import", "2025-12-14"),
            Some(1)
        );
        assert_eq!(
            parse_sequence_number("pre-import.2025-12-14-042.json", "pre-import", "2025-12-14"),
            Some(42)
        );
        // Wrong prefix
        assert_eq!(
            parse_sequence_number("pre-clear.2025-12-14-001.json", "pre-import", "2025-12-14"),
            None
        );
        // Wrong date
        assert_eq!(
            parse_sequence_number("pre-import.2025-12-13-001.json", "pre-import", "2025-12-14"),
            None
        );
        // Wrong extension
        assert_eq!(
            parse_sequence_number("pre-import.2025-12-14-001.txt", "pre-import", "2025-12-14"),
            None
        );
    }

    #[test]
    fn test_is_backup_file() {
        assert!(is_backup_file("pre-import.2025-12-14-001.json", "pre-import"));
        assert!(is_backup_file("pre-clear.2025-12-14-001.json", "pre-clear"));
        assert!(!is_backup_file("pre-import.2025-12-14-001.json", "pre-clear"));
        assert!(!is_backup_file("pre-import.2025-12-14-001", "pre-import"));
    }

    #[tokio::test]
    async fn test_save_json_sequences_and_rotates() {
        let env = TestEnv::new().await;
        let backup = env.config().backup();
        let snapshot = Snapshot::default();

        let first = backup.save_json(PRE_IMPORT, &snapshot).await.unwrap();
        assert!(first.to_string_lossy().ends_with("-001.json"));
        let written = utils::read(&first).await.unwrap();
        assert_eq!(crate::transfer::parse(&written).unwrap(), snapshot);

        for _ in 0..6 {
            backup.save_json(PRE_IMPORT, &snapshot).await.unwrap();
        }
        backup.save_json(PRE_CLEAR, &snapshot).await.unwrap();

        let mut names = Vec::new();
        let mut dir = utils::read_dir(env.config().backups()).await.unwrap();
        while let Some(entry) = dir.next_entry().await.unwrap() {
            names.push(entry.file_name().to_string_lossy().to_string());
        }
        names.sort();
        let imports: Vec<&String> = names.iter().filter(|n| is_backup_file(n, PRE_IMPORT)).collect();
        assert_eq!(imports.len(), 5);
        assert!(imports[0].ends_with("-003.json"));
        assert!(imports[4].ends_with("-007.json"));
        assert_eq!(names.iter().filter(|n| is_backup_file(n, PRE_CLEAR)).count(), 1);
    }
}
