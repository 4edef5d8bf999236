use crate::commands::Out;
use crate::{Config, Result};
use anyhow::Context;
use std::path::{Path, PathBuf};

/// Creates the data directory, its subdirectories and an initial `config.json` file with default
/// settings.
///
/// # Arguments
/// - `budget_home` - The directory that will be the root of data directory, e.g.
///   `$HOME/budgetmaster`
///
/// # Errors
/// - Returns an error if the directory is already initialized or if any file operations fail.
pub async fn init(budget_home: &Path) -> Result<Out<PathBuf>> {
    let config = Config::create(budget_home)
        .await
        .context("Unable to create the data directory and configs")?;
    Ok(Out::new(
        format!(
            "Successfully created the budgetmaster directory at {}",
            config.root().display()
        ),
        config.root().to_path_buf(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_init() {
        let dir = TempDir::new().unwrap();
        let home = dir.path().join("home");
        let out = init(&home).await.unwrap();
        assert!(out.message().contains("Successfully created"));
        assert!(Config::load(&home).await.is_ok());

        // A second init leaves the existing directory alone.
        assert!(init(&home).await.is_err());
    }
}
