//! Export, import and clear command handlers.

use crate::args::{ClearArgs, ExportArgs, ImportArgs};
use crate::backup::{PRE_CLEAR, PRE_IMPORT};
use crate::commands::{open_state, Out};
use crate::state::BudgetState;
use crate::store::StoreMode;
use crate::{transfer, utils, Config, Result};
use anyhow::{bail, Context};
use chrono::{Local, Utc};
use serde::Serialize;
use std::path::PathBuf;
use tracing::info;

/// What an import replaced the stored data with.
#[derive(Debug, Clone, Serialize)]
pub struct ImportSummary {
    pub transactions: usize,
    pub budgets: usize,
    /// The backup of the data that was replaced.
    pub backup: PathBuf,
}

/// Writes all transactions and budgets to a JSON file. Returns the path written.
pub async fn export(config: Config, mode: StoreMode, args: ExportArgs) -> Result<Out<PathBuf>> {
    let state = open_state(&config, mode).await?;
    let snapshot = transfer::export(&state, Utc::now());
    state.close();

    let path = match args.output() {
        Some(path) => path.to_path_buf(),
        None => PathBuf::from(transfer::export_file_name(Local::now().date_naive())),
    };
    utils::write(&path, snapshot.to_json()?).await?;

    let message = format!(
        "Exported {} transactions and {} budgets to {}",
        snapshot.transactions.len(),
        snapshot.budgets.len(),
        path.display()
    );
    Ok(Out::new(message, path))
}

/// Replaces all transactions and budgets with the contents of an exported file.
///
/// The file is fully validated first; if anything in it is wrong, nothing is changed. The data
/// being replaced is backed up before anything is written.
pub async fn import(
    config: Config,
    mode: StoreMode,
    args: ImportArgs,
) -> Result<Out<ImportSummary>> {
    let text = utils::read(args.path()).await?;
    let snapshot = transfer::parse(&text)
        .with_context(|| format!("Unable to import {}", args.path().display()))?;

    let storage = config.storage(mode, false).await?;
    let current = BudgetState::load(storage.clone()).await;
    let backup = config
        .backup()
        .save_json(PRE_IMPORT, &transfer::export(&current, Utc::now()))
        .await
        .context("Unable to back up the current data, nothing was imported")?;
    info!("Backed up the current data to {}", backup.display());
    current.close();

    transfer::import(&storage, &snapshot).await?;

    let state = BudgetState::load(storage).await;
    let summary = ImportSummary {
        transactions: state.transactions().len(),
        budgets: state.budgets().len(),
        backup,
    };
    state.close();

    let message = format!(
        "Imported {} transactions and {} budgets",
        summary.transactions, summary.budgets
    );
    Ok(Out::new(message, summary))
}

/// Deletes all transactions and budgets. Requires `--yes`.
pub async fn clear(config: Config, mode: StoreMode, args: ClearArgs) -> Result<Out<PathBuf>> {
    let mut state = open_state(&config, mode).await?;
    let transactions = state.transactions().len();
    let budgets = state.budgets().len();
    if !args.yes() {
        bail!(
            "This will permanently delete {transactions} transactions and {budgets} budgets. \
            Run again with --yes to confirm."
        )
    }

    let backup = config
        .backup()
        .save_json(PRE_CLEAR, &transfer::export(&state, Utc::now()))
        .await
        .context("Unable to back up the current data, nothing was cleared")?;
    state.clear_all().await;
    state.close();

    let message = format!(
        "Deleted {transactions} transactions and {budgets} budgets. A backup was saved to {}",
        backup.display()
    );
    Ok(Out::new(message, backup))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TransactionKind;
    use crate::store::{BUDGETS_KEY, TRANSACTIONS_KEY};
    use crate::test::TestEnv;
    use crate::ImportError;

    async fn populate(env: &TestEnv) {
        env.insert_test_transaction(TransactionKind::Income, "1000", "Salary")
            .await;
        env.insert_test_transaction(TransactionKind::Expense, "50", "Food & Dining")
            .await;
        env.insert_test_budget("Food & Dining", "100").await;
    }

    #[tokio::test]
    async fn test_export_then_import() {
        let source = TestEnv::new().await;
        populate(&source).await;
        let file = source.scratch().join("export.json");
        let out = export(
            source.config(),
            StoreMode::File,
            ExportArgs::new(Some(file.clone())),
        )
        .await
        .unwrap();
        assert_eq!(
            out.message(),
            format!(
                "Exported 2 transactions and 1 budgets to {}",
                file.display()
            )
        );

        let target = TestEnv::new().await;
        target
            .insert_test_transaction(TransactionKind::Expense, "1", "Travel")
            .await;
        let out = import(target.config(), StoreMode::File, ImportArgs::new(&file))
            .await
            .unwrap();
        assert_eq!(out.message(), "Imported 2 transactions and 1 budgets");
        assert!(out.structure().unwrap().backup.is_file());

        let imported = target.state().await;
        let original = source.state().await;
        assert_eq!(imported.transactions(), original.transactions());
        assert_eq!(imported.budgets(), original.budgets());
    }

    #[tokio::test]
    async fn test_import_missing_budgets_changes_nothing() {
        let env = TestEnv::new().await;
        populate(&env).await;
        let storage = env.config().storage(StoreMode::File, false).await.unwrap();
        let transactions_before = storage.read_raw(TRANSACTIONS_KEY).await.unwrap();
        let budgets_before = storage.read_raw(BUDGETS_KEY).await.unwrap();

        let file = env.scratch().join("bad.json");
        utils::write(&file, r#"{"transactions": []}"#).await.unwrap();
        let err = import(env.config(), StoreMode::File, ImportArgs::new(&file))
            .await
            .unwrap_err();
        assert_eq!(
            err.downcast_ref::<ImportError>(),
            Some(&ImportError::MissingCollection("budgets"))
        );

        assert_eq!(
            storage.read_raw(TRANSACTIONS_KEY).await.unwrap(),
            transactions_before
        );
        assert_eq!(storage.read_raw(BUDGETS_KEY).await.unwrap(), budgets_before);
    }

    #[tokio::test]
    async fn test_import_missing_file() {
        let env = TestEnv::new().await;
        let file = env.scratch().join("nope.json");
        assert!(import(env.config(), StoreMode::File, ImportArgs::new(&file))
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_clear_requires_confirmation() {
        let env = TestEnv::new().await;
        populate(&env).await;

        let err = clear(env.config(), StoreMode::File, ClearArgs::new(false))
            .await
            .unwrap_err();
        assert!(err
            .to_string()
            .contains("permanently delete 2 transactions and 1 budgets"));
        assert_eq!(env.state().await.transactions().len(), 2);

        let out = clear(env.config(), StoreMode::File, ClearArgs::new(true))
            .await
            .unwrap();
        assert!(out.structure().unwrap().is_file());
        let state = env.state().await;
        assert!(state.transactions().is_empty());
        assert!(state.budgets().is_empty());
        assert!(!env.config().store_path().join("budgetmaster-transactions.json").exists());
    }
}
