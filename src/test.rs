//! Shared test utilities for creating test environments.
//!
//! This module is only compiled when running tests (`#[cfg(test)]`).

use crate::model::{Amount, BudgetInput, NewTransaction, Period, TransactionKind};
use crate::state::BudgetState;
use crate::store::StoreMode;
use crate::Config;
use chrono::Local;
use std::path::Path;
use std::str::FromStr;
use tempfile::TempDir;

/// Test environment that sets up a budgetmaster home directory with a Config and an empty file
/// store. Holds TempDir to keep the directory alive for the duration of the test.
pub struct TestEnv {
    temp_dir: TempDir,
    config: Config,
}

impl TestEnv {
    /// Creates a test environment with an initialized home directory.
    pub async fn new() -> Self {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().join("budgetmaster");
        let config = Config::create(&root).await.unwrap();
        Self { temp_dir, config }
    }

    /// Returns a clone of the Config.
    pub fn config(&self) -> Config {
        self.config.clone()
    }

    /// A scratch directory outside the home directory, for export and import files.
    pub fn scratch(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Loads the state from the environment's file store.
    pub async fn state(&self) -> BudgetState {
        let storage = self.config.storage(StoreMode::File, false).await.unwrap();
        BudgetState::load(storage).await
    }

    /// Records a transaction dated today and returns its id.
    pub async fn insert_test_transaction(
        &self,
        kind: TransactionKind,
        amount: &str,
        category: &str,
    ) -> String {
        let input = NewTransaction::new(
            kind,
            Amount::from_str(amount).unwrap(),
            category,
            "test transaction",
            Local::now().date_naive(),
        )
        .unwrap();
        let mut state = self.state().await;
        let id = state.add_transaction(input).await.id().to_string();
        state.close();
        id
    }

    /// Sets a monthly budget.
    pub async fn insert_test_budget(&self, category: &str, amount: &str) {
        let input =
            BudgetInput::new(category, Amount::from_str(amount).unwrap(), Period::Monthly)
                .unwrap();
        let mut state = self.state().await;
        state.upsert_budget(input).await;
        state.close();
    }
}
