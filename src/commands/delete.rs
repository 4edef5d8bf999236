//! Delete command handler.

use crate::args::DeleteArgs;
use crate::commands::{open_state, Out};
use crate::store::StoreMode;
use crate::{Config, Result};
use tracing::{debug, warn};

/// Deletes one or more transactions by ID.
///
/// Deleting is idempotent: ids that do not match a transaction are reported and skipped.
pub async fn delete(config: Config, mode: StoreMode, args: DeleteArgs) -> Result<Out<Vec<String>>> {
    let mut state = open_state(&config, mode).await?;
    let mut deleted = Vec::new();
    for id in args.ids() {
        if let Some(t) = state.transaction(id) {
            debug!(
                "Deleting {} of {} in '{}' dated {}",
                t.kind(),
                t.amount(),
                t.category(),
                t.date()
            );
        }
        if state.delete_transaction(id).await {
            deleted.push(id.clone());
        } else {
            warn!("Transaction not found: {id}");
        }
    }
    state.close();

    let count = deleted.len();
    let message = format!(
        "Deleted {} transaction{}",
        count,
        if count == 1 { "" } else { "s" }
    );
    Ok(Out::new(message, deleted))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TransactionKind;
    use crate::test::TestEnv;

    #[tokio::test]
    async fn test_delete_transactions_success() {
        let env = TestEnv::new().await;
        let id = env
            .insert_test_transaction(TransactionKind::Expense, "4.50", "Food & Dining")
            .await;
        let other = env
            .insert_test_transaction(TransactionKind::Income, "100", "Salary")
            .await;

        let out = delete(env.config(), StoreMode::File, DeleteArgs::new(vec![id.clone()]))
            .await
            .unwrap();
        assert!(out.message().contains("Deleted 1 transaction"));
        assert_eq!(out.structure().unwrap(), &vec![id.clone()]);

        let state = env.state().await;
        assert!(state.transaction(&id).is_none());
        assert!(state.transaction(&other).is_some());
    }

    #[tokio::test]
    async fn test_delete_not_found_is_not_an_error() {
        let env = TestEnv::new().await;
        let id = env
            .insert_test_transaction(TransactionKind::Expense, "4.50", "Food & Dining")
            .await;

        let args = DeleteArgs::new(vec!["nonexistent".to_string(), id.clone(), id]);
        let out = delete(env.config(), StoreMode::File, args).await.unwrap();
        assert_eq!(out.message(), "Deleted 1 transaction");
        assert!(env.state().await.transactions().is_empty());
    }
}
