use crate::args::AddArgs;
use crate::commands::{open_state, Out};
use crate::model::{NewTransaction, Transaction};
use crate::store::StoreMode;
use crate::{Config, Result};
use chrono::Local;
use tracing::warn;

/// Validates and records a transaction. Nothing is stored when validation fails.
pub async fn add(config: Config, mode: StoreMode, args: AddArgs) -> Result<Out<Transaction>> {
    let date = args.date().unwrap_or_else(|| Local::now().date_naive());
    let input = NewTransaction::new(
        args.kind(),
        args.amount(),
        args.category(),
        args.description(),
        date,
    )?;

    let mut state = open_state(&config, mode).await?;
    let transaction = state.add_transaction(input).await.clone();

    // Budgets keep the spent amount from when they were last set; point that out when it matters.
    if let Some(budget) = state.budget_for(transaction.category()) {
        if budget.period().contains(transaction.date(), Local::now().naive_local()) {
            warn!(
                "The '{}' budget does not include this transaction until its spent amount is \
                recalculated with `budget budget refresh`",
                budget.category()
            );
        }
    }
    state.close();

    let message = format!(
        "Added {} of {} for {} ({})",
        transaction.kind(),
        transaction.amount(),
        transaction.category(),
        transaction.id()
    );
    Ok(Out::new(message, transaction))
}
