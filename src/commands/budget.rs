//! Budget command handlers.

use crate::args::BudgetSetArgs;
use crate::commands::{open_state, Out};
use crate::model::{Budget, BudgetInput};
use crate::store::StoreMode;
use crate::{Config, Result};

/// Sets the cap for an expense category. An existing budget for the category is replaced.
pub async fn budget_set(config: Config, mode: StoreMode, args: BudgetSetArgs) -> Result<Out<Budget>> {
    let input = BudgetInput::new(args.category(), args.amount(), args.period())?;
    let mut state = open_state(&config, mode).await?;
    let budget = state.upsert_budget(input).await.clone();
    state.close();

    let message = format!(
        "Set the {} budget for {} to {} ({} spent so far)",
        budget.period(),
        budget.category(),
        budget.amount(),
        budget.spent()
    );
    Ok(Out::new(message, budget))
}

/// Recomputes how much has been spent against every budget.
pub async fn budget_refresh(config: Config, mode: StoreMode) -> Result<Out<Vec<Budget>>> {
    let mut state = open_state(&config, mode).await?;
    let budgets = state.refresh_budgets().await.to_vec();
    state.close();

    let over = budgets.iter().filter(|b| b.is_over_budget()).count();
    let message = format!(
        "Refreshed {} budget{}, {} over budget",
        budgets.len(),
        if budgets.len() == 1 { "" } else { "s" },
        over
    );
    Ok(Out::new(message, budgets))
}
