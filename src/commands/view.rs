//! Renders the app's views as text.

use crate::args::{CategoriesArgs, OutputFormat, Tab, ViewArgs};
use crate::commands::{table, Out, Rows};
use crate::model::category::{self, Category, CATEGORIES};
use crate::model::{Budget, BudgetStatus, Transaction, TransactionKind};
use crate::state::{BudgetState, TransactionFilter};
use crate::store::{StoreMode, ACTIVE_TAB_KEY};
use crate::{Config, Result};
use anyhow::Context;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::fmt::Write;
use tracing::debug;

const BAR_WIDTH: usize = 20;

/// Shows one view. When no view is named, the last one shown is used; naming a view remembers it.
pub async fn view(config: Config, mode: StoreMode, args: ViewArgs) -> Result<Out<Tab>> {
    let storage = config.storage(mode, false).await?;
    let tab = match args.tab() {
        Some(tab) => {
            storage.save(ACTIVE_TAB_KEY, &tab).await;
            tab
        }
        None => storage.load(ACTIVE_TAB_KEY, Tab::default()).await,
    };
    debug!("Showing the {tab} view");

    let state = BudgetState::load(storage).await;
    let text = match tab {
        Tab::Dashboard => dashboard(&state, config.recent_limit()),
        Tab::Transactions => transactions(&state, &args)?.to_string(),
        Tab::Budgets => budgets(state.budgets()),
        Tab::Settings => settings(&state, &config, mode),
    };
    state.close();
    Ok(Out::new(text, tab))
}

/// Lists the registered categories.
pub fn categories(args: CategoriesArgs) -> Out<Vec<Category>> {
    let found: Vec<Category> = match args.kind() {
        Some(kind) => category::by_kind(kind).copied().collect(),
        None => CATEGORIES.to_vec(),
    };
    let rows: Vec<Vec<String>> = found
        .iter()
        .map(|c| {
            vec![
                c.icon.to_string(),
                c.name.to_string(),
                c.kind.to_string(),
                c.color.to_string(),
            ]
        })
        .collect();
    Out::new(table(&["", "Category", "Type", "Color"], &rows), found)
}

/// Totals, budget progress and the most recent transactions.
pub(crate) fn dashboard(state: &BudgetState, recent_limit: usize) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Total income:    {}", state.total_income());
    let _ = writeln!(out, "Total expenses:  {}", state.total_expenses());
    let _ = writeln!(out, "Balance:         {}", state.balance());
    let _ = writeln!(out, "Active budgets:  {}", state.budgets().len());

    if !state.budgets().is_empty() {
        let _ = writeln!(out, "\nBudget progress");
        for budget in state.budgets() {
            let mut line = format!(
                "{} {}  {}  {} / {}",
                category::icon_for(budget.category()),
                budget.category(),
                progress_bar(budget.percent_used()),
                budget.spent(),
                budget.amount()
            );
            if budget.is_over_budget() {
                let _ = write!(line, "  ({} over budget)", budget.spent() - budget.amount());
            }
            let _ = writeln!(out, "{line}");
        }
    }

    let _ = writeln!(out, "\nRecent transactions");
    let recent = state.recent_transactions(recent_limit);
    if recent.is_empty() {
        out.push_str("No transactions yet. Add your first transaction to get started!");
    } else {
        out.push_str(&transaction_table(&recent));
    }
    out
}

/// The filtered transaction list in the requested format.
fn transactions(state: &BudgetState, args: &ViewArgs) -> Result<Rows> {
    let filter = TransactionFilter {
        kind: args.kind(),
        category: args.category().map(str::to_string),
        sort: args.sort(),
    };
    let mut found = state.filtered(&filter);
    if let Some(limit) = args.limit() {
        found.truncate(limit);
    }

    match args.format() {
        OutputFormat::Table if found.is_empty() => Ok(Rows::Table(
            "No transactions found. Try adjusting your filters or add a new transaction."
                .to_string(),
        )),
        OutputFormat::Table => Ok(Rows::Table(transaction_table(&found))),
        OutputFormat::Json => Ok(Rows::Json(
            serde_json::to_value(&found).context("Unable to serialize transactions")?,
        )),
        OutputFormat::Csv => {
            let mut writer = csv::Writer::from_writer(Vec::new());
            for transaction in &found {
                writer
                    .serialize(transaction)
                    .context("Unable to write a transaction as CSV")?;
            }
            let bytes = writer
                .into_inner()
                .map_err(|e| anyhow::anyhow!("Unable to finish the CSV output: {e}"))?;
            Ok(Rows::Csv(
                String::from_utf8(bytes).context("The CSV output is not UTF-8")?,
            ))
        }
    }
}

fn transaction_table(transactions: &[&Transaction]) -> String {
    let rows: Vec<Vec<String>> = transactions
        .iter()
        .map(|t| {
            vec![
                t.date().to_string(),
                format!("{} {}", category::icon_for(t.category()), t.category()),
                t.description().to_string(),
                signed(t),
                t.id().to_string(),
            ]
        })
        .collect();
    table(&["Date", "Category", "Description", "Amount", "ID"], &rows)
}

/// The amount with `+` for income and `-` for expenses.
fn signed(transaction: &Transaction) -> String {
    match transaction.kind() {
        TransactionKind::Income => format!("+{}", transaction.amount()),
        TransactionKind::Expense => format!("-{}", transaction.amount()),
    }
}

/// One card per budget.
fn budgets(budgets: &[Budget]) -> String {
    if budgets.is_empty() {
        return "No budgets set. Create one with 'budget budget set' to start tracking your \
            spending."
            .to_string();
    }
    let cards: Vec<String> = budgets
        .iter()
        .map(|b| {
            let status = match b.status() {
                BudgetStatus::Ok => "on track",
                BudgetStatus::Warning => "close to the limit",
                BudgetStatus::Over => "over budget",
            };
            format!(
                "{} {} ({})\n  {}  {:.2}%  {}\n  Budget: {}  Spent: {}  Remaining: {}",
                category::icon_for(b.category()),
                b.category(),
                b.period(),
                progress_bar(b.percent_used()),
                b.percent_used(),
                status,
                b.amount(),
                b.spent(),
                b.remaining()
            )
        })
        .collect();
    cards.join("\n\n")
}

/// Data statistics and where things are kept.
fn settings(state: &BudgetState, config: &Config, mode: StoreMode) -> String {
    let storage = match mode {
        StoreMode::File => config.store_path().display().to_string(),
        StoreMode::Memory => "in memory (nothing is saved)".to_string(),
    };
    let rows = vec![
        vec!["Transactions".to_string(), state.transactions().len().to_string()],
        vec!["Budgets".to_string(), state.budgets().len().to_string()],
        vec!["Storage".to_string(), storage],
        vec![
            "Config".to_string(),
            config.config_path().display().to_string(),
        ],
        vec![
            "Backups".to_string(),
            format!(
                "{} (keeping {})",
                config.backups().display(),
                config.backup_copies()
            ),
        ],
    ];
    table(&["Setting", "Value"], &rows)
}

/// A fixed-width bar filled in proportion to `percent`, capped at full.
fn progress_bar(percent: Decimal) -> String {
    let capped = percent.clamp(Decimal::ZERO, Decimal::ONE_HUNDRED);
    let filled = (capped * Decimal::from(BAR_WIDTH) / Decimal::ONE_HUNDRED)
        .floor()
        .to_usize()
        .unwrap_or(0);
    format!(
        "[{}{}]",
        "#".repeat(filled),
        "-".repeat(BAR_WIDTH.saturating_sub(filled))
    )
}
