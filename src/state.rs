//! The budget state: the single in-memory source of truth for transactions and budgets.
//!
//! A `BudgetState` only exists once both collections have been loaded, so nothing can read or
//! mutate a half-loaded state. Every mutation saves the collection it touched back to `Storage`;
//! saving is best-effort and never reported to the caller.
//!
//! Changes written by other execution contexts arrive as storage notifications. They replace the
//! affected collection wholesale and are never merged with, or saved over, local data.

use crate::model::{
    Amount, Budget, BudgetInput, NewTransaction, Period, Transaction, TransactionKind,
};
use crate::store::{Storage, StoreEvent, Subscription, BUDGETS_KEY, TRANSACTIONS_KEY};
use chrono::{Local, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

/// The default number of transactions returned by `recent_transactions`.
pub const RECENT_LIMIT: usize = 5;

/// Sort order for transaction listings.
#[derive(
    Debug,
    Default,
    Clone,
    Copy,
    Eq,
    PartialEq,
    Hash,
    Serialize,
    Deserialize,
    clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum SortBy {
    /// Newest date first.
    #[default]
    Date,
    /// Largest amount first.
    Amount,
}

serde_plain::derive_display_from_serialize!(SortBy);
serde_plain::derive_fromstr_from_deserialize!(SortBy);

/// Selects and orders transactions for the transaction list.
#[derive(Debug, Default, Clone, Eq, PartialEq)]
pub struct TransactionFilter {
    pub kind: Option<TransactionKind>,
    pub category: Option<String>,
    pub sort: SortBy,
}

#[derive(Debug)]
pub struct BudgetState {
    storage: Storage,
    transactions: Vec<Transaction>,
    budgets: Vec<Budget>,
    changes: Option<Subscription>,
}

impl BudgetState {
    /// Loads both collections from `storage` and subscribes to changes made by other contexts.
    pub async fn load(storage: Storage) -> Self {
        // Subscribe first so that nothing written during the load is missed.
        let changes = storage.subscribe();
        let transactions: Vec<Transaction> = storage.load(TRANSACTIONS_KEY, Vec::new()).await;
        let budgets: Vec<Budget> = storage.load(BUDGETS_KEY, Vec::new()).await;
        debug!(
            "Loaded {} transactions and {} budgets",
            transactions.len(),
            budgets.len()
        );
        Self {
            storage,
            transactions,
            budgets,
            changes: Some(changes),
        }
    }

    /// Stops listening for outside changes and releases the state.
    pub fn close(mut self) {
        self.changes = None;
        debug!("Closed budget state for context {}", self.storage.context());
    }

    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    /// All transactions, most recently inserted first.
    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn budgets(&self) -> &[Budget] {
        &self.budgets
    }

    pub fn transaction(&self, id: &str) -> Option<&Transaction> {
        self.transactions.iter().find(|t| t.id() == id)
    }

    pub fn budget_for(&self, category: &str) -> Option<&Budget> {
        self.budgets.iter().find(|b| b.category() == category)
    }

    /// Records a new transaction at the head of the collection and saves the collection.
    pub async fn add_transaction(&mut self, input: NewTransaction) -> &Transaction {
        let transaction = Transaction::record(input, Utc::now());
        debug!(
            "Adding {} transaction {} of {}",
            transaction.kind(),
            transaction.id(),
            transaction.amount()
        );
        self.transactions.insert(0, transaction);
        self.save_transactions().await;
        &self.transactions[0]
    }

    /// Removes the transaction with `id`. Returns `false`, and changes nothing, when there is none.
    pub async fn delete_transaction(&mut self, id: &str) -> bool {
        let before = self.transactions.len();
        self.transactions.retain(|t| t.id() != id);
        if self.transactions.len() == before {
            debug!("No transaction with id {id} to delete");
            return false;
        }
        self.save_transactions().await;
        true
    }

    /// Sets the budget for a category, replacing any existing budget for that category. `spent`
    /// is computed for the budget's period as of now. A replaced budget keeps its id.
    pub async fn upsert_budget(&mut self, input: BudgetInput) -> &Budget {
        let spent = self.spent_by_category(input.category(), input.period());
        let position = self
            .budgets
            .iter()
            .position(|b| b.category() == input.category());
        let index = match position {
            Some(ix) => {
                let id = self.budgets[ix].id().to_string();
                self.budgets[ix] = Budget::new(id, input, spent);
                ix
            }
            None => {
                self.budgets
                    .push(Budget::new(Uuid::new_v4().to_string(), input, spent));
                self.budgets.len() - 1
            }
        };
        debug!(
            "Set budget for '{}' with {} spent",
            self.budgets[index].category(),
            spent
        );
        self.save_budgets().await;
        &self.budgets[index]
    }

    /// Recomputes `spent` for every budget as of now and saves the budgets.
    pub async fn refresh_budgets(&mut self) -> &[Budget] {
        let now = Local::now().naive_local();
        let spent: Vec<Amount> = self
            .budgets
            .iter()
            .map(|b| self.spent_by_category_at(b.category(), b.period(), now))
            .collect();
        for (budget, spent) in self.budgets.iter_mut().zip(spent) {
            budget.set_spent(spent);
        }
        self.save_budgets().await;
        &self.budgets
    }

    /// Empties both collections and removes them from storage. This cannot be undone.
    pub async fn clear_all(&mut self) {
        self.transactions.clear();
        self.budgets.clear();
        self.storage.remove(TRANSACTIONS_KEY).await;
        self.storage.remove(BUDGETS_KEY).await;
        debug!("Cleared all transactions and budgets");
    }

    pub fn total_income(&self) -> Amount {
        self.total(TransactionKind::Income)
    }

    pub fn total_expenses(&self) -> Amount {
        self.total(TransactionKind::Expense)
    }

    /// `total_income - total_expenses`.
    pub fn balance(&self) -> Amount {
        self.total_income() - self.total_expenses()
    }

    fn total(&self, kind: TransactionKind) -> Amount {
        self.transactions
            .iter()
            .filter(|t| t.kind() == kind)
            .map(|t| t.amount())
            .sum()
    }

    /// Sum of the expenses in `category` that fall in the current `period` window, as of now.
    pub fn spent_by_category(&self, category: &str, period: Period) -> Amount {
        self.spent_by_category_at(category, period, Local::now().naive_local())
    }

    /// Sum of the expenses in `category` that fall in the `period` window ending at `now` (local
    /// time).
    pub fn spent_by_category_at(&self, category: &str, period: Period, now: NaiveDateTime) -> Amount {
        self.transactions
            .iter()
            .filter(|t| t.kind() == TransactionKind::Expense)
            .filter(|t| t.category() == category)
            .filter(|t| period.contains(t.date(), now))
            .map(|t| t.amount())
            .sum()
    }

    /// The `limit` most recently created transactions, newest first. Transactions created at the
    /// same instant keep their collection order, i.e. the later insertion comes first.
    pub fn recent_transactions(&self, limit: usize) -> Vec<&Transaction> {
        let mut recent: Vec<&Transaction> = self.transactions.iter().collect();
        recent.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
        recent.truncate(limit);
        recent
    }

    /// Transactions matching `filter`, in the order it asks for. Ties keep collection order.
    pub fn filtered(&self, filter: &TransactionFilter) -> Vec<&Transaction> {
        let mut found: Vec<&Transaction> = self
            .transactions
            .iter()
            .filter(|t| filter.kind.map_or(true, |kind| t.kind() == kind))
            .filter(|t| {
                filter
                    .category
                    .as_deref()
                    .map_or(true, |category| t.category() == category)
            })
            .collect();
        match filter.sort {
            SortBy::Date => found.sort_by(|a, b| b.date().cmp(&a.date())),
            SortBy::Amount => found.sort_by(|a, b| b.amount().cmp(&a.amount())),
        }
        found
    }

    /// Applies every pending change made by other contexts without waiting. Returns how many
    /// changes were applied.
    pub fn poll_external_changes(&mut self) -> usize {
        let mut applied = 0;
        while let Some(event) = self.changes.as_mut().and_then(|c| c.try_next()) {
            if self.apply_external(&event) {
                applied += 1;
            }
        }
        applied
    }

    /// Waits for the next change made by another context that affects the financial state, and
    /// applies it. Returns the key that changed, or `None` once no more changes can arrive.
    pub async fn next_external_change(&mut self) -> Option<String> {
        loop {
            let event = self.changes.as_mut()?.next().await?;
            if self.apply_external(&event) {
                return Some(event.key().to_string());
            }
        }
    }

    /// Replaces a collection with the snapshot in `event`. A removed key empties the collection.
    /// Returns `false` for keys that are not collections and for values that do not parse.
    fn apply_external(&mut self, event: &StoreEvent) -> bool {
        debug!("External change to '{}' from {}", event.key(), event.origin());
        match event.key() {
            TRANSACTIONS_KEY => match parse_snapshot(event) {
                Some(transactions) => {
                    self.transactions = transactions;
                    true
                }
                None => false,
            },
            BUDGETS_KEY => match parse_snapshot(event) {
                Some(budgets) => {
                    self.budgets = budgets;
                    true
                }
                None => false,
            },
            _ => false,
        }
    }

    async fn save_transactions(&self) {
        self.storage.save(TRANSACTIONS_KEY, &self.transactions).await;
    }

    async fn save_budgets(&self) {
        self.storage.save(BUDGETS_KEY, &self.budgets).await;
    }
}

fn parse_snapshot<T>(event: &StoreEvent) -> Option<Vec<T>>
where
    T: serde::de::DeserializeOwned,
{
    match event.new_value() {
        None => Some(Vec::new()),
        Some(raw) => match serde_json::from_str(raw) {
            Ok(values) => Some(values),
            Err(e) => {
                warn!("Ignoring unreadable change to '{}': {e}", event.key());
                None
            }
        },
    }
}
