//! Export and import of the whole financial state as a single JSON document.
//!
//! ```json
//! {
//!   "transactions": [ ... ],
//!   "budgets": [ ... ],
//!   "exportDate": "2025-03-14T12:30:00Z"
//! }
//! ```
//!
//! The active-tab preference is not part of the document.

use crate::error::ImportError;
use crate::model::{Budget, Transaction};
use crate::state::BudgetState;
use crate::store::{Storage, BUDGETS_KEY, TRANSACTIONS_KEY};
use crate::Result;
use anyhow::Context;
use chrono::{DateTime, NaiveDate, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, error};

/// The contents of an export file.
#[derive(Debug, Clone, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub transactions: Vec<Transaction>,
    pub budgets: Vec<Budget>,
    /// Absent in hand-written import files.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub export_date: Option<DateTime<Utc>>,
}

impl Snapshot {
    /// Serializes the snapshot the way it is written to disk.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Unable to serialize the export document")
    }
}

/// Captures the current financial state, stamped with `now`.
pub fn export(state: &BudgetState, now: DateTime<Utc>) -> Snapshot {
    Snapshot {
        transactions: state.transactions().to_vec(),
        budgets: state.budgets().to_vec(),
        export_date: Some(now),
    }
}

/// The default export file name for a given day, e.g. `budget-data-2025-03-14.json`.
pub fn export_file_name(day: NaiveDate) -> String {
    format!("budget-data-{}.json", day.format("%Y-%m-%d"))
}

/// Parses and validates an import document. Both `transactions` and `budgets` must be present
/// arrays, and every record in them must decode.
pub fn parse(text: &str) -> std::result::Result<Snapshot, ImportError> {
    let mut document: Value =
        serde_json::from_str(text).map_err(|e| ImportError::Malformed(e.to_string()))?;
    let transactions = take_collection(&mut document, "transactions")?;
    let budgets = take_collection(&mut document, "budgets")?;
    let export_date = document
        .get("exportDate")
        .and_then(|v| serde_json::from_value(v.clone()).ok());

    Ok(Snapshot {
        transactions: decode_records(transactions, "transactions")?,
        budgets: decode_records(budgets, "budgets")?,
        export_date,
    })
}

fn take_collection(
    document: &mut Value,
    name: &'static str,
) -> std::result::Result<Vec<Value>, ImportError> {
    match document.get_mut(name).map(Value::take) {
        Some(Value::Array(records)) => Ok(records),
        _ => Err(ImportError::MissingCollection(name)),
    }
}

fn decode_records<T>(
    records: Vec<Value>,
    collection: &'static str,
) -> std::result::Result<Vec<T>, ImportError>
where
    T: DeserializeOwned,
{
    records
        .into_iter()
        .enumerate()
        .map(|(index, record)| {
            serde_json::from_value(record).map_err(|e| ImportError::InvalidRecord {
                collection,
                index,
                message: e.to_string(),
            })
        })
        .collect()
}

/// Replaces both stored collections with those in `snapshot`. Either both are written or, if the
/// second write fails, the transactions collection is put back the way it was.
///
/// Callers must reload any `BudgetState` afterwards.
pub async fn import(storage: &Storage, snapshot: &Snapshot) -> Result<()> {
    let previous = storage
        .read_raw(TRANSACTIONS_KEY)
        .await
        .context("Unable to read the current transactions before importing")?;

    storage
        .write(TRANSACTIONS_KEY, &snapshot.transactions)
        .await
        .context("Unable to store the imported transactions")?;

    if let Err(e) = storage.write(BUDGETS_KEY, &snapshot.budgets).await {
        let restored = match &previous {
            Some(raw) => storage.write_raw(TRANSACTIONS_KEY, raw).await,
            None => storage.delete(TRANSACTIONS_KEY).await,
        };
        if let Err(restore_error) = restored {
            error!("Unable to restore transactions after a failed import: {restore_error:#}");
        }
        return Err(e.context("Unable to store the imported budgets"));
    }

    debug!(
        "Imported {} transactions and {} budgets",
        snapshot.transactions.len(),
        snapshot.budgets.len()
    );
    Ok(())
}
