use crate::error::ValidationError;
use crate::model::{category, Amount};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Whether money came in or went out.
#[derive(
    Debug,
    Default,
    Clone,
    Copy,
    Eq,
    PartialEq,
    Ord,
    PartialOrd,
    Hash,
    Serialize,
    Deserialize,
    clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Income,
    #[default]
    Expense,
}

serde_plain::derive_display_from_serialize!(TransactionKind);
serde_plain::derive_fromstr_from_deserialize!(TransactionKind);

/// A single recorded income or expense. Transactions are immutable once created; the only way to
/// change one is to delete it.
///
/// The serialized field names (`type`, `date`, `createdAt`) are those of the persisted
/// `budgetmaster-transactions` collection and of exported documents.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    id: String,
    #[serde(rename = "type")]
    kind: TransactionKind,
    amount: Amount,
    category: String,
    description: String,
    /// The calendar date the money moved.
    date: NaiveDate,
    /// When the transaction was recorded.
    created_at: DateTime<Utc>,
}

impl Transaction {
    /// Turns validated input into a transaction with a fresh id, recorded at `created_at`.
    pub fn record(input: NewTransaction, created_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            kind: input.kind,
            amount: input.amount,
            category: input.category,
            description: input.description,
            date: input.date,
            created_at,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn kind(&self) -> TransactionKind {
        self.kind
    }

    pub fn amount(&self) -> Amount {
        self.amount
    }

    /// The amount with income positive and expenses negative.
    pub fn signed_amount(&self) -> Amount {
        match self.kind {
            TransactionKind::Income => self.amount,
            TransactionKind::Expense => Amount::ZERO - self.amount,
        }
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// User-entered transaction fields that have passed entry validation. This is the only way to
/// add a transaction to the state, so the state itself never needs to re-validate.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct NewTransaction {
    kind: TransactionKind,
    amount: Amount,
    category: String,
    description: String,
    date: NaiveDate,
}

impl NewTransaction {
    /// Validates the fields of a transaction.
    ///
    /// # Errors
    /// - `NonPositiveAmount` if `amount` is not greater than zero.
    /// - `MissingField` if `category` or `description` is blank.
    /// - `UnknownCategory` if `category` is not registered for `kind`.
    pub fn new(
        kind: TransactionKind,
        amount: Amount,
        category: impl Into<String>,
        description: impl Into<String>,
        date: NaiveDate,
    ) -> std::result::Result<Self, ValidationError> {
        let category = category.into().trim().to_string();
        let description = description.into().trim().to_string();
        if category.is_empty() {
            return Err(ValidationError::MissingField("category"));
        }
        if description.is_empty() {
            return Err(ValidationError::MissingField("description"));
        }
        if !amount.is_positive() {
            return Err(ValidationError::NonPositiveAmount(amount));
        }
        if category::find(kind, &category).is_none() {
            return Err(ValidationError::UnknownCategory { kind, category });
        }
        Ok(Self {
            kind,
            amount,
            category,
            description,
            date,
        })
    }

    pub fn kind(&self) -> TransactionKind {
        self.kind
    }

    pub fn amount(&self) -> Amount {
        self.amount
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 14).unwrap()
    }

    fn amt(s: &str) -> Amount {
        Amount::from_str(s).unwrap()
    }

    #[test]
    fn test_new_transaction_valid() {
        let input = NewTransaction::new(
            TransactionKind::Expense,
            amt("12.50"),
            " Food & Dining ",
            "lunch",
            date(),
        )
        .unwrap();
        let t = Transaction::record(input, Utc::now());
        assert_eq!(t.category(), "Food & Dining");
        assert_eq!(t.signed_amount(), amt("-12.50"));
        assert!(!t.id().is_empty());
    }

    #[test]
    fn test_new_transaction_rejects_non_positive() {
        let err = NewTransaction::new(TransactionKind::Income, amt("0"), "Salary", "pay", date())
            .unwrap_err();
        assert_eq!(err, ValidationError::NonPositiveAmount(amt("0")));

        let err = NewTransaction::new(TransactionKind::Income, amt("-5"), "Salary", "pay", date())
            .unwrap_err();
        assert!(matches!(err, ValidationError::NonPositiveAmount(_)));
    }

    #[test]
    fn test_new_transaction_rejects_blank_fields() {
        let err = NewTransaction::new(TransactionKind::Income, amt("5"), "", "pay", date())
            .unwrap_err();
        assert_eq!(err, ValidationError::MissingField("category"));

        let err = NewTransaction::new(TransactionKind::Income, amt("5"), "Salary", "  ", date())
            .unwrap_err();
        assert_eq!(err, ValidationError::MissingField("description"));
    }

    #[test]
    fn test_new_transaction_rejects_category_of_other_kind() {
        let err = NewTransaction::new(TransactionKind::Expense, amt("5"), "Salary", "x", date())
            .unwrap_err();
        assert!(matches!(err, ValidationError::UnknownCategory { .. }));
    }

    #[test]
    fn test_ids_are_unique() {
        let input =
            NewTransaction::new(TransactionKind::Income, amt("5"), "Salary", "x", date()).unwrap();
        let a = Transaction::record(input.clone(), Utc::now());
        let b = Transaction::record(input, Utc::now());
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_deserialize_stored_shape() {
        let json = r#"{
            "id": "3f1c",
            "type": "expense",
            "amount": 50,
            "category": "Food & Dining",
            "description": "lunch",
            "date": "2025-03-14",
            "createdAt": "2025-03-14T12:30:00.000Z"
        }"#;
        let t: Transaction = serde_json::from_str(json).unwrap();
        assert_eq!(t.id(), "3f1c");
        assert_eq!(t.kind(), TransactionKind::Expense);
        assert_eq!(t.amount(), amt("50"));
        assert_eq!(t.date(), date());

        let out = serde_json::to_value(&t).unwrap();
        assert_eq!(out["type"], "expense");
        assert!(out["createdAt"]
            .as_str()
            .unwrap()
            .starts_with("2025-03-14T12:30:00"));
    }

    #[test]
    fn test_kind_display_and_parse() {
        assert_eq!(TransactionKind::Income.to_string(), "income");
        assert_eq!(
            TransactionKind::from_str("expense").unwrap(),
            TransactionKind::Expense
        );
    }
}
