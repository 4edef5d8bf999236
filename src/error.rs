use crate::model::{Amount, TransactionKind};
use std::fmt::{Display, Formatter};

pub type Error = anyhow::Error;
pub type Result<T> = std::result::Result<T, Error>;

/// Reasons that user input is rejected before any mutation of the financial state is attempted.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum ValidationError {
    /// The amount was zero or negative.
    NonPositiveAmount(Amount),
    /// A required text field was empty or only whitespace.
    MissingField(&'static str),
    /// The category is not registered for the given kind.
    UnknownCategory {
        kind: TransactionKind,
        category: String,
    },
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::NonPositiveAmount(amount) => {
                write!(f, "Amount must be greater than 0, got {amount}")
            }
            ValidationError::MissingField(field) => {
                write!(f, "Please fill in the required field '{field}'")
            }
            ValidationError::UnknownCategory { kind, category } => {
                write!(f, "'{category}' is not a known {kind} category")
            }
        }
    }
}

impl std::error::Error for ValidationError {}

/// Reasons that an import document is rejected. When any of these occur, nothing is written.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum ImportError {
    /// The document is not valid JSON.
    Malformed(String),
    /// A required top-level collection is absent or is not an array.
    MissingCollection(&'static str),
    /// A record within a collection could not be decoded.
    InvalidRecord {
        collection: &'static str,
        index: usize,
        message: String,
    },
}

impl Display for ImportError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ImportError::Malformed(message) => {
                write!(f, "The import file is not valid JSON: {message}")
            }
            ImportError::MissingCollection(name) => {
                write!(f, "Invalid {name} data: expected '{name}' to be an array")
            }
            ImportError::InvalidRecord {
                collection,
                index,
                message,
            } => write!(f, "Invalid record at {collection}[{index}]: {message}"),
        }
    }
}

impl std::error::Error for ImportError {}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    #[test]
    fn test_validation_error_messages() {
        let e = ValidationError::NonPositiveAmount(Amount::new(Decimal::ZERO));
        assert_eq!(e.to_string(), "Amount must be greater than 0, got $0.00");

        let e = ValidationError::UnknownCategory {
            kind: TransactionKind::Income,
            category: "Food & Dining".to_string(),
        };
        assert_eq!(e.to_string(), "'Food & Dining' is not a known income category");
    }

    #[test]
    fn test_validation_error_downcast() {
        let e: Error = ValidationError::MissingField("description").into();
        let inner = e.downcast_ref::<ValidationError>().unwrap();
        assert_eq!(inner, &ValidationError::MissingField("description"));
    }

    #[test]
    fn test_import_error_messages() {
        let e = ImportError::MissingCollection("budgets");
        assert!(e.to_string().contains("'budgets'"));
    }
}
