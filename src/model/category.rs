//! The static category registry.

use crate::model::TransactionKind;
use serde::Serialize;

/// A category that a transaction or budget can be filed under. Categories are fixed reference
/// data; they are neither persisted nor editable.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize)]
pub struct Category {
    pub id: &'static str,
    pub name: &'static str,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    pub color: &'static str,
    pub icon: &'static str,
}

const fn income(
    id: &'static str,
    name: &'static str,
    color: &'static str,
    icon: &'static str,
) -> Category {
    Category {
        id,
        name,
        kind: TransactionKind::Income,
        color,
        icon,
    }
}

const fn expense(
    id: &'static str,
    name: &'static str,
    color: &'static str,
    icon: &'static str,
) -> Category {
    Category {
        id,
        name,
        kind: TransactionKind::Expense,
        color,
        icon,
    }
}

/// Every known category. Names are unique within a kind.
pub const CATEGORIES: &[Category] = &[
    income("1", "Salary", "#059669", "💰"),
    income("2", "Freelancing", "#0891b2", "💼"),
    income("3", "Investment", "#7c3aed", "📈"),
    income("4", "Business", "#dc2626", "🏢"),
    income("5", "Other Income", "#059669", "💵"),
    expense("6", "Food & Dining", "#ea580c", "🍽️"),
    expense("7", "Transportation", "#7c2d12", "🚗"),
    expense("8", "Shopping", "#be185d", "🛍️"),
    expense("9", "Entertainment", "#7c3aed", "🎬"),
    expense("10", "Bills & Utilities", "#dc2626", "⚡"),
    expense("11", "Healthcare", "#16a34a", "🏥"),
    expense("12", "Education", "#2563eb", "📚"),
    expense("13", "Travel", "#0891b2", "✈️"),
    expense("14", "Other Expenses", "#6b7280", "📝"),
];

/// Returns the categories of the given kind, in registry order.
pub fn by_kind(kind: TransactionKind) -> impl Iterator<Item = &'static Category> {
    CATEGORIES.iter().filter(move |c| c.kind == kind)
}

/// Returns the first category with this name, regardless of kind.
pub fn by_name(name: &str) -> Option<&'static Category> {
    CATEGORIES.iter().find(|c| c.name == name)
}

/// Returns the category with this name only if it is registered for `kind`.
pub fn find(kind: TransactionKind, name: &str) -> Option<&'static Category> {
    by_kind(kind).find(|c| c.name == name)
}

/// The icon for a category name, or a generic one for names that are not registered (e.g. from an
/// imported file).
pub fn icon_for(name: &str) -> &'static str {
    by_name(name).map(|c| c.icon).unwrap_or("📝")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_by_kind() {
        let income: Vec<&str> = by_kind(TransactionKind::Income).map(|c| c.name).collect();
        assert_eq!(
            income,
            vec!["Salary", "Freelancing", "Investment", "Business", "Other Income"]
        );
        assert_eq!(by_kind(TransactionKind::Expense).count(), 9);
    }

    #[test]
    fn test_names_unique_within_kind() {
        for kind in [TransactionKind::Income, TransactionKind::Expense] {
            let names: HashSet<&str> = by_kind(kind).map(|c| c.name).collect();
            assert_eq!(names.len(), by_kind(kind).count());
        }
    }

    #[test]
    fn test_by_name() {
        let c = by_name("Food & Dining").unwrap();
        assert_eq!(c.id, "6");
        assert_eq!(c.kind, TransactionKind::Expense);
        assert!(by_name("Groceries").is_none());
    }

    #[test]
    fn test_find_respects_kind() {
        assert!(find(TransactionKind::Income, "Salary").is_some());
        assert!(find(TransactionKind::Expense, "Salary").is_none());
    }

    #[test]
    fn test_icon_fallback() {
        assert_eq!(icon_for("Travel"), "✈️");
        assert_eq!(icon_for("Unknown"), "📝");
    }
}
