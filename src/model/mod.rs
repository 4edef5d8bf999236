//! Types that represent the core data model, such as `Transaction`, `Budget` and `Category`.
mod amount;
mod budget;
pub mod category;
mod transaction;

pub use amount::{Amount, AmountError};
pub use budget::{Budget, BudgetInput, BudgetStatus, Period};
pub use category::Category;
pub use transaction::{NewTransaction, Transaction, TransactionKind};
