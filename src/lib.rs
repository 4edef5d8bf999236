pub mod args;
mod backup;
pub mod commands;
mod config;
mod error;
pub mod model;
pub mod state;
pub mod store;
pub mod transfer;
mod utils;

#[cfg(test)]
mod test;

pub use backup::Backup;
pub use config::Config;
pub use error::{Error, ImportError, Result, ValidationError};
pub use model::Amount;
pub use state::BudgetState;
pub use store::{Storage, StoreMode};
