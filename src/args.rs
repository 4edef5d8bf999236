//! These structs provide the CLI interface for the budget CLI.

use crate::model::{Amount, Period, TransactionKind};
use crate::state::SortBy;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::fmt::{Display, Formatter};
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::error;
use tracing_subscriber::filter::LevelFilter;

/// budget: A command-line tool for tracking income, expenses and budgets.
///
/// Record transactions as they happen, set a monthly or weekly cap per expense category, and
/// check where the money went with the dashboard. Everything is stored locally in the budget home
/// directory; nothing leaves your machine.
///
/// Start with `budget init`.
#[derive(Debug, Parser, Clone)]
pub struct Args {
    #[clap(flatten)]
    common: Common,

    #[command(subcommand)]
    command: Command,
}

impl Args {
    pub fn new(common: Common, command: Command) -> Self {
        Self { common, command }
    }

    pub fn common(&self) -> &Common {
        &self.common
    }

    pub fn command(&self) -> &Command {
        &self.command
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Create the data directory and initialize the configuration file.
    ///
    /// This is the first command you should run. By default the data lives in $HOME/budgetmaster;
    /// pass --budget-home or set BUDGET_HOME to put it somewhere else.
    Init,
    /// Record an income or an expense.
    Add(AddArgs),
    /// Delete one or more transactions by id.
    Delete(DeleteArgs),
    /// Set or refresh spending caps.
    Budget(BudgetArgs),
    /// Show the dashboard, the transaction list, the budgets or the settings.
    View(ViewArgs),
    /// List the available categories.
    Categories(CategoriesArgs),
    /// Write all transactions and budgets to a JSON file.
    Export(ExportArgs),
    /// Replace all transactions and budgets with the contents of an exported JSON file.
    Import(ImportArgs),
    /// Permanently delete all transactions and budgets.
    Clear(ClearArgs),
    /// Show the dashboard and redraw it whenever another process changes the data. Stop with
    /// Ctrl-C.
    Watch,
}

/// Arguments common to all subcommands.
#[derive(Debug, Parser, Clone)]
pub struct Common {
    /// The logging verbosity. One of, from least to most verbose:
    /// off, error, warn, info, debug, trace
    ///
    /// This can be overridden by RUST_LOG.
    #[arg(long, default_value_t = LevelFilter::INFO)]
    log_level: LevelFilter,

    /// The directory where budget data and configuration is held. Defaults to ~/budgetmaster
    #[arg(long, env = "BUDGET_HOME", default_value_t = default_budget_home())]
    budget_home: DisplayPath,
}

impl Common {
    pub fn new(log_level: LevelFilter, budget_home: PathBuf) -> Self {
        Self {
            log_level,
            budget_home: budget_home.into(),
        }
    }

    pub fn log_level(&self) -> LevelFilter {
        self.log_level
    }

    pub fn budget_home(&self) -> &DisplayPath {
        &self.budget_home
    }
}

/// (Not shown): Args for the `budget add` command.
#[derive(Debug, Parser, Clone)]
pub struct AddArgs {
    /// Whether this is an income or an expense.
    #[arg(value_enum)]
    kind: TransactionKind,

    /// The amount, e.g. 12.50. Must be greater than zero.
    #[arg(long)]
    amount: Amount,

    /// The category, e.g. "Food & Dining". See `budget categories`.
    #[arg(long)]
    category: String,

    /// What the money was for.
    #[arg(long)]
    description: String,

    /// The date of the transaction, YYYY-MM-DD. Defaults to today.
    #[arg(long)]
    date: Option<NaiveDate>,
}

impl AddArgs {
    pub fn new(
        kind: TransactionKind,
        amount: Amount,
        category: impl Into<String>,
        description: impl Into<String>,
        date: Option<NaiveDate>,
    ) -> Self {
        Self {
            kind,
            amount,
            category: category.into(),
            description: description.into(),
            date,
        }
    }

    pub fn kind(&self) -> TransactionKind {
        self.kind
    }

    pub fn amount(&self) -> Amount {
        self.amount
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn date(&self) -> Option<NaiveDate> {
        self.date
    }
}

/// (Not shown): Args for the `budget delete` command.
#[derive(Debug, Parser, Clone)]
pub struct DeleteArgs {
    /// The ids of the transactions to delete.
    #[arg(required = true)]
    ids: Vec<String>,
}

impl DeleteArgs {
    pub fn new(ids: Vec<String>) -> Self {
        Self { ids }
    }

    pub fn ids(&self) -> &[String] {
        &self.ids
    }
}

/// (Not shown): Args for the `budget budget` command.
#[derive(Debug, Parser, Clone)]
pub struct BudgetArgs {
    #[command(subcommand)]
    command: BudgetCommand,
}

impl BudgetArgs {
    pub fn new(command: BudgetCommand) -> Self {
        Self { command }
    }

    pub fn command(&self) -> &BudgetCommand {
        &self.command
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum BudgetCommand {
    /// Set the cap for an expense category, replacing the existing one.
    Set(BudgetSetArgs),
    /// Recompute the amount spent against every budget as of now.
    Refresh,
}

/// (Not shown): Args for the `budget budget set` command.
#[derive(Debug, Parser, Clone)]
pub struct BudgetSetArgs {
    /// The expense category to cap.
    #[arg(long)]
    category: String,

    /// The cap. Must be greater than zero.
    #[arg(long)]
    amount: Amount,

    /// The span of time the cap applies to.
    #[arg(long, value_enum, default_value_t = Period::Monthly)]
    period: Period,
}

impl BudgetSetArgs {
    pub fn new(category: impl Into<String>, amount: Amount, period: Period) -> Self {
        Self {
            category: category.into(),
            amount,
            period,
        }
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn amount(&self) -> Amount {
        self.amount
    }

    pub fn period(&self) -> Period {
        self.period
    }
}

/// The views of the app.
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
pub enum Tab {
    #[default]
    Dashboard,
    Transactions,
    Budgets,
    Settings,
}

serde_plain::derive_display_from_serialize!(Tab);
serde_plain::derive_fromstr_from_deserialize!(Tab);

/// How list output is rendered.
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
pub enum OutputFormat {
    /// Aligned text for reading in a terminal.
    #[default]
    Table,
    /// A JSON array of records.
    Json,
    /// Comma-separated values with a header row.
    Csv,
}

serde_plain::derive_display_from_serialize!(OutputFormat);
serde_plain::derive_fromstr_from_deserialize!(OutputFormat);

/// (Not shown): Args for the `budget view` command.
#[derive(Debug, Default, Parser, Clone)]
pub struct ViewArgs {
    /// The view to show. Defaults to the last view shown.
    #[arg(value_enum)]
    tab: Option<Tab>,

    /// The output format of the transaction list.
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    format: OutputFormat,

    /// Only list income or only list expenses.
    #[arg(long, value_enum)]
    kind: Option<TransactionKind>,

    /// Only list transactions in this category.
    #[arg(long)]
    category: Option<String>,

    /// The order of the transaction list.
    #[arg(long, value_enum, default_value_t = SortBy::Date)]
    sort: SortBy,

    /// The maximum number of transactions to list.
    #[arg(long)]
    limit: Option<usize>,
}

impl ViewArgs {
    pub fn new(tab: Option<Tab>) -> Self {
        Self {
            tab,
            ..Self::default()
        }
    }

    pub fn with_format(mut self, format: OutputFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_kind(mut self, kind: Option<TransactionKind>) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_category(mut self, category: Option<String>) -> Self {
        self.category = category;
        self
    }

    pub fn with_sort(mut self, sort: SortBy) -> Self {
        self.sort = sort;
        self
    }

    pub fn with_limit(mut self, limit: Option<usize>) -> Self {
        self.limit = limit;
        self
    }

    pub fn tab(&self) -> Option<Tab> {
        self.tab
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    pub fn kind(&self) -> Option<TransactionKind> {
        self.kind
    }

    pub fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }

    pub fn sort(&self) -> SortBy {
        self.sort
    }

    pub fn limit(&self) -> Option<usize> {
        self.limit
    }
}

/// (Not shown): Args for the `budget categories` command.
#[derive(Debug, Default, Parser, Clone)]
pub struct CategoriesArgs {
    /// Only list income or only list expense categories.
    #[arg(long, value_enum)]
    kind: Option<TransactionKind>,
}

impl CategoriesArgs {
    pub fn new(kind: Option<TransactionKind>) -> Self {
        Self { kind }
    }

    pub fn kind(&self) -> Option<TransactionKind> {
        self.kind
    }
}

/// (Not shown): Args for the `budget export` command.
#[derive(Debug, Default, Parser, Clone)]
pub struct ExportArgs {
    /// Where to write the file. Defaults to budget-data-YYYY-MM-DD.json in the current directory.
    #[arg(long)]
    output: Option<PathBuf>,
}

impl ExportArgs {
    pub fn new(output: Option<PathBuf>) -> Self {
        Self { output }
    }

    pub fn output(&self) -> Option<&Path> {
        self.output.as_deref()
    }
}

/// (Not shown): Args for the `budget import` command.
#[derive(Debug, Parser, Clone)]
pub struct ImportArgs {
    /// A file written by `budget export`.
    path: PathBuf,
}

impl ImportArgs {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// (Not shown): Args for the `budget clear` command.
#[derive(Debug, Default, Parser, Clone)]
pub struct ClearArgs {
    /// Confirm that all transactions and budgets should be deleted. This cannot be undone.
    #[arg(long)]
    yes: bool,
}

impl ClearArgs {
    pub fn new(yes: bool) -> Self {
        Self { yes }
    }

    pub fn yes(&self) -> bool {
        self.yes
    }
}

fn default_budget_home() -> DisplayPath {
    DisplayPath(match dirs::home_dir() {
        Some(home) => home.join("budgetmaster"),
        None => {
            error!(
                "There was an error when trying to get your home directory. You can get around \
                this by providing --budget-home or BUDGET_HOME instead of relying on the default \
                budget home directory. If you continue using the program right now, you may have \
                problems!",
            );
            PathBuf::from("budgetmaster")
        }
    })
}

#[derive(Debug, Default, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct DisplayPath(PathBuf);

impl From<PathBuf> for DisplayPath {
    fn from(value: PathBuf) -> Self {
        DisplayPath(value)
    }
}

impl Deref for DisplayPath {
    type Target = Path;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<Path> for DisplayPath {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

impl Display for DisplayPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_string_lossy())
    }
}

impl FromStr for DisplayPath {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(PathBuf::from(s)))
    }
}

impl DisplayPath {
    pub fn new(path: PathBuf) -> Self {
        Self(path)
    }

    pub fn path(&self) -> &Path {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_args_are_well_formed() {
        <Args as CommandFactory>::command().debug_assert();
    }

    #[test]
    fn test_parse_add() {
        let args = Args::try_parse_from([
            "budget",
            "--budget-home",
            "/tmp/b",
            "add",
            "expense",
            "--amount",
            "12.50",
            "--category",
            "Food & Dining",
            "--description",
            "lunch",
            "--date",
            "2025-03-14",
        ])
        .unwrap();
        assert_eq!(args.common().budget_home().path(), Path::new("/tmp/b"));
        match args.command() {
            Command::Add(add) => {
                assert_eq!(add.kind(), TransactionKind::Expense);
                assert_eq!(add.amount(), Amount::from_str("12.5").unwrap());
                assert_eq!(add.category(), "Food & Dining");
                assert_eq!(add.date(), NaiveDate::from_ymd_opt(2025, 3, 14));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_parse_budget_set_defaults_to_monthly() {
        let args = Args::try_parse_from([
            "budget", "budget", "set", "--category", "Travel", "--amount", "300",
        ])
        .unwrap();
        match args.command() {
            Command::Budget(b) => match b.command() {
                BudgetCommand::Set(set) => assert_eq!(set.period(), Period::Monthly),
                other => panic!("unexpected command {other:?}"),
            },
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_parse_view() {
        let args = Args::try_parse_from([
            "budget", "view", "transactions", "--format", "csv", "--kind", "income", "--sort",
            "amount",
        ])
        .unwrap();
        match args.command() {
            Command::View(view) => {
                assert_eq!(view.tab(), Some(Tab::Transactions));
                assert_eq!(view.format(), OutputFormat::Csv);
                assert_eq!(view.kind(), Some(TransactionKind::Income));
                assert_eq!(view.sort(), SortBy::Amount);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_delete_requires_an_id() {
        assert!(Args::try_parse_from(["budget", "delete"]).is_err());
    }

    #[test]
    fn test_tab_round_trip() {
        assert_eq!(Tab::Budgets.to_string(), "budgets");
        assert_eq!(Tab::from_str("settings").unwrap(), Tab::Settings);
    }
}
