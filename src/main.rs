use budgetmaster::args::{Args, BudgetCommand, Command};
use budgetmaster::{commands, Config, Result, StoreMode};
use clap::Parser;
use std::process::ExitCode;
use tracing::{debug, error, trace};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    let log_level = args.common().log_level();
    init_logger(log_level);
    debug!("Log level set to {}", log_level.to_string().to_lowercase());

    match main_inner(args).await {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Exiting with error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

pub async fn main_inner(args: Args) -> Result<()> {
    trace!("{args:?}");
    let home = args.common().budget_home().path();

    // When BUDGET_IN_MEMORY is set and non-empty the program runs against an empty in-memory
    // store instead of the files in the home directory.
    let mode = StoreMode::from_env();

    let _: () = match args.command() {
        Command::Init => commands::init(home).await?.print(),
        Command::Add(add_args) => {
            let config = Config::load(home).await?;
            commands::add(config, mode, add_args.clone())
                .await?
                .print()
        }
        Command::Delete(delete_args) => {
            let config = Config::load(home).await?;
            commands::delete(config, mode, delete_args.clone())
                .await?
                .print()
        }
        Command::Budget(budget_args) => {
            let config = Config::load(home).await?;
            match budget_args.command() {
                BudgetCommand::Set(set_args) => {
                    commands::budget_set(config, mode, set_args.clone())
                        .await?
                        .print()
                }
                BudgetCommand::Refresh => commands::budget_refresh(config, mode).await?.print(),
            }
        }
        Command::View(view_args) => {
            let config = Config::load(home).await?;
            commands::view(config, mode, view_args.clone())
                .await?
                .print()
        }
        Command::Categories(categories_args) => {
            // Validates the home directory even though the registry is static.
            let _config = Config::load(home).await?;
            commands::categories(categories_args.clone()).print()
        }
        Command::Export(export_args) => {
            let config = Config::load(home).await?;
            commands::export(config, mode, export_args.clone())
                .await?
                .print()
        }
        Command::Import(import_args) => {
            let config = Config::load(home).await?;
            commands::import(config, mode, import_args.clone())
                .await?
                .print()
        }
        Command::Clear(clear_args) => {
            let config = Config::load(home).await?;
            commands::clear(config, mode, clear_args.clone())
                .await?
                .print()
        }
        Command::Watch => commands::watch(Config::load(home).await?, mode)
            .await?
            .print(),
    };
    Ok(())
}

/// Initializes the tracing subscriber.
pub fn init_logger(level: LevelFilter) {
    let filter = match std::env::var("RUST_LOG").ok() {
        Some(_) => {
            // RUST_LOG exists; use it.
            EnvFilter::from_default_env()
        }
        None => {
            // RUST_LOG does not exist; use default log level for this package only.
            EnvFilter::new(format!(
                "{}={},{}={}",
                env!("CARGO_PKG_NAME"),
                level,
                env!("CARGO_BIN_NAME"),
                level
            ))
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
