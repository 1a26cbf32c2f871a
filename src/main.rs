use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use finance_planner::cli::{
    handle_add_transaction, handle_list_transactions, handle_rename_profile, handle_stats,
    handle_update_transaction, AddTransactionArgs, ListTransactionsArgs, RenameProfileArgs,
    StatsArgs, UpdateTransactionArgs,
};
use finance_planner::config::{BackendKind, FinancePaths, Settings};
use finance_planner::logging;
use finance_planner::storage::Storage;

#[derive(Parser)]
#[command(
    name = "finance",
    version,
    about = "Quick and easy profile-based financial planner",
    long_about = "Track labeled, tagged transactions per profile. Data lives in a \
                  SQLite database or in plain JSON documents, chosen at startup."
)]
struct Cli {
    /// Storage directory
    #[arg(long, global = true, env = "FINANCE_PLANNER_DIR", value_name = "DIR")]
    data_dir: Option<PathBuf>,

    /// Storage backend (sqlite or json)
    #[arg(long, global = true, env = "FINANCE_PLANNER_BACKEND", value_name = "BACKEND")]
    backend: Option<BackendKind>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Add a transaction to the profile
    #[command(alias = "add")]
    AddTransaction(AddTransactionArgs),

    /// Update a transaction in the profile
    #[command(alias = "update")]
    UpdateTransaction(UpdateTransactionArgs),

    /// List all transactions for the profile
    #[command(alias = "list")]
    ListTransactions(ListTransactionsArgs),

    /// Show balance and totals for the profile
    Stats(StatsArgs),

    /// Give a profile a new name
    RenameProfile(RenameProfileArgs),

    /// Show current configuration and paths
    Config {
        /// Persist the effective settings to config.json
        #[arg(long)]
        save: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let paths = match cli.data_dir {
        Some(dir) => FinancePaths::with_base_dir(dir),
        None => FinancePaths::new()?,
    };
    let mut settings = Settings::load_or_create(&paths)?;
    logging::init(&settings.log_level);

    if let Some(backend) = cli.backend {
        settings.backend = backend;
    }

    // Exactly one backend is built, and only for commands that need it
    let open_storage = || Storage::open(&paths, settings.backend);

    match cli.command {
        Some(Commands::AddTransaction(args)) => handle_add_transaction(&open_storage()?, args)?,
        Some(Commands::UpdateTransaction(args)) => {
            handle_update_transaction(&open_storage()?, args)?
        }
        Some(Commands::ListTransactions(args)) => {
            handle_list_transactions(&open_storage()?, args)?
        }
        Some(Commands::Stats(args)) => handle_stats(&open_storage()?, args)?,
        Some(Commands::RenameProfile(args)) => handle_rename_profile(&open_storage()?, args)?,
        Some(Commands::Config { save }) => {
            println!("Finance planner configuration");
            println!("=============================");
            println!("Storage directory: {}", paths.base_dir().display());
            println!("Settings file:     {}", paths.settings_file().display());
            println!("Database file:     {}", paths.database_file().display());
            println!("Profiles dir:      {}", paths.profiles_dir().display());
            println!();
            println!("Settings:");
            println!("  Backend:   {}", settings.backend);
            println!("  Log level: {}", settings.log_level);
            if save {
                settings.save(&paths)?;
                println!();
                println!("Settings saved.");
            }
        }
        None => {
            println!("Finance planner - profile-based transaction tracking");
            println!();
            println!("Run 'finance --help' for usage information.");
        }
    }

    Ok(())
}
