// User Registry - Command-line adapter
// Marshals arguments into service calls and prints the outcome

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

use user_registry::{logging, store, Config, User, UserError, UserService};

#[derive(Parser)]
#[command(name = "user-registry", version, about = "Manage registered users")]
struct Cli {
    /// TOML configuration file
    #[arg(long, env = "USER_REGISTRY_CONFIG")]
    config: Option<PathBuf>,

    /// Storage backend: statement or mapped
    #[arg(long)]
    backend: Option<String>,

    /// SQLite database file
    #[arg(long)]
    database: Option<String>,

    /// Print users as JSON
    #[arg(long)]
    json: bool,

    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Register a new user
    Create { name: String, email: String },
    /// List every user
    List,
    /// Show one user
    Get { id: i64 },
    /// Replace a user's name and email
    Update { id: i64, name: String, email: String },
    /// Remove a user
    Delete { id: i64 },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("❌ {:#}", err);
            exit_code(&err)
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let mut config = Config::load(cli.config.as_deref())?;
    config.apply_overrides(cli.backend.as_deref(), cli.database.as_deref())?;

    logging::init(&config.logging.filter, cli.verbose)?;

    let store = store::open(&config.storage).with_context(|| {
        format!(
            "Failed to open {} store at {}",
            config.storage.backend,
            config.storage.database_path.display()
        )
    })?;
    let service = UserService::new(store);

    match cli.command {
        Command::Create { name, email } => {
            let user = service.create(&name, &email)?;
            print_user(&user, cli.json)?;
        }
        Command::List => {
            let users = service.find_all()?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&users)?);
            } else if users.is_empty() {
                println!("(no users)");
            } else {
                for user in &users {
                    println!("{}", user);
                }
            }
        }
        Command::Get { id } => {
            let user = service.find_by_id(id)?;
            print_user(&user, cli.json)?;
        }
        Command::Update { id, name, email } => {
            let user = service.update(id, &name, &email)?;
            print_user(&user, cli.json)?;
        }
        Command::Delete { id } => {
            service.delete_by_id(id)?;
            println!("✓ Deleted user {}", id);
        }
    }

    Ok(())
}

fn print_user(user: &User, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(user)?);
    } else {
        println!("{}", user);
    }
    Ok(())
}

/// 2 = bad input, 3 = not found, 1 = everything else
fn exit_code(err: &anyhow::Error) -> ExitCode {
    match err.downcast_ref::<UserError>() {
        Some(UserError::Validation(_)) => ExitCode::from(2),
        Some(UserError::NotFound(_)) => ExitCode::from(3),
        _ => ExitCode::FAILURE,
    }
}
