//! Command-line caller for the userdesk account core.
//!
//! # Responsibility
//! - Stand in for the web layer: register accounts and check logins.
//! - Wire config, logging, database and hasher into one `AccountStore`.
//!
//! Exit codes: `0` accepted, `1` refused (invalid input, duplicate, unknown
//! user, wrong password), `2` error.

use clap::{Parser, Subcommand};
use log::error;
use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;
use userdesk_core::db::open_db;
use userdesk_core::{
    init_logging, validate_registration, AccountStore, AppConfig, Argon2PasswordHasher,
    AuthOutcome, RegisterOutcome, SqliteAccountRepository,
};

#[derive(Debug, Parser)]
#[command(name = "userdesk", version, about = "Account registration and login")]
struct Cli {
    /// TOML config file; defaults apply when omitted.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Database file, overriding `database.path` from config.
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print core linkage info.
    Ping,
    /// Create a new account.
    Register {
        #[arg(long)]
        username: String,
        #[arg(long)]
        email: String,
        /// Prompted without echo when omitted.
        #[arg(long)]
        password: Option<String>,
    },
    /// Check a username/password pair.
    Login {
        #[arg(long)]
        username: String,
        #[arg(long)]
        password: Option<String>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(code) => code,
        Err(err) => {
            error!("event=cli_run module=cli status=error error={err}");
            eprintln!("error: {err}");
            ExitCode::from(2)
        }
    }
}

type CliStore<'conn> = AccountStore<SqliteAccountRepository<'conn>, Argon2PasswordHasher>;

fn run(cli: Cli) -> Result<ExitCode, Box<dyn Error>> {
    match cli.command {
        Command::Ping => {
            println!("userdesk_core ping={}", userdesk_core::ping());
            println!("userdesk_core version={}", userdesk_core::core_version());
            Ok(ExitCode::SUCCESS)
        }
        Command::Register {
            username,
            email,
            password,
        } => with_store(cli.config, cli.db, |store| {
            let password = read_password(password)?;
            // Form rules are enforced here; the store accepts any fresh pair.
            if let Err(err) = validate_registration(&username, &email, &password) {
                println!("{err}");
                return Ok(ExitCode::from(1));
            }
            match store.register(&username, &password, &email)? {
                RegisterOutcome::Registered(id) => {
                    println!("registered `{username}` (id {id})");
                    Ok(ExitCode::SUCCESS)
                }
                RegisterOutcome::DuplicateUsername => {
                    println!("username `{username}` is already taken");
                    Ok(ExitCode::from(1))
                }
                RegisterOutcome::DuplicateEmail => {
                    println!("email `{email}` is already registered");
                    Ok(ExitCode::from(1))
                }
            }
        }),
        Command::Login { username, password } => with_store(cli.config, cli.db, |store| {
            let password = read_password(password)?;
            match store.authenticate(&username, &password)? {
                AuthOutcome::Success => {
                    println!("login ok for `{username}`");
                    Ok(ExitCode::SUCCESS)
                }
                // One message for both so the output does not reveal which
                // usernames exist.
                AuthOutcome::NoSuchUser | AuthOutcome::BadPassword => {
                    println!("invalid username or password");
                    Ok(ExitCode::from(1))
                }
            }
        }),
    }
}

/// Loads config, starts logging and opens the store for one command.
fn with_store(
    config_path: Option<PathBuf>,
    db_override: Option<PathBuf>,
    action: impl FnOnce(&CliStore<'_>) -> Result<ExitCode, Box<dyn Error>>,
) -> Result<ExitCode, Box<dyn Error>> {
    let mut config = match config_path {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::default(),
    };
    if let Some(db) = db_override {
        config.database.path = db;
    }

    if let Some(dir) = config.logging.dir.as_ref() {
        init_logging(&config.logging.level, std::path::absolute(dir)?)?;
    }

    let conn = open_db(&config.database.path)?;
    let repo = SqliteAccountRepository::try_new(&conn)?;
    let store = AccountStore::new(repo, config.hasher.build()?);
    action(&store)
}

fn read_password(given: Option<String>) -> std::io::Result<String> {
    match given {
        Some(password) => Ok(password),
        None => rpassword::prompt_password("Password: "),
    }
}
