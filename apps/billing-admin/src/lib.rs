//! # billing-admin
//!
//! Operator command-line tool over the billing database.
//!
//! ## Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         billing-admin                                   │
//! │                                                                         │
//! │  Cli::parse() ──► run(cli)                                              │
//! │                     │                                                   │
//! │                     ├── AdminConfig::load()  (env + --db-path)          │
//! │                     ├── Database::new(config.db_config())               │
//! │                     ├── commands::execute()  ──► serde_json::Value      │
//! │                     └── Database::close()                               │
//! │                                                                         │
//! │  main.rs prints the value on stdout, or the AdminError on stderr and   │
//! │  exits with the error code's exit status.                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Log Levels
//! Logs go to stderr so stdout stays machine-readable.
//! - `RUST_LOG=debug` - Show debug messages
//! - `RUST_LOG=billing_db=trace` - Trace the database layer only
//! - Default: `info,billing_core=debug,billing_db=debug,billing_admin=debug,sqlx=warn`

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;

use billing_db::Database;
use serde_json::Value;
use tracing::info;

pub use cli::{Cli, Command};
pub use config::{AdminConfig, ConfigError};
pub use error::{AdminError, AdminResult, ErrorCode};

/// Loads configuration, opens the database and runs one command.
pub async fn run(cli: Cli) -> AdminResult<Value> {
    let mut config = AdminConfig::load()?;
    if let Some(path) = cli.db_path {
        config = config.with_database_path(path);
    }
    if cli.command == Command::Migrate {
        config.run_migrations = true;
    }
    config.ensure_data_dir()?;

    info!(db_path = ?config.database_path, "Opening billing database");
    let db = Database::new(config.db_config()).await?;

    let result = commands::execute(&db, cli.command).await;
    db.close().await;
    result
}
