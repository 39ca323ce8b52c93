//! Admin tool configuration.
//!
//! Configuration is loaded from environment variables with fallback to
//! defaults. A `--db-path` flag on the command line wins over
//! `BILLING_DB_PATH`.
//!
//! | Variable                       | Default                          |
//! |--------------------------------|----------------------------------|
//! | `BILLING_DB_PATH`              | `<platform data dir>/billing.db` |
//! | `BILLING_MAX_CONNECTIONS`      | `5`                              |
//! | `BILLING_CONNECT_TIMEOUT_SECS` | `30`                             |
//! | `BILLING_RUN_MIGRATIONS`       | `true`                           |

use std::env;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use billing_db::DbConfig;
use directories::ProjectDirs;
use serde::Serialize;

const DB_FILE_NAME: &str = "billing.db";

/// Admin tool configuration.
#[derive(Debug, Clone, Serialize)]
pub struct AdminConfig {
    /// SQLite database file
    pub database_path: PathBuf,

    /// Pool size
    pub max_connections: u32,

    /// Seconds to wait for a pooled connection
    pub connect_timeout_secs: u64,

    /// Apply pending migrations on startup
    pub run_migrations: bool,
}

impl AdminConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let database_path = match lookup("BILLING_DB_PATH") {
            Some(path) if !path.trim().is_empty() => PathBuf::from(path),
            _ => default_database_path()?,
        };

        Ok(AdminConfig {
            database_path,
            max_connections: parse_or(&lookup, "BILLING_MAX_CONNECTIONS", 5)?,
            connect_timeout_secs: parse_or(&lookup, "BILLING_CONNECT_TIMEOUT_SECS", 30)?,
            run_migrations: parse_or(&lookup, "BILLING_RUN_MIGRATIONS", true)?,
        })
    }

    /// Replaces the database path (from `--db-path`).
    pub fn with_database_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.database_path = path.into();
        self
    }

    /// Pool configuration for billing-db.
    pub fn db_config(&self) -> DbConfig {
        DbConfig::new(self.database_path.clone())
            .max_connections(self.max_connections.max(1))
            .connect_timeout(Duration::from_secs(self.connect_timeout_secs))
            .run_migrations(self.run_migrations)
    }

    /// Creates the directory holding the database file if it is missing.
    pub fn ensure_data_dir(&self) -> Result<(), ConfigError> {
        match self.database_path.parent() {
            Some(dir) if dir != Path::new("") => std::fs::create_dir_all(dir)
                .map_err(|e| ConfigError::DataDir(format!("{}: {}", dir.display(), e))),
            _ => Ok(()),
        }
    }
}

fn parse_or<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue(key.to_string())),
        None => Ok(default),
    }
}

/// `<platform data dir>/billing.db`, e.g. `~/.local/share/admin/billing.db`.
fn default_database_path() -> Result<PathBuf, ConfigError> {
    let dirs = ProjectDirs::from("com", "billing", "admin").ok_or_else(|| {
        ConfigError::DataDir("could not determine the platform data directory".to_string())
    })?;
    Ok(dirs.data_dir().join(DB_FILE_NAME))
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),

    #[error("Data directory unavailable: {0}")]
    DataDir(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = AdminConfig::from_lookup(lookup(&[("BILLING_DB_PATH", "/tmp/b.db")])).unwrap();
        assert_eq!(config.database_path, PathBuf::from("/tmp/b.db"));
        assert_eq!(config.max_connections, 5);
        assert_eq!(config.connect_timeout_secs, 30);
        assert!(config.run_migrations);
    }

    #[test]
    fn test_overrides() {
        let config = AdminConfig::from_lookup(lookup(&[
            ("BILLING_DB_PATH", "/tmp/b.db"),
            ("BILLING_MAX_CONNECTIONS", "2"),
            ("BILLING_CONNECT_TIMEOUT_SECS", " 10 "),
            ("BILLING_RUN_MIGRATIONS", "false"),
        ]))
        .unwrap();
        assert_eq!(config.max_connections, 2);
        assert_eq!(config.connect_timeout_secs, 10);
        assert!(!config.run_migrations);

        let db = config.db_config();
        assert_eq!(db.max_connections, 2);
        assert_eq!(db.connect_timeout, Duration::from_secs(10));
        assert!(!db.run_migrations);
    }

    #[test]
    fn test_invalid_value_names_the_variable() {
        let err = AdminConfig::from_lookup(lookup(&[
            ("BILLING_DB_PATH", "/tmp/b.db"),
            ("BILLING_MAX_CONNECTIONS", "many"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(ref key) if key == "BILLING_MAX_CONNECTIONS"));
    }

    #[test]
    fn test_flag_overrides_path() {
        let config = AdminConfig::from_lookup(lookup(&[("BILLING_DB_PATH", "/tmp/a.db")]))
            .unwrap()
            .with_database_path("/tmp/c.db");
        assert_eq!(config.db_config().database_path, PathBuf::from("/tmp/c.db"));
    }

    #[test]
    fn test_zero_connections_clamped() {
        let config = AdminConfig::from_lookup(lookup(&[
            ("BILLING_DB_PATH", "/tmp/b.db"),
            ("BILLING_MAX_CONNECTIONS", "0"),
        ]))
        .unwrap();
        assert_eq!(config.db_config().max_connections, 1);
    }
}
