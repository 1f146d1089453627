//! PostgreSQL connection settings.
//!
//! - `DATABASE_URL`: connection string (required by the server binary)
//! - `DATABASE_MAX_CONNECTIONS`: pool size (default 10)
//! - `DATABASE_RUN_MIGRATIONS`: apply embedded migrations on startup (default true)

use crate::{non_empty, parse_or};

#[derive(Clone, Debug)]
pub struct DatabaseConfig {
    pub url: Option<String>,
    pub max_connections: u32,
    pub run_migrations: bool,
}

impl DatabaseConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            url: non_empty(&lookup, "DATABASE_URL"),
            max_connections: parse_or(&lookup, "DATABASE_MAX_CONNECTIONS", 10),
            run_migrations: lookup("DATABASE_RUN_MIGRATIONS")
                .map(|v| v.to_lowercase() != "false" && v != "0")
                .unwrap_or(true),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::lookup_from;

    #[test]
    fn test_defaults() {
        let config = DatabaseConfig::from_lookup(lookup_from(&[]));
        assert!(config.url.is_none());
        assert_eq!(config.max_connections, 10);
        assert!(config.run_migrations);
    }

    #[test]
    fn test_overrides() {
        let config = DatabaseConfig::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://localhost/registrar"),
            ("DATABASE_MAX_CONNECTIONS", "4"),
            ("DATABASE_RUN_MIGRATIONS", "false"),
        ]));
        assert_eq!(config.url.as_deref(), Some("postgres://localhost/registrar"));
        assert_eq!(config.max_connections, 4);
        assert!(!config.run_migrations);
    }
}
