//! # Registrar Config
//!
//! Configuration types for the Registrar API, loaded from environment
//! variables (a `.env` file is read by the binaries through `dotenvy`).
//!
//! - [`academic`]: grading thresholds used by the aggregator
//! - [`cors`]: CORS (Cross-Origin Resource Sharing) configuration
//! - [`database`]: PostgreSQL connection settings
//! - [`identity`]: identity-provider session token verification settings
//! - [`server`]: listen address
//!
//! Every struct exposes `from_env()` plus `from_lookup()`, which takes the
//! variable source as a closure so parsing can be tested without touching
//! the process environment.

pub mod academic;
pub mod cors;
pub mod database;
pub mod identity;
pub mod server;

pub use academic::AcademicConfig;
pub use cors::CorsConfig;
pub use database::DatabaseConfig;
pub use identity::IdentityConfig;
pub use server::ServerConfig;

/// Read and parse a variable, falling back to `default` when it is unset or unparsable.
pub(crate) fn parse_or<T, F>(lookup: &F, key: &str, default: T) -> T
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

/// Read a variable, treating blank values as unset.
pub(crate) fn non_empty<F>(lookup: &F, key: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::collections::HashMap;

    pub fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }
}
