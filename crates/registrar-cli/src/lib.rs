//! # Registrar CLI
//!
//! Library half of the `registrar-cli` binary:
//!
//! - [`admin`]: bind an external identity to a new admin user
//! - [`seeder`]: parallel demo data generation and cleanup
//!
//! ```ignore
//! use registrar_cli::seeder::{SeedConfig, seed_all};
//!
//! seed_all(&pool, SeedConfig::default()).await?;
//! ```

pub mod admin;
pub mod seeder;
