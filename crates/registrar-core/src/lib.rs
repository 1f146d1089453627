//! # Registrar Core
//!
//! Core types, errors, and utilities for the Registrar API.
//!
//! - [`errors`]: Application error type with HTTP response conversion
//! - [`pagination`]: Pagination utilities for API responses
//! - [`serde`]: Custom serde deserialization helpers for query strings
//!
//! # Example
//!
//! ```ignore
//! use registrar_core::errors::AppError;
//! use registrar_core::pagination::{PaginationParams, PaginationMeta};
//!
//! let error = AppError::not_found(anyhow::anyhow!("Student not found"));
//!
//! let params = PaginationParams::default();
//! let limit = params.limit();
//! ```

pub mod errors;
pub mod pagination;
pub mod serde;

pub use errors::{AppError, ErrorResponse};
pub use pagination::{Paginated, PaginationMeta, PaginationParams};
