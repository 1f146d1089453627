//! Helpers shared by the feature modules.
//!
//! - [`access`]: record-level checks (own record, linked child, taught course)
//! - [`response`]: small response bodies reused across modules

pub mod access;
pub mod response;
