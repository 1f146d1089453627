//! # Registrar Auth
//!
//! Sessions are issued by the external identity provider. This crate only
//! knows how to read them:
//!
//! - [`claims`]: the claim set carried by a session token
//! - [`token`]: signature/expiry/issuer/audience verification, plus token
//!   minting for tests and the developer CLI
//!
//! Mapping a verified `sub` onto an internal user happens in the API crate,
//! where the database is available.

pub mod claims;
pub mod token;

pub use claims::SessionClaims;
pub use token::{issue_session_token, verify_session_token};
