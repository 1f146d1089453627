//! Session and role middleware.
//!
//! - [`auth`]: session token resolution and the [`auth::CurrentUser`] extractor
//! - [`role`]: the role gate and its `Require*` extractors
//!
//! # Flow
//!
//! 1. `require_session` runs as a layer on `/api` and resolves the caller
//! 2. A `Require*` extractor (or plain `CurrentUser`) checks the role
//! 3. Services apply record-level checks (own record, linked child, taught course)

pub mod auth;
pub mod role;
