//! # Registrar API
//!
//! Academic records service built with Axum and PostgreSQL. Students,
//! teachers, admins and parents share one API; what each may see and change
//! is decided by their role and by record-level checks.
//!
//! ## Architecture
//!
//! ```text
//! src/
//! ├── middleware/       # Session layer, CurrentUser and Require* extractors
//! ├── modules/          # Feature modules
//! │   ├── me/           # The caller's profile
//! │   ├── users/        # Accounts and student/teacher profiles
//! │   ├── departments/
//! │   ├── semesters/    # Single active semester
//! │   ├── students/     # Records, summaries, GPA recompute
//! │   ├── teachers/
//! │   ├── courses/      # Courses, enrollments, rosters
//! │   ├── grades/
//! │   ├── documents/    # Pending → uploaded → approved/rejected, expiry
//! │   ├── recommendations/
//! │   ├── parents/      # Parent to child links
//! │   ├── dashboard/    # Per-role dashboards
//! │   └── reports/      # Grade statistics, enrollment trend
//! └── utils/            # Record-level access checks, shared responses
//! ```
//!
//! Each feature module has `controller.rs` (handlers), `router.rs`,
//! `service.rs` (queries) and `model.rs` (re-exports from
//! `registrar-models`).
//!
//! ## Authentication
//!
//! Sessions are issued by an external identity provider. The service
//! verifies the token (bearer header or session cookie), binds its subject
//! to a local user by `external_id`, and rejects unknown identities with 401
//! and inactive accounts with 403. Everything under `/api` except
//! `/api/health` requires a session.
//!
//! ## Roles
//!
//! | Role | Sees |
//! |------|------|
//! | Admin | Everything |
//! | Teacher | Students enrolled in their courses, grades of those courses, all documents |
//! | Student | Their own records |
//! | Parent | Records of linked children |
//!
//! ## API Documentation
//!
//! - Swagger UI: `http://localhost:3000/swagger-ui`
//! - Scalar: `http://localhost:3000/scalar`

pub mod docs;
pub mod middleware;
pub mod modules;
pub mod router;
pub mod state;
pub mod utils;
pub mod validator;

// Re-export workspace crates for convenience
pub use registrar_auth;
pub use registrar_config;
pub use registrar_core;
pub use registrar_db;
pub use registrar_models;
