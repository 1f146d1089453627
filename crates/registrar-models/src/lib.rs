//! # Registrar Models
//!
//! Entities, DTOs and typed ids for the Registrar API, plus the two pure
//! layers every endpoint leans on:
//!
//! - [`aggregate`]: averages, pass rates, GPA, status breakdowns and trends
//! - [`display`]: display ids and enum labels for external DTOs
//!
//! Row structs derive `sqlx::FromRow` and are shaped into `*Dto` types
//! before leaving the service. Postgres enums map onto Rust enums through
//! `sqlx::Type`.

pub mod aggregate;
pub mod courses;
pub mod dashboard;
pub mod departments;
pub mod display;
pub mod documents;
pub mod enrollments;
pub mod grades;
pub mod ids;
pub mod parents;
pub mod recommendations;
pub mod semesters;
pub mod students;
pub mod teachers;
pub mod users;

pub use display::Labeled;
pub use ids::{
    CourseId, DepartmentId, DocumentId, EnrollmentId, GradeId, RecommendationId, SemesterId,
    StudentId, TeacherId, UserId,
};
pub use users::{User, UserRole, UserStatus};
