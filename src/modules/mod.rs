//! Feature modules. Each has a controller (handlers), a router, a service
//! (queries) and a model re-export from `registrar-models`.

pub mod courses;
pub mod dashboard;
pub mod departments;
pub mod documents;
pub mod grades;
pub mod me;
pub mod parents;
pub mod recommendations;
pub mod reports;
pub mod semesters;
pub mod students;
pub mod teachers;
pub mod users;
