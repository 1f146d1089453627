//! Course and enrollment models re-exported from `registrar-models`.

pub use registrar_models::courses::*;
pub use registrar_models::enrollments::*;
