//! Teacher models re-exported from `registrar-models`.

pub use registrar_models::teachers::*;
