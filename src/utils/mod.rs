//! Small helpers shared by the service and API layers.

pub mod password;
pub mod validate;

pub use validate::{ValidatedJson, ValidatedQuery};
