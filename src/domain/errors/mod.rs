//! Domain error types.

mod model_error;
mod rest_error;

pub use model_error::{IndexKind, ModelError};
pub use rest_error::RestError;
