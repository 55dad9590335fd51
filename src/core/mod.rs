pub mod error;
pub mod types;

pub use error::{CourierError, Result};
pub use types::{JobId, Position, Step};
