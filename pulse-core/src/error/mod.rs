mod error;

pub use error::{Failure, Operation, RegistryErr, Result};
