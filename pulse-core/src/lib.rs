pub mod error;
pub mod instance;

pub use error::{Failure, Operation, RegistryErr, Result};
pub use instance::{Instance, InstanceBuilder, InstanceKey};
