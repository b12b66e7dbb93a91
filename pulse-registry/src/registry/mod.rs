#[cfg(feature = "http")]
mod http;
mod registry;

pub use registry::Registry;

#[cfg(feature = "http")]
pub use http::{HttpRegistry, RegistryConfig};
