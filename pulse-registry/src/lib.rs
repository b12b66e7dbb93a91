pub mod client;
pub mod registry;

pub use client::{ErrorHook, HeartbeatHandle, LifecycleState, RegistryClient};
pub use registry::Registry;

#[cfg(feature = "http")]
pub use registry::{HttpRegistry, RegistryConfig};

pub use pulse_core::{Failure, Instance, InstanceBuilder, InstanceKey, Operation, RegistryErr, Result};

// 取消信号
pub use tokio_util::sync::CancellationToken;
