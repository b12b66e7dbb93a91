mod client;
mod heartbeat;

pub use client::{ErrorHook, LifecycleState, RegistryClient};
pub use heartbeat::HeartbeatHandle;
