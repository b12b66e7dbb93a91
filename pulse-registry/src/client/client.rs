use crate::client::heartbeat::{self, HeartbeatHandle};
use crate::registry::Registry;
use pulse_core::{Instance, RegistryErr, Result};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

#[cfg(feature = "http")]
use crate::registry::{HttpRegistry, RegistryConfig};

/// 心跳循环中失败的上报回调
pub type ErrorHook = Arc<dyn Fn(&RegistryErr) + Send + Sync>;

/// 心跳生命周期状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Idle,
    Running,
    /// 循环已被取消，客户端不能再次启动
    ///
    /// 一旦请求停止即进入该状态，此时清理注销可能仍在进行；
    /// 需要确认注销完成时等待 `HeartbeatHandle::stopped()`。
    Stopped,
}

enum Lifecycle {
    Idle,
    Running(HeartbeatHandle),
}

/// 注册中心客户端：一个实例对应一次心跳会话
pub struct RegistryClient<R>
where
    R: Registry,
{
    registry: R,
    instance: Instance,
    interval: Duration,
    on_error: Option<ErrorHook>,
    lifecycle: Mutex<Lifecycle>,
}

#[cfg(feature = "http")]
impl RegistryClient<HttpRegistry> {
    /// 使用默认超时创建 HTTP 客户端
    pub fn new(base_url: impl Into<String>, instance: Instance, interval: Duration) -> Result<Self> {
        let config = RegistryConfig::new(base_url).with_heartbeat_interval(interval);
        Self::from_config(config, instance)
    }

    pub fn from_config(config: RegistryConfig, instance: Instance) -> Result<Self> {
        let interval = config.heartbeat_interval;
        let registry = HttpRegistry::new(config)?;
        Self::with_registry(registry, instance, interval)
    }
}

impl<R> RegistryClient<R>
where
    R: Registry,
{
    /// 使用任意注册中心实现创建客户端
    pub fn with_registry(registry: R, instance: Instance, interval: Duration) -> Result<Self> {
        instance.validate()?;
        if interval.is_zero() {
            return Err(RegistryErr::invalid_config("heartbeat interval must be positive"));
        }

        Ok(Self {
            registry,
            instance,
            interval,
            on_error: None,
            lifecycle: Mutex::new(Lifecycle::Idle),
        })
    }

    /// 设置心跳循环的失败回调（日志之外的上报通道）
    pub fn on_error<F>(mut self, hook: F) -> Self
    where
        F: Fn(&RegistryErr) + Send + Sync + 'static,
    {
        self.on_error = Some(Arc::new(hook));
        self
    }

    pub fn instance(&self) -> &Instance {
        &self.instance
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn registry(&self) -> &R {
        &self.registry
    }

    /// 注册服务
    pub async fn register(&self, cancel: &CancellationToken) -> Result<()> {
        self.registry.register(&self.instance, cancel).await
    }

    /// 注销服务
    pub async fn deregister(&self, cancel: &CancellationToken) -> Result<()> {
        self.registry.deregister(&self.instance.key(), cancel).await
    }

    /// 发送一次心跳
    pub async fn heartbeat(&self, cancel: &CancellationToken) -> Result<()> {
        self.registry.heartbeat(&self.instance.key(), cancel).await
    }

    /// 启动心跳循环
    ///
    /// 已在运行时返回同一个句柄；停止后再次调用返回 `InvalidState`。
    pub fn start_heartbeat(&self) -> Result<HeartbeatHandle> {
        self.start(CancellationToken::new())
    }

    /// 启动心跳循环，`parent` 被取消时循环同样停止并注销
    pub fn start_heartbeat_with(&self, parent: &CancellationToken) -> Result<HeartbeatHandle> {
        self.start(parent.child_token())
    }

    pub fn state(&self) -> LifecycleState {
        match &*self.lock() {
            Lifecycle::Idle => LifecycleState::Idle,
            Lifecycle::Running(handle) if handle.is_stopped() => LifecycleState::Stopped,
            Lifecycle::Running(_) => LifecycleState::Running,
        }
    }

    fn start(&self, cancel: CancellationToken) -> Result<HeartbeatHandle> {
        let mut lifecycle = self.lock();

        if let Lifecycle::Running(handle) = &*lifecycle {
            if handle.is_stopped() {
                return Err(RegistryErr::invalid_state(format!(
                    "heartbeat for {} already stopped",
                    self.instance.key()
                )));
            }
            return Ok(handle.clone());
        }

        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| RegistryErr::invalid_state(format!("no tokio runtime: {}", e)))?;

        let handle = heartbeat::spawn(
            &runtime,
            self.registry.clone(),
            self.instance.key(),
            self.interval,
            cancel,
            self.on_error.clone(),
        );
        *lifecycle = Lifecycle::Running(handle.clone());
        Ok(handle)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Lifecycle> {
        // 临界区内不会 panic，中毒时直接取回状态
        self.lifecycle.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl<R> std::fmt::Debug for RegistryClient<R>
where
    R: Registry + std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistryClient")
            .field("registry", &self.registry)
            .field("instance", &self.instance)
            .field("interval", &self.interval)
            .field("state", &self.state())
            .finish()
    }
}
