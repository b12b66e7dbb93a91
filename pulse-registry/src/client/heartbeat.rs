//! 心跳循环与其停止句柄

use crate::client::ErrorHook;
use crate::registry::Registry;
use pulse_core::{InstanceKey, RegistryErr};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

/// 心跳循环的停止句柄
///
/// 克隆出的句柄指向同一个循环，`==` 按身份比较。
#[derive(Debug, Clone)]
pub struct HeartbeatHandle {
    inner: Arc<HandleInner>,
}

#[derive(Debug)]
struct HandleInner {
    cancel: CancellationToken,
    // 循环退出（含清理注销完成）时 sender 被 drop
    done: watch::Receiver<()>,
}

impl HeartbeatHandle {
    /// 停止心跳；可重复调用
    pub fn stop(&self) {
        self.inner.cancel.cancel();
    }

    /// 是否已请求停止（显式停止或父令牌取消）
    pub fn is_stopped(&self) -> bool {
        self.inner.cancel.is_cancelled()
    }

    /// 等待循环退出，此时清理注销已经执行完毕
    pub async fn stopped(&self) {
        let mut done = self.inner.done.clone();
        while done.changed().await.is_ok() {}
    }
}

impl PartialEq for HeartbeatHandle {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for HeartbeatHandle {}

/// 启动后台心跳循环并返回其句柄
pub(crate) fn spawn<R>(
    runtime: &Handle,
    registry: R,
    key: InstanceKey,
    interval: Duration,
    cancel: CancellationToken,
    on_error: Option<ErrorHook>,
) -> HeartbeatHandle
where
    R: Registry,
{
    let (done_tx, done_rx) = watch::channel(());
    let handle = HeartbeatHandle {
        inner: Arc::new(HandleInner {
            cancel: cancel.clone(),
            done: done_rx,
        }),
    };

    let heartbeat = HeartbeatLoop {
        registry,
        key,
        on_error,
    };
    runtime.spawn(async move {
        heartbeat.run(interval, cancel).await;
        drop(done_tx);
    });

    handle
}

struct HeartbeatLoop<R> {
    registry: R,
    key: InstanceKey,
    on_error: Option<ErrorHook>,
}

impl<R> HeartbeatLoop<R>
where
    R: Registry,
{
    async fn run(&self, period: Duration, cancel: CancellationToken) {
        log::info!("Heartbeat started for {} (every {:?})", self.key, period);

        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {
                    match self.registry.heartbeat(&self.key, &cancel).await {
                        Ok(()) => log::debug!("Heartbeat sent for {}", self.key),
                        // 停止时被中断的调用不算失败，状态码失败照常上报
                        Err(e) if cancel.is_cancelled() && e.is_transport() => {
                            log::debug!("Heartbeat for {} interrupted by stop: {}", self.key, e);
                        }
                        Err(e) => {
                            log::warn!("Heartbeat failed for {}: {}", self.key, e);
                            self.report(&e);
                        }
                    }
                }
            }
        }

        drop(ticker);
        self.cleanup().await;
    }

    /// 尽力注销：使用独立的取消令牌，不受触发停止的取消影响
    async fn cleanup(&self) {
        let cleanup = CancellationToken::new();
        match self.registry.deregister(&self.key, &cleanup).await {
            Ok(()) => log::info!("Heartbeat stopped, deregistered {}", self.key),
            Err(e) => {
                log::error!("Failed to deregister {} on heartbeat stop: {}", self.key, e);
                self.report(&e);
            }
        }
    }

    /// 调用上报回调；回调 panic 不能中断循环或跳过清理注销
    fn report(&self, err: &RegistryErr) {
        if let Some(hook) = &self.on_error {
            if panic::catch_unwind(AssertUnwindSafe(|| hook(err))).is_err() {
                log::error!("Error hook panicked while reporting for {}: {}", self.key, err);
            }
        }
    }
}
