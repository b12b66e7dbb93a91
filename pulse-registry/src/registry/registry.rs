use async_trait::async_trait;
use pulse_core::{Instance, InstanceKey, Result};
use tokio_util::sync::CancellationToken;

/// 服务注册接口
///
/// 每个方法对应一次请求/响应交换，不做任何重试；
/// `cancel` 触发时进行中的调用提前结束，并以传输错误返回。
#[async_trait]
pub trait Registry: Send + Sync + Clone + 'static {
    /// 注册服务
    async fn register(&self, instance: &Instance, cancel: &CancellationToken) -> Result<()>;

    /// 注销服务
    async fn deregister(&self, key: &InstanceKey, cancel: &CancellationToken) -> Result<()>;

    /// 服务心跳
    async fn heartbeat(&self, key: &InstanceKey, cancel: &CancellationToken) -> Result<()>;
}
