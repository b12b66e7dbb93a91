mod registry;
#[cfg(test)]
mod tests;

pub use registry::HttpRegistry;

use pulse_core::{RegistryErr, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub(crate) const REGISTER_PATH: &str = "/api/register";
pub(crate) const DEREGISTER_PATH: &str = "/api/deregister";
pub(crate) const HEARTBEAT_PATH: &str = "/api/heartbeat";

/// 注册中心连接配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryConfig {
    pub base_url: String,
    /// 单次调用超时
    pub timeout: Duration,
    pub heartbeat_interval: Duration,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8080".to_string(),
            timeout: Duration::from_secs(5),
            heartbeat_interval: Duration::from_secs(10),
        }
    }
}

impl RegistryConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_heartbeat_interval(mut self, interval: Duration) -> Self {
        self.heartbeat_interval = interval;
        self
    }

    pub fn validate(&self) -> Result<()> {
        let url = url::Url::parse(&self.base_url)
            .map_err(|e| RegistryErr::invalid_config(format!("base url `{}`: {}", self.base_url, e)))?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(RegistryErr::invalid_config(format!(
                "base url `{}` must use http or https",
                self.base_url
            )));
        }
        if self.timeout.is_zero() {
            return Err(RegistryErr::invalid_config("timeout must be positive"));
        }
        if self.heartbeat_interval.is_zero() {
            return Err(RegistryErr::invalid_config("heartbeat interval must be positive"));
        }
        Ok(())
    }

    /// 拼接请求地址，保留 base url 中的路径前缀
    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }
}
