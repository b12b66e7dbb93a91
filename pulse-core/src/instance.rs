use crate::error::{RegistryErr, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::net::IpAddr;

/// 服务实例信息
///
/// `(service_name, instance_id)` 在实例整个生命周期内唯一标识该实例，
/// 构造后不可修改。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instance {
    #[serde(rename = "serviceName")]
    service_name: String,
    #[serde(rename = "instanceID")]
    instance_id: String,
    host: String,
    port: u16,
    #[serde(default)]
    metadata: HashMap<String, String>,
    /// 由注册中心维护，客户端从不设置
    #[serde(rename = "lastSeen", default, skip_serializing_if = "Option::is_none")]
    last_seen: Option<DateTime<Utc>>,
}

/// 注销与心跳请求体：只包含实例标识
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InstanceKey {
    #[serde(rename = "serviceName")]
    pub service_name: String,
    #[serde(rename = "instanceID")]
    pub instance_id: String,
}

impl Instance {
    pub fn builder(service_name: impl Into<String>, instance_id: impl Into<String>) -> InstanceBuilder {
        InstanceBuilder::new(service_name, instance_id)
    }

    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    pub fn instance_id(&self) -> &str {
        &self.instance_id
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn metadata(&self) -> &HashMap<String, String> {
        &self.metadata
    }

    pub fn last_seen(&self) -> Option<DateTime<Utc>> {
        self.last_seen
    }

    pub fn key(&self) -> InstanceKey {
        InstanceKey {
            service_name: self.service_name.clone(),
            instance_id: self.instance_id.clone(),
        }
    }

    /// 校验实例字段
    pub fn validate(&self) -> Result<()> {
        if self.service_name.trim().is_empty() {
            return Err(RegistryErr::invalid_instance("serviceName is required"));
        }
        if self.instance_id.trim().is_empty() {
            return Err(RegistryErr::invalid_instance("instanceID is required"));
        }
        if !is_valid_host(&self.host) {
            return Err(RegistryErr::invalid_instance(format!(
                "host `{}` is neither an IP address nor a hostname",
                self.host
            )));
        }
        if self.port == 0 {
            return Err(RegistryErr::invalid_instance("port must be at least 1"));
        }
        Ok(())
    }
}

impl std::fmt::Display for InstanceKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.service_name, self.instance_id)
    }
}

fn is_valid_host(host: &str) -> bool {
    host.parse::<IpAddr>().is_ok() || is_valid_hostname(host)
}

// RFC 1123
fn is_valid_hostname(host: &str) -> bool {
    if host.is_empty() || host.len() > 253 {
        return false;
    }
    host.split('.').all(|label| {
        !label.is_empty()
            && label.len() <= 63
            && !label.starts_with('-')
            && !label.ends_with('-')
            && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
    })
}

/// Instance Builder
#[derive(Debug, Clone)]
pub struct InstanceBuilder {
    service_name: String,
    instance_id: String,
    host: String,
    port: u16,
    metadata: HashMap<String, String>,
}

impl InstanceBuilder {
    pub fn new(service_name: impl Into<String>, instance_id: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            instance_id: instance_id.into(),
            host: String::new(),
            port: 0,
            metadata: HashMap::new(),
        }
    }

    /// 设置主机名或 IP
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// 添加元数据
    pub fn meta(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn metadata(mut self, metadata: HashMap<String, String>) -> Self {
        self.metadata = metadata;
        self
    }

    /// 构建并校验 Instance
    pub fn build(self) -> Result<Instance> {
        let instance = Instance {
            service_name: self.service_name,
            instance_id: self.instance_id,
            host: self.host,
            port: self.port,
            metadata: self.metadata,
            last_seen: None,
        };
        instance.validate()?;
        Ok(instance)
    }
}
