use super::{RegistryConfig, DEREGISTER_PATH, HEARTBEAT_PATH, REGISTER_PATH};
use crate::registry::Registry;
use async_trait::async_trait;
use pulse_core::{Failure, Instance, InstanceKey, Operation, RegistryErr, Result};
use reqwest::{Method, StatusCode};
use serde::Serialize;
use tokio_util::sync::CancellationToken;

/// 基于 HTTP 的注册中心实现
#[derive(Debug, Clone)]
pub struct HttpRegistry {
    client: reqwest::Client,
    config: RegistryConfig,
}

impl HttpRegistry {
    pub fn new(config: RegistryConfig) -> Result<Self> {
        config.validate()?;

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| RegistryErr::invalid_config(format!("http client: {}", e)))?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    async fn request<T>(
        &self,
        op: Operation,
        method: Method,
        path: &str,
        body: &T,
        expected: StatusCode,
        cancel: &CancellationToken,
    ) -> Result<()>
    where
        T: Serialize + Sync,
    {
        let url = self.config.url(path);
        // json() 同时设置 Content-Type: application/json
        let request = self.client.request(method, url.as_str()).json(body);

        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                return Err(RegistryErr::for_operation(op, Failure::cancelled()));
            }
            res = request.send() => res.map_err(|e| {
                RegistryErr::for_operation(op, Failure::transport(e.to_string()))
            })?,
        };

        let status = response.status();
        if status != expected {
            log::debug!("{} to {} returned {}", op, url, status);
            return Err(RegistryErr::for_operation(op, Failure::Status(status.as_u16())));
        }

        Ok(())
    }
}

#[async_trait]
impl Registry for HttpRegistry {
    async fn register(&self, instance: &Instance, cancel: &CancellationToken) -> Result<()> {
        self.request(
            Operation::Register,
            Method::POST,
            REGISTER_PATH,
            instance,
            StatusCode::CREATED,
            cancel,
        )
        .await
    }

    async fn deregister(&self, key: &InstanceKey, cancel: &CancellationToken) -> Result<()> {
        self.request(
            Operation::Deregister,
            Method::DELETE,
            DEREGISTER_PATH,
            key,
            StatusCode::NO_CONTENT,
            cancel,
        )
        .await
    }

    async fn heartbeat(&self, key: &InstanceKey, cancel: &CancellationToken) -> Result<()> {
        self.request(
            Operation::Heartbeat,
            Method::PUT,
            HEARTBEAT_PATH,
            key,
            StatusCode::NO_CONTENT,
            cancel,
        )
        .await
    }
}
