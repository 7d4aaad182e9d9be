//! gRPC 通道构建

use std::time::Duration;

use tonic::Status;
use tonic::transport::{Channel, Endpoint};
use tracing::debug;

use crate::error::ConfigError;

/// 通道配置
#[derive(Debug, Clone)]
pub struct ChannelConfig {
    pub endpoint: String,
    pub connect_timeout: Duration,
    pub tcp_keepalive: Option<Duration>,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://googleads.googleapis.com".to_string(),
            connect_timeout: Duration::from_secs(10),
            tcp_keepalive: Some(Duration::from_secs(60)),
        }
    }
}

/// 通道构建器
pub struct ChannelBuilder {
    config: ChannelConfig,
}

impl ChannelBuilder {
    pub fn new() -> Self {
        Self {
            config: ChannelConfig::default(),
        }
    }

    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.config.endpoint = endpoint.into();
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout = timeout;
        self
    }

    pub fn tcp_keepalive(mut self, keepalive: Option<Duration>) -> Self {
        self.config.tcp_keepalive = keepalive;
        self
    }

    pub fn config(&self) -> &ChannelConfig {
        &self.config
    }

    /// 规范化地址：缺少 scheme 时补 `https://`
    pub fn normalized_endpoint(&self) -> String {
        let endpoint = self.config.endpoint.trim();
        if endpoint.contains("://") {
            endpoint.to_string()
        } else {
            format!("https://{}", endpoint)
        }
    }

    /// 构建并校验 tonic Endpoint（不建立连接）
    pub fn build_endpoint(&self) -> Result<Endpoint, ConfigError> {
        let endpoint = self.normalized_endpoint();
        let built = Endpoint::from_shared(endpoint.clone()).map_err(|e| {
            ConfigError::InvalidEndpoint {
                endpoint,
                reason: e.to_string(),
            }
        })?;

        Ok(built
            .connect_timeout(self.config.connect_timeout)
            .tcp_keepalive(self.config.tcp_keepalive))
    }

    /// 建立连接
    pub async fn connect(self) -> Result<Channel, Status> {
        let endpoint = self
            .build_endpoint()
            .map_err(|e| Status::invalid_argument(e.to_string()))?;

        debug!(endpoint = %self.normalized_endpoint(), "Connecting channel");

        endpoint
            .connect()
            .await
            .map_err(|e| Status::unavailable(format!("Failed to connect: {}", e)))
    }

    /// 惰性连接：首次请求时才建立连接，需要在 tokio 运行时中调用
    pub fn connect_lazy(self) -> Result<Channel, ConfigError> {
        Ok(self.build_endpoint()?.connect_lazy())
    }
}

impl Default for ChannelBuilder {
    fn default() -> Self {
        Self::new()
    }
}
