//! 受治理的 gRPC 客户端
//!
//! 每次调用：解析策略（失败则在任何网络调用前返回配置错误）→ 按策略执行，
//! 每次尝试都经过拦截器注入 metadata 后交给传输层

pub mod channel;

pub use channel::{ChannelBuilder, ChannelConfig};

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tonic::Status;

use crate::config::ClientConfig;
use crate::error::{ConfigError, Result};
use crate::interceptor::{
    CallCredentials, CallDetails, CallMetadata, CompositeInterceptor, MetadataInterceptor,
};
use crate::retry::{MethodPolicy, PolicyTable, execute_with_cancellation};

/// 一元调用传输层（由生成的 stub 层提供）
///
/// `call.timeout()` 为本次尝试的超时，实现应将其作为 RPC deadline
#[async_trait]
pub trait UnaryTransport<Req, Resp>: Send + Sync
where
    Req: Send + 'static,
{
    async fn invoke(&self, call: CallDetails, request: Req) -> std::result::Result<Resp, Status>;
}

/// 单次调用的选项
#[derive(Debug, Clone)]
pub struct CallOptions {
    metadata: CallMetadata,
    credentials: Option<CallCredentials>,
    cancel: CancellationToken,
}

impl Default for CallOptions {
    fn default() -> Self {
        Self {
            metadata: CallMetadata::new(),
            credentials: None,
            cancel: CancellationToken::new(),
        }
    }
}

impl CallOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// 追加一个调用方 metadata
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.push(key, value);
        self
    }

    pub fn metadata(mut self, metadata: CallMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn credentials(mut self, credentials: CallCredentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// 取消信号：触发后立即中止当前尝试并跳过退避
    pub fn cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }
}

/// 受治理的客户端
pub struct GovernedClient<T> {
    table: Arc<PolicyTable>,
    interceptor: CompositeInterceptor,
    transport: T,
}

impl<T> GovernedClient<T> {
    pub fn new(table: Arc<PolicyTable>, interceptor: CompositeInterceptor, transport: T) -> Self {
        Self {
            table,
            interceptor,
            transport,
        }
    }

    /// 由客户端配置构建：metadata 注入 + 调用日志
    pub fn from_config(
        config: &ClientConfig,
        table: Arc<PolicyTable>,
        transport: T,
    ) -> std::result::Result<Self, ConfigError> {
        let interceptor = CompositeInterceptor::new()
            .with_metadata(MetadataInterceptor::from_config(config)?)
            .with_logging(config.endpoint.clone());
        Ok(Self::new(table, interceptor, transport))
    }

    pub fn policy_table(&self) -> &Arc<PolicyTable> {
        &self.table
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn resolve(&self, service: &str, method: &str) -> Result<MethodPolicy> {
        self.table.resolve(service, method)
    }

    /// 发起一次受治理的一元调用
    pub async fn call<Req, Resp>(
        &self,
        service: &str,
        method: &str,
        request: Req,
        options: CallOptions,
    ) -> Result<Resp>
    where
        T: UnaryTransport<Req, Resp>,
        Req: Clone + Send + 'static,
    {
        let policy = self.table.resolve(service, method)?;

        let base = CallDetails::for_method(service, method)
            .with_metadata(options.metadata)
            .with_credentials(options.credentials);

        execute_with_cancellation(&policy, &options.cancel, |attempt| {
            let call = base.with_timeout(Some(attempt.timeout));
            let request = request.clone();
            async move {
                self.interceptor
                    .intercept(&call, |decorated| self.transport.invoke(decorated, request))
                    .await
            }
        })
        .await
    }
}
