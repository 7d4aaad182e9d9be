use std::fmt;
use std::future::Future;

use http::{HeaderMap, HeaderValue};
use tonic::metadata::{Ascii, MetadataMap, MetadataValue};
use tonic::{Request, Status};
use tracing::trace;

use super::{CallDetails, SENSITIVE_INFO_MASK};
use crate::config::ClientConfig;
use crate::error::ConfigError;

pub const DEVELOPER_TOKEN_KEY: &str = "developer-token";
pub const LOGIN_CUSTOMER_ID_KEY: &str = "login-customer-id";
pub const LINKED_CUSTOMER_ID_KEY: &str = "linked-customer-id";

/// 已校验的 metadata 值，同时保留 gRPC 与 HTTP 两种表示
#[derive(Clone)]
struct InjectedValue {
    text: String,
    ascii: MetadataValue<Ascii>,
    header: HeaderValue,
}

impl InjectedValue {
    fn parse(key: &str, text: String) -> Result<Self, ConfigError> {
        let invalid = || ConfigError::InvalidMetadataValue {
            key: key.to_string(),
        };
        let ascii = text.parse::<MetadataValue<Ascii>>().map_err(|_| invalid())?;
        let header = HeaderValue::from_str(&text).map_err(|_| invalid())?;
        Ok(Self {
            text,
            ascii,
            header,
        })
    }

    /// 空字符串视为未设置
    fn optional(key: &str, text: String) -> Result<Option<Self>, ConfigError> {
        if text.is_empty() {
            return Ok(None);
        }
        Self::parse(key, text).map(Some)
    }
}

/// 元数据拦截器
///
/// 为每个出站一元调用追加开发者令牌与路由相关的 metadata：
/// 1. `developer-token`（启用云组织访问时不发送）
/// 2. `login-customer-id`（可选）
/// 3. `linked-customer-id`（可选）
///
/// 追加的键总是位于调用方已有 metadata 之后，不删除也不重排已有的键值对。
/// 拦截器本身不重试、不吞错误，`proceed` 的结果原样返回
#[derive(Clone)]
pub struct MetadataInterceptor {
    developer_token: InjectedValue,
    login_customer_id: Option<InjectedValue>,
    linked_customer_id: Option<InjectedValue>,
    use_cloud_org_for_api_access: bool,
}

impl MetadataInterceptor {
    pub fn new(developer_token: impl Into<String>) -> Result<Self, ConfigError> {
        Ok(Self {
            developer_token: InjectedValue::parse(DEVELOPER_TOKEN_KEY, developer_token.into())?,
            login_customer_id: None,
            linked_customer_id: None,
            use_cloud_org_for_api_access: false,
        })
    }

    /// 从客户端配置构建
    pub fn from_config(config: &ClientConfig) -> Result<Self, ConfigError> {
        Ok(Self::new(config.developer_token.clone())?
            .with_login_customer_id(config.login_customer_id.clone().unwrap_or_default())?
            .with_linked_customer_id(config.linked_customer_id.clone().unwrap_or_default())?
            .with_cloud_org_access(config.use_cloud_org_for_api_access))
    }

    /// 设置登录客户 ID（空字符串表示不发送）
    pub fn with_login_customer_id(
        mut self,
        login_customer_id: impl Into<String>,
    ) -> Result<Self, ConfigError> {
        self.login_customer_id =
            InjectedValue::optional(LOGIN_CUSTOMER_ID_KEY, login_customer_id.into())?;
        Ok(self)
    }

    /// 设置关联客户 ID（空字符串表示不发送）
    pub fn with_linked_customer_id(
        mut self,
        linked_customer_id: impl Into<String>,
    ) -> Result<Self, ConfigError> {
        self.linked_customer_id =
            InjectedValue::optional(LINKED_CUSTOMER_ID_KEY, linked_customer_id.into())?;
        Ok(self)
    }

    /// 使用云项目所属组织决定 API 访问级别，此时不发送开发者令牌
    pub fn with_cloud_org_access(mut self, enabled: bool) -> Self {
        self.use_cloud_org_for_api_access = enabled;
        self
    }

    pub fn login_customer_id(&self) -> Option<&str> {
        self.login_customer_id.as_ref().map(|v| v.text.as_str())
    }

    pub fn linked_customer_id(&self) -> Option<&str> {
        self.linked_customer_id.as_ref().map(|v| v.text.as_str())
    }

    fn injected(&self) -> impl Iterator<Item = (&'static str, &InjectedValue)> {
        let developer_token = (!self.use_cloud_org_for_api_access)
            .then_some((DEVELOPER_TOKEN_KEY, &self.developer_token));
        let login = self
            .login_customer_id
            .as_ref()
            .map(|v| (LOGIN_CUSTOMER_ID_KEY, v));
        let linked = self
            .linked_customer_id
            .as_ref()
            .map(|v| (LINKED_CUSTOMER_ID_KEY, v));

        developer_token.into_iter().chain(login).chain(linked)
    }

    /// 按注入顺序返回要追加的键值对
    pub fn injected_pairs(&self) -> Vec<(&'static str, &str)> {
        self.injected()
            .map(|(key, value)| (key, value.text.as_str()))
            .collect()
    }

    /// 基于输入描述符派生新描述符：复制调用方 metadata 后追加注入的键值对
    ///
    /// 输入描述符保持不变
    pub fn decorate(&self, call: &CallDetails) -> CallDetails {
        let mut metadata = call.metadata().clone();
        for (key, value) in self.injected() {
            metadata.push(key, value.text.clone());
        }
        call.with_metadata(metadata)
    }

    /// 拦截一次调用：装饰 metadata 后交给 `proceed`，其结果原样返回
    pub async fn intercept<F, Fut>(&self, call: &CallDetails, proceed: F) -> Fut::Output
    where
        F: FnOnce(CallDetails) -> Fut,
        Fut: Future,
    {
        let decorated = self.decorate(call);
        trace!(method = %decorated.method(), "Injected call metadata");
        proceed(decorated).await
    }

    /// 向 tonic MetadataMap 追加（不替换）注入的键值对
    pub fn apply(&self, metadata: &mut MetadataMap) {
        for (key, value) in self.injected() {
            metadata.append(key, value.ascii.clone());
        }
    }

    /// 向 HTTP 头追加（不替换）注入的键值对
    pub fn apply_headers(&self, headers: &mut HeaderMap) {
        for (key, value) in self.injected() {
            headers.append(key, value.header.clone());
        }
    }
}

impl fmt::Debug for MetadataInterceptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MetadataInterceptor")
            .field("developer_token", &SENSITIVE_INFO_MASK)
            .field("login_customer_id", &self.login_customer_id())
            .field("linked_customer_id", &self.linked_customer_id())
            .field(
                "use_cloud_org_for_api_access",
                &self.use_cloud_org_for_api_access,
            )
            .finish()
    }
}

/// 作为 tonic 客户端拦截器使用：`FooClient::with_interceptor(channel, interceptor)`
impl tonic::service::Interceptor for MetadataInterceptor {
    fn call(&mut self, mut request: Request<()>) -> Result<Request<()>, Status> {
        self.apply(request.metadata_mut());
        Ok(request)
    }
}
