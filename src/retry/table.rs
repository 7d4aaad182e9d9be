//! 每个服务的重试/超时策略表
//!
//! 策略表在客户端构建时加载一次，之后只读，通过 `Arc` 在并发调用间共享。
//! 文档格式与生成的服务配置一致：
//!
//! ```json
//! {
//!   "interfaces": {
//!     "ads.v1.CampaignService": {
//!       "retry_codes": { "idempotent": ["DEADLINE_EXCEEDED", "UNAVAILABLE"], "non_idempotent": [] },
//!       "retry_params": {
//!         "default": {
//!           "initial_retry_delay_millis": 5000,
//!           "retry_delay_multiplier": 1.3,
//!           "max_retry_delay_millis": 60000,
//!           "total_timeout_millis": 3600000
//!         }
//!       },
//!       "methods": {
//!         "GetCampaign": { "timeout_millis": 60000, "retry_codes_name": "idempotent", "retry_params_name": "default" }
//!       }
//!     }
//!   }
//! }
//! ```

use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;
use tonic::Code;
use tracing::debug;

use super::params::duration_to_u64_ms;
use super::{MethodPolicy, RetryCodes, RetryParams};
use crate::error::{CallError, ConfigError};

/// 单个方法在表中的配置（引用命名组）
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MethodConfig {
    pub timeout_millis: u64,
    pub retry_codes_name: String,
    pub retry_params_name: String,
}

/// 单个服务的配置
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ServiceRetryConfig {
    #[serde(default)]
    pub retry_codes: HashMap<String, RetryCodes>,
    #[serde(default)]
    pub retry_params: HashMap<String, RetryParams>,
    #[serde(default)]
    pub methods: HashMap<String, MethodConfig>,
}

#[derive(Debug, Deserialize)]
struct PolicyDocument {
    #[serde(default)]
    interfaces: HashMap<String, ServiceRetryConfig>,
}

/// 只读策略表：服务名 → 服务配置
#[derive(Debug, Clone, Default)]
pub struct PolicyTable {
    services: HashMap<String, ServiceRetryConfig>,
}

impl PolicyTable {
    pub fn builder() -> PolicyTableBuilder {
        PolicyTableBuilder::default()
    }

    /// 由服务配置构建，加载时校验全部引用
    pub fn from_services(services: HashMap<String, ServiceRetryConfig>) -> Result<Self, ConfigError> {
        let table = Self { services };
        table.validate()?;
        debug!(services = table.services.len(), "Loaded retry policy table");
        Ok(table)
    }

    pub fn from_json_str(content: &str) -> Result<Self, ConfigError> {
        let document: PolicyDocument = serde_json::from_str(content)?;
        Self::from_services(document.interfaces)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let document: PolicyDocument = toml::from_str(content)?;
        Self::from_services(document.interfaces)
    }

    /// 按扩展名（`.json` / `.toml`）加载
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;

        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Self::from_json_str(&content),
            Some("toml") => Self::from_toml_str(&content),
            other => Err(ConfigError::UnsupportedFormat(
                other.unwrap_or_default().to_string(),
            )),
        }
    }

    /// 校验每个方法引用的重试组都已定义、每组退避参数合法
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (service_name, service) in &self.services {
            for (group, params) in &service.retry_params {
                params
                    .validate()
                    .map_err(|reason| ConfigError::InvalidRetryParams {
                        service: service_name.clone(),
                        group: group.clone(),
                        reason,
                    })?;
            }

            for (method_name, method) in &service.methods {
                if !service.retry_codes.contains_key(&method.retry_codes_name) {
                    return Err(ConfigError::UndefinedGroup {
                        service: service_name.clone(),
                        method: method_name.clone(),
                        kind: "retry_codes",
                        group: method.retry_codes_name.clone(),
                    });
                }
                if !service.retry_params.contains_key(&method.retry_params_name) {
                    return Err(ConfigError::UndefinedGroup {
                        service: service_name.clone(),
                        method: method_name.clone(),
                        kind: "retry_params",
                        group: method.retry_params_name.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    /// 解析某个方法的完整策略
    ///
    /// 服务、方法或被引用的组缺失时返回 `CallError::Configuration`，
    /// 这是配置错误而非可重试的运行时错误
    pub fn resolve(&self, service: &str, method: &str) -> Result<MethodPolicy, CallError> {
        let missing = |key: String| CallError::configuration(service, method, key);

        let service_config = self
            .services
            .get(service)
            .ok_or_else(|| missing("service".to_string()))?;
        let method_config = service_config
            .methods
            .get(method)
            .ok_or_else(|| missing("method".to_string()))?;
        let retry_codes = service_config
            .retry_codes
            .get(&method_config.retry_codes_name)
            .ok_or_else(|| missing(format!("retry_codes:{}", method_config.retry_codes_name)))?;
        let retry_params = service_config
            .retry_params
            .get(&method_config.retry_params_name)
            .ok_or_else(|| missing(format!("retry_params:{}", method_config.retry_params_name)))?;

        Ok(MethodPolicy {
            service: service.to_string(),
            method: method.to_string(),
            timeout: Duration::from_millis(method_config.timeout_millis),
            retryable_codes: retry_codes.clone(),
            schedule: retry_params.schedule(),
            total_timeout: retry_params.total_timeout(),
        })
    }

    pub fn service(&self, name: &str) -> Option<&ServiceRetryConfig> {
        self.services.get(name)
    }

    /// 已配置的服务名（排序）
    pub fn services(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.services.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// 某个服务已配置的方法名（排序）
    pub fn methods(&self, service: &str) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .services
            .get(service)
            .map(|s| s.methods.keys().map(String::as_str).collect())
            .unwrap_or_default();
        names.sort_unstable();
        names
    }
}

/// 以代码方式构建策略表
#[derive(Debug, Default)]
pub struct PolicyTableBuilder {
    services: HashMap<String, ServiceRetryConfig>,
}

impl PolicyTableBuilder {
    fn service_mut(&mut self, service: &str) -> &mut ServiceRetryConfig {
        self.services.entry(service.to_string()).or_default()
    }

    pub fn retry_codes(
        mut self,
        service: &str,
        name: &str,
        codes: impl IntoIterator<Item = Code>,
    ) -> Self {
        self.service_mut(service)
            .retry_codes
            .insert(name.to_string(), RetryCodes::from_codes(codes));
        self
    }

    pub fn retry_params(mut self, service: &str, name: &str, params: RetryParams) -> Self {
        self.service_mut(service)
            .retry_params
            .insert(name.to_string(), params);
        self
    }

    pub fn method(
        mut self,
        service: &str,
        method: &str,
        timeout: Duration,
        retry_codes_name: &str,
        retry_params_name: &str,
    ) -> Self {
        self.service_mut(service).methods.insert(
            method.to_string(),
            MethodConfig {
                timeout_millis: duration_to_u64_ms(timeout),
                retry_codes_name: retry_codes_name.to_string(),
                retry_params_name: retry_params_name.to_string(),
            },
        );
        self
    }

    pub fn build(self) -> Result<PolicyTable, ConfigError> {
        PolicyTable::from_services(self.services)
    }
}
