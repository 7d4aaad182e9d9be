//! 客户端配置
//!
//! 支持从 TOML 文件或 `ADS_`（兼容 `GOOGLE_ADS_`）前缀的环境变量加载

use serde::{Deserialize, Deserializer};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use tracing::debug;

use crate::error::ConfigError;
use crate::interceptor::SENSITIVE_INFO_MASK;
use crate::retry::PolicyTable;

const ENV_PREFIX: &str = "ADS_";
/// 兼容已有部署使用的变量名，`ADS_` 同名变量优先
const GOOGLE_ADS_ENV_PREFIX: &str = "GOOGLE_ADS_";

fn default_endpoint() -> String {
    "https://googleads.googleapis.com".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// 日志输出格式
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pretty" | "text" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            _ => Err(format!("Unknown log format: {}", s)),
        }
    }
}

/// 日志配置
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LoggingConfig {
    /// `EnvFilter` 指令，例如 `info` 或 `ads_call_core=debug`
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub format: LogFormat,
    #[serde(default)]
    pub with_target: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
            with_target: false,
        }
    }
}

/// 客户 ID 在 TOML 中既可能写成字符串也可能写成整数
fn customer_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum CustomerId {
        Text(String),
        Number(u64),
    }

    Ok(Option::<CustomerId>::deserialize(deserializer)?.map(|id| match id {
        CustomerId::Text(text) => text,
        CustomerId::Number(number) => number.to_string(),
    }))
}

/// 客户端配置
#[derive(Clone, Deserialize)]
pub struct ClientConfig {
    pub developer_token: String,
    #[serde(default, deserialize_with = "customer_id")]
    pub login_customer_id: Option<String>,
    #[serde(default, deserialize_with = "customer_id")]
    pub linked_customer_id: Option<String>,
    #[serde(default)]
    pub use_cloud_org_for_api_access: bool,
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default)]
    pub policy_table_path: Option<String>,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("developer_token", &SENSITIVE_INFO_MASK)
            .field("login_customer_id", &self.login_customer_id)
            .field("linked_customer_id", &self.linked_customer_id)
            .field(
                "use_cloud_org_for_api_access",
                &self.use_cloud_org_for_api_access,
            )
            .field("endpoint", &self.endpoint)
            .field("policy_table_path", &self.policy_table_path)
            .field("logging", &self.logging)
            .finish()
    }
}

impl ClientConfig {
    pub fn new(developer_token: impl Into<String>) -> Self {
        Self {
            developer_token: developer_token.into(),
            login_customer_id: None,
            linked_customer_id: None,
            use_cloud_org_for_api_access: false,
            endpoint: default_endpoint(),
            policy_table_path: None,
            logging: LoggingConfig::default(),
        }
    }

    /// 从 TOML 文件加载并校验
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        debug!(path = %path.display(), "Loading client configuration file");
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: ClientConfig = toml::from_str(content)?;
        config.validate()
    }

    /// 从进程环境变量加载
    pub fn load_from_env() -> Result<Self, ConfigError> {
        Self::load_from_lookup(|key| std::env::var(key).ok())
    }

    /// 从任意键值来源加载，键为完整的环境变量名（如 `ADS_DEVELOPER_TOKEN`）
    ///
    /// 每个变量也接受 `GOOGLE_ADS_` 前缀（如 `GOOGLE_ADS_LOGIN_CUSTOMER_ID`）
    ///
    /// 设置了 `ADS_CONFIGURATION_FILE_PATH` 时改为加载该文件，忽略其余变量
    pub fn load_from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| {
            lookup(&format!("{}{}", ENV_PREFIX, name))
                .or_else(|| lookup(&format!("{}{}", GOOGLE_ADS_ENV_PREFIX, name)))
        };

        if let Some(path) = var("CONFIGURATION_FILE_PATH") {
            return Self::load_from_file(path);
        }

        let developer_token =
            var("DEVELOPER_TOKEN").ok_or(ConfigError::MissingField("developer_token"))?;

        let mut config = Self::new(developer_token);
        config.login_customer_id = var("LOGIN_CUSTOMER_ID");
        config.linked_customer_id = var("LINKED_CUSTOMER_ID");
        config.policy_table_path = var("POLICY_TABLE_PATH");

        if let Some(value) = var("USE_CLOUD_ORG_FOR_API_ACCESS") {
            config.use_cloud_org_for_api_access = parse_bool(&value).ok_or(
                ConfigError::InvalidValue {
                    key: "use_cloud_org_for_api_access",
                    value,
                },
            )?;
        }
        if let Some(endpoint) = var("ENDPOINT") {
            config.endpoint = endpoint;
        }
        if let Some(level) = var("LOG_LEVEL") {
            config.logging.level = level;
        }
        if let Some(format) = var("LOG_FORMAT") {
            config.logging.format = format.parse().map_err(|_| ConfigError::InvalidValue {
                key: "log_format",
                value: format,
            })?;
        }

        config.validate()
    }

    /// 校验并规范化：开发者令牌非空，客户 ID 去掉 `-` 后必须是十位数字
    pub fn validate(mut self) -> Result<Self, ConfigError> {
        if self.developer_token.trim().is_empty() {
            return Err(ConfigError::MissingField("developer_token"));
        }
        self.login_customer_id = normalize_customer_id(self.login_customer_id.take())?;
        self.linked_customer_id = normalize_customer_id(self.linked_customer_id.take())?;
        Ok(self)
    }

    /// 加载 `policy_table_path` 指向的策略表（未配置时返回 None）
    pub fn load_policy_table(&self) -> Result<Option<PolicyTable>, ConfigError> {
        self.policy_table_path
            .as_deref()
            .map(PolicyTable::load_from_file)
            .transpose()
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" => Some(true),
        "false" | "0" | "no" => Some(false),
        _ => None,
    }
}

/// `123-456-7890` → `1234567890`；空字符串视为未设置
pub fn normalize_customer_id(id: Option<String>) -> Result<Option<String>, ConfigError> {
    let Some(raw) = id else {
        return Ok(None);
    };
    let normalized: String = raw.trim().chars().filter(|c| *c != '-').collect();
    if normalized.is_empty() {
        return Ok(None);
    }
    if normalized.len() != 10 || !normalized.chars().all(|c| c.is_ascii_digit()) {
        return Err(ConfigError::InvalidLoginCustomerId(raw));
    }
    Ok(Some(normalized))
}
