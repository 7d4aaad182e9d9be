//! 调用描述符
//!
//! `CallDetails` 是不可变值：拦截器从旧实例派生新实例，只替换一个字段

use serde_json::{Map, Value};
use std::fmt;
use std::time::Duration;
use tonic::Status;
use tonic::metadata::{Ascii, MetadataKey, MetadataMap, MetadataValue};

/// 日志中用于遮盖敏感值的占位符
pub const SENSITIVE_INFO_MASK: &str = "REDACTED";

const AUTHORIZATION_KEY: &str = "authorization";

/// 日志中需要遮盖的 metadata 键
const SENSITIVE_KEYS: &[&str] = &["developer-token", AUTHORIZATION_KEY];

/// 有序的调用 metadata
///
/// 插入顺序有意义：拦截器只追加，不覆盖也不重排调用方提供的键值对
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallMetadata {
    entries: Vec<(String, String)>,
}

impl CallMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        pairs.into_iter().collect()
    }

    /// 追加一个键值对（允许重复键）
    pub fn push(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.push((key.into(), value.into()));
    }

    /// 获取某个键的第一个值
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// 按插入顺序获取某个键的全部值
    pub fn get_all<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.entries
            .iter()
            .filter(move |(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn as_slice(&self) -> &[(String, String)] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 转换为 tonic 的 MetadataMap，保留重复键与顺序
    pub fn to_metadata_map(&self) -> Result<MetadataMap, Status> {
        let mut map = MetadataMap::new();
        for (key, value) in &self.entries {
            let metadata_key = MetadataKey::<Ascii>::from_bytes(key.as_bytes())
                .map_err(|_| Status::internal(format!("Invalid metadata key: {}", key)))?;
            let metadata_value: MetadataValue<Ascii> = value
                .parse()
                .map_err(|_| Status::internal(format!("Invalid metadata value for {}", key)))?;
            map.append(metadata_key, metadata_value);
        }
        Ok(map)
    }

    /// 序列化为 JSON 字符串（键排序），敏感值被遮盖
    ///
    /// 重复键以最后一个值为准，仅用于日志
    pub fn to_redacted_json(&self) -> String {
        let mut object = Map::new();
        for (key, value) in &self.entries {
            let value = if SENSITIVE_KEYS.contains(&key.as_str()) {
                SENSITIVE_INFO_MASK
            } else {
                value.as_str()
            };
            object.insert(key.clone(), Value::String(value.to_string()));
        }
        serde_json::to_string_pretty(&Value::Object(object)).unwrap_or_else(|_| "{}".to_string())
    }
}

impl<K, V> FromIterator<(K, V)> for CallMetadata
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// 调用凭证（Bearer token）
#[derive(Clone, PartialEq, Eq)]
pub struct CallCredentials {
    token: String,
}

impl CallCredentials {
    pub fn bearer(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    /// `authorization` 头的值
    pub fn authorization_value(&self) -> String {
        format!("Bearer {}", self.token)
    }
}

impl fmt::Debug for CallCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CallCredentials({})", SENSITIVE_INFO_MASK)
    }
}

/// 一次出站一元调用的描述符
#[derive(Debug, Clone, PartialEq)]
pub struct CallDetails {
    method: String,
    timeout: Option<Duration>,
    metadata: CallMetadata,
    credentials: Option<CallCredentials>,
}

impl CallDetails {
    /// 使用完整方法路径创建描述符，例如 `/ads.v1.CampaignService/GetCampaign`
    pub fn new(method: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            timeout: None,
            metadata: CallMetadata::new(),
            credentials: None,
        }
    }

    /// 由服务名与方法名拼出方法路径
    pub fn for_method(service: &str, method: &str) -> Self {
        Self::new(format!("/{}/{}", service, method))
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    pub fn metadata(&self) -> &CallMetadata {
        &self.metadata
    }

    pub fn credentials(&self) -> Option<&CallCredentials> {
        self.credentials.as_ref()
    }

    /// 路径中的服务名部分
    pub fn service_name(&self) -> Option<&str> {
        self.split_path().map(|(service, _)| service)
    }

    /// 路径中的方法名部分
    pub fn method_name(&self) -> Option<&str> {
        self.split_path().map(|(_, method)| method)
    }

    /// 传输层发送用的 metadata：全部键值对按序追加，
    /// 设置了凭证时再写入 `authorization`（替换调用方提供的同名键）
    pub fn outbound_metadata(&self) -> Result<MetadataMap, Status> {
        let mut map = self.metadata.to_metadata_map()?;
        if let Some(credentials) = &self.credentials {
            let value: MetadataValue<Ascii> = credentials
                .authorization_value()
                .parse()
                .map_err(|_| Status::unauthenticated("Invalid call credentials"))?;
            map.insert(AUTHORIZATION_KEY, value);
        }
        Ok(map)
    }

    fn split_path(&self) -> Option<(&str, &str)> {
        let path = self.method.strip_prefix('/').unwrap_or(&self.method);
        let (service, method) = path.rsplit_once('/')?;
        if service.is_empty() || method.is_empty() {
            return None;
        }
        Some((service, method))
    }

    /// 派生一个只替换 metadata 的新描述符
    pub fn with_metadata(&self, metadata: CallMetadata) -> Self {
        Self {
            method: self.method.clone(),
            timeout: self.timeout,
            metadata,
            credentials: self.credentials.clone(),
        }
    }

    /// 派生一个只替换超时的新描述符
    pub fn with_timeout(&self, timeout: Option<Duration>) -> Self {
        Self {
            method: self.method.clone(),
            timeout,
            metadata: self.metadata.clone(),
            credentials: self.credentials.clone(),
        }
    }

    /// 派生一个只替换凭证的新描述符
    pub fn with_credentials(&self, credentials: Option<CallCredentials>) -> Self {
        Self {
            method: self.method.clone(),
            timeout: self.timeout,
            metadata: self.metadata.clone(),
            credentials,
        }
    }
}
