//! 配置加载错误

use thiserror::Error;

/// 配置加载与校验错误
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid TOML: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("required field `{0}` is missing")]
    MissingField(&'static str),

    #[error("invalid login customer id `{0}`: expected ten digits such as \"1234567890\"")]
    InvalidLoginCustomerId(String),

    #[error("value for metadata key `{key}` is not valid ASCII metadata")]
    InvalidMetadataValue { key: String },

    #[error("invalid retry params `{group}` in service `{service}`: {reason}")]
    InvalidRetryParams {
        service: String,
        group: String,
        reason: String,
    },

    #[error("service `{service}` method `{method}` references undefined {kind} group `{group}`")]
    UndefinedGroup {
        service: String,
        method: String,
        kind: &'static str,
        group: String,
    },

    #[error("unknown status code `{0}`")]
    UnknownStatusCode(String),

    #[error("unsupported policy table format `{0}`")]
    UnsupportedFormat(String),

    #[error("invalid endpoint `{endpoint}`: {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },

    #[error("invalid value for `{key}`: {value}")]
    InvalidValue { key: &'static str, value: String },

    #[error("failed to initialise logging: {0}")]
    Logging(String),
}
