//! 日志初始化
//!
//! 基于 tracing-subscriber，支持 pretty / json 两种输出，`RUST_LOG` 优先于配置中的级别

use tracing_subscriber::EnvFilter;

use crate::config::{LogFormat, LoggingConfig};
use crate::error::ConfigError;

/// 由级别指令构建过滤器，不读取环境变量
pub fn filter_from_level(level: &str) -> Result<EnvFilter, ConfigError> {
    EnvFilter::try_new(level).map_err(|e| ConfigError::Logging(e.to_string()))
}

/// 构建过滤器：`RUST_LOG` 存在且合法时使用它，否则使用配置中的级别
pub fn build_filter(config: &LoggingConfig) -> Result<EnvFilter, ConfigError> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => filter_from_level(&config.level),
    }
}

/// 安装全局 subscriber，并把 `log` 记录桥接到 tracing
///
/// 只能调用一次，重复调用返回 `ConfigError::Logging`
pub fn init_logging(config: &LoggingConfig) -> Result<(), ConfigError> {
    let filter = build_filter(config)?;

    tracing_log::LogTracer::init().map_err(|e| ConfigError::Logging(e.to_string()))?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(config.with_target);

    let result = match config.format {
        LogFormat::Json => tracing::subscriber::set_global_default(builder.json().finish()),
        LogFormat::Pretty => tracing::subscriber::set_global_default(builder.finish()),
    };

    result.map_err(|e| ConfigError::Logging(e.to_string()))
}
