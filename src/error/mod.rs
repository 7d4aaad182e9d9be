//! 错误处理模块
//!
//! 区分两类错误：受治理调用的终态错误（`CallError`）与配置加载错误（`ConfigError`）。
//! 配置错误永远是致命的，不会进入重试流程

pub mod call;
pub mod config;
pub mod grpc;

// 重新导出公共类型
pub use call::{CallError, Result};
pub use config::ConfigError;
pub use grpc::{ATTEMPTS_METADATA_KEY, REQUEST_ID_METADATA_KEY, request_id_from_status};
