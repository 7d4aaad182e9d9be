//! 调用错误类型
//!
//! 受治理调用的终态错误：配置错误、RPC 错误、总超时、取消

use std::time::Duration;
use thiserror::Error;
use tonic::Code;

/// 受治理调用的终态错误
///
/// 除 `Configuration` 外，每个变体都携带尝试次数与累计耗时，
/// 方便调用方记录日志或重新抛出
#[derive(Error, Debug, Clone)]
pub enum CallError {
    /// 策略表中缺少服务、方法或被引用的重试组（永不重试，在任何网络调用前抛出）
    #[error("no retry policy for {service}/{method}: missing {missing_key}")]
    Configuration {
        service: String,
        method: String,
        missing_key: String,
    },

    /// 传输层返回了不可重试的状态码
    #[error("rpc failed with {code:?} after {attempts} attempt(s): {message}")]
    Rpc {
        code: Code,
        message: String,
        /// 服务端在 trailing metadata 中返回的 `request-id`
        request_id: Option<String>,
        attempts: u32,
        elapsed: Duration,
    },

    /// 下一次退避会超出总超时，携带最后一次观察到的状态
    #[error(
        "retry budget exhausted after {attempts} attempt(s) in {elapsed:?}, last status {code:?}: {message}"
    )]
    DeadlineExceeded {
        code: Code,
        message: String,
        request_id: Option<String>,
        attempts: u32,
        elapsed: Duration,
    },

    /// 调用方取消
    #[error("call cancelled during attempt {attempts} after {elapsed:?}")]
    Cancelled { attempts: u32, elapsed: Duration },
}

impl CallError {
    /// 创建配置错误
    pub fn configuration(
        service: impl Into<String>,
        method: impl Into<String>,
        missing_key: impl Into<String>,
    ) -> Self {
        CallError::Configuration {
            service: service.into(),
            method: method.into(),
            missing_key: missing_key.into(),
        }
    }

    /// 已发起的网络尝试次数（配置错误为 0）
    pub fn attempts(&self) -> u32 {
        match self {
            CallError::Configuration { .. } => 0,
            CallError::Rpc { attempts, .. }
            | CallError::DeadlineExceeded { attempts, .. }
            | CallError::Cancelled { attempts, .. } => *attempts,
        }
    }

    /// 从第一次尝试开始的累计耗时
    pub fn elapsed(&self) -> Duration {
        match self {
            CallError::Configuration { .. } => Duration::ZERO,
            CallError::Rpc { elapsed, .. }
            | CallError::DeadlineExceeded { elapsed, .. }
            | CallError::Cancelled { elapsed, .. } => *elapsed,
        }
    }

    /// 最后一次观察到的传输状态码
    pub fn status_code(&self) -> Option<Code> {
        match self {
            CallError::Rpc { code, .. } | CallError::DeadlineExceeded { code, .. } => Some(*code),
            CallError::Configuration { .. } | CallError::Cancelled { .. } => None,
        }
    }

    /// 最后一次观察到的状态消息
    pub fn status_message(&self) -> Option<&str> {
        match self {
            CallError::Rpc { message, .. } | CallError::DeadlineExceeded { message, .. } => {
                Some(message)
            }
            CallError::Configuration { .. } | CallError::Cancelled { .. } => None,
        }
    }

    /// 最后一次失败尝试的服务端请求 ID
    pub fn request_id(&self) -> Option<&str> {
        match self {
            CallError::Rpc { request_id, .. } | CallError::DeadlineExceeded { request_id, .. } => {
                request_id.as_deref()
            }
            CallError::Configuration { .. } | CallError::Cancelled { .. } => None,
        }
    }

    pub fn is_configuration(&self) -> bool {
        matches!(self, CallError::Configuration { .. })
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, CallError::Cancelled { .. })
    }
}

/// 结果类型别名
pub type Result<T> = std::result::Result<T, CallError>;
