//! 重试策略模块
//!
//! 由服务名与方法名解析出策略（单次超时、可重试状态码、退避时间表、总时限），
//! 并按策略执行调用

pub mod codes;
pub mod executor;
pub mod params;
pub mod policy;
pub mod table;

pub use codes::{RetryCodes, code_from_name, code_name};
pub use executor::{Attempt, execute_with_cancellation, execute_with_retry};
pub use params::{DelaySchedule, RetryParams};
pub use policy::MethodPolicy;
pub use table::{MethodConfig, PolicyTable, PolicyTableBuilder, ServiceRetryConfig};

use std::time::Duration;
use tonic::Code;

/// 重试策略 trait
pub trait RetryPolicy: Send + Sync {
    fn service(&self) -> &str;
    fn method(&self) -> &str;
    fn is_retryable(&self, code: Code) -> bool;
    /// 已耗时 `elapsed` 时，下一次尝试可用的超时
    fn attempt_timeout(&self, elapsed: Duration) -> Duration;
    fn total_timeout(&self) -> Duration;
    fn initial_delay(&self) -> Duration;
    fn next_delay(&self, current: Duration) -> Duration;
}
