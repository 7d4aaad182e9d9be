use std::time::Duration;
use tonic::Code;

use super::{DelaySchedule, RetryCodes, RetryPolicy};

/// 已解析的单个 RPC 方法的重试策略
///
/// 在客户端初始化时由策略表解析得到，之后不可变
#[derive(Debug, Clone, PartialEq)]
pub struct MethodPolicy {
    pub service: String,
    pub method: String,
    /// 单次尝试超时
    pub timeout: Duration,
    pub retryable_codes: RetryCodes,
    pub schedule: DelaySchedule,
    /// 整个重试序列的总时限
    pub total_timeout: Duration,
}

impl MethodPolicy {
    pub fn is_retryable(&self, code: Code) -> bool {
        self.retryable_codes.contains(code)
    }

    /// 可重试集合为空：最多一次网络尝试
    pub fn never_retries(&self) -> bool {
        self.retryable_codes.is_empty()
    }

    /// 方法路径，例如 `/ads.v1.CampaignService/GetCampaign`
    pub fn path(&self) -> String {
        format!("/{}/{}", self.service, self.method)
    }
}

impl RetryPolicy for MethodPolicy {
    fn service(&self) -> &str {
        &self.service
    }

    fn method(&self) -> &str {
        &self.method
    }

    fn is_retryable(&self, code: Code) -> bool {
        MethodPolicy::is_retryable(self, code)
    }

    fn attempt_timeout(&self, elapsed: Duration) -> Duration {
        self.timeout.min(self.total_timeout.saturating_sub(elapsed))
    }

    fn total_timeout(&self) -> Duration {
        self.total_timeout
    }

    fn initial_delay(&self) -> Duration {
        self.schedule.initial
    }

    fn next_delay(&self, current: Duration) -> Duration {
        self.schedule.next_delay(current)
    }
}
