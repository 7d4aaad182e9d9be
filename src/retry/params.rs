//! 退避参数

use serde::Deserialize;
use std::time::Duration;

/// 毫秒数，超出 u64 时饱和
pub(crate) fn duration_to_u64_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// 命名的退避参数组
///
/// 字段名与生成的服务配置表一致，表中其余字段（如 `initial_rpc_timeout_millis`）被忽略
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RetryParams {
    pub initial_retry_delay_millis: u64,
    pub retry_delay_multiplier: f64,
    pub max_retry_delay_millis: u64,
    pub total_timeout_millis: u64,
}

impl Default for RetryParams {
    fn default() -> Self {
        Self {
            initial_retry_delay_millis: 5_000,
            retry_delay_multiplier: 1.3,
            max_retry_delay_millis: 60_000,
            total_timeout_millis: 3_600_000,
        }
    }
}

impl RetryParams {
    /// 校验参数，返回不合法的原因
    pub fn validate(&self) -> Result<(), String> {
        if !self.retry_delay_multiplier.is_finite() || self.retry_delay_multiplier < 1.0 {
            return Err(format!(
                "retry_delay_multiplier must be a finite number >= 1.0, got {}",
                self.retry_delay_multiplier
            ));
        }
        if self.initial_retry_delay_millis > self.max_retry_delay_millis {
            return Err(format!(
                "initial_retry_delay_millis ({}) exceeds max_retry_delay_millis ({})",
                self.initial_retry_delay_millis, self.max_retry_delay_millis
            ));
        }
        Ok(())
    }

    pub fn schedule(&self) -> DelaySchedule {
        DelaySchedule::new(
            Duration::from_millis(self.initial_retry_delay_millis),
            self.retry_delay_multiplier,
            Duration::from_millis(self.max_retry_delay_millis),
        )
    }

    pub fn total_timeout(&self) -> Duration {
        Duration::from_millis(self.total_timeout_millis)
    }
}

/// 指数退避时间表，带单次上限
///
/// 第 N 次重试前的等待时间为 `min(initial * multiplier^(N-1), max)`；
/// multiplier 为 1.0 时退化为固定间隔
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DelaySchedule {
    pub initial: Duration,
    pub multiplier: f64,
    pub max: Duration,
}

impl DelaySchedule {
    pub fn new(initial: Duration, multiplier: f64, max: Duration) -> Self {
        Self {
            initial,
            multiplier,
            max,
        }
    }

    /// 固定间隔
    pub fn fixed(delay: Duration) -> Self {
        Self::new(delay, 1.0, delay)
    }

    /// 由当前等待时间计算下一次：`min(current * multiplier, max)`
    pub fn next_delay(&self, current: Duration) -> Duration {
        let scaled = current.as_nanos() as f64 * self.multiplier;
        if !scaled.is_finite() || scaled >= self.max.as_nanos() as f64 {
            return self.max;
        }
        Duration::from_nanos(scaled.round() as u64)
    }

    /// 第 `retry` 次重试（从 1 开始）前的等待时间
    pub fn delay_for_retry(&self, retry: u32) -> Duration {
        let mut delay = self.initial.min(self.max);
        for _ in 1..retry {
            if delay >= self.max {
                break;
            }
            delay = self.next_delay(delay);
        }
        delay
    }

    /// 依次产生每次重试前的等待时间（无限序列）
    pub fn delays(&self) -> impl Iterator<Item = Duration> {
        let schedule = *self;
        std::iter::successors(Some(schedule.initial.min(schedule.max)), move |current| {
            Some(schedule.next_delay(*current))
        })
    }
}
