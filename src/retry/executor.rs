//! 按策略执行一元调用并重试
//!
//! 每次尝试严格串行：第 N+1 次尝试只会在第 N 次失败被观察到、
//! 且对应的退避等待结束之后发出

use std::future::Future;
use std::time::Duration;

use tokio::time::{Instant, sleep, timeout};
use tokio_util::sync::CancellationToken;
use tonic::Status;
use tracing::{Instrument, debug, debug_span, info, warn};

use super::RetryPolicy;
use super::params::duration_to_u64_ms;
use crate::error::{CallError, Result, request_id_from_status};

/// 一次尝试的上下文，传给调用闭包
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Attempt {
    /// 从 1 开始的尝试序号
    pub number: u32,
    /// 本次尝试的超时：`min(timeout, total_timeout - elapsed)`
    pub timeout: Duration,
    /// 自第一次尝试开始的累计耗时
    pub elapsed: Duration,
}

/// 按策略执行调用，不可取消
pub async fn execute_with_retry<P, F, Fut, T>(policy: &P, call: F) -> Result<T>
where
    P: RetryPolicy + ?Sized,
    F: FnMut(Attempt) -> Fut,
    Fut: Future<Output = std::result::Result<T, Status>>,
{
    execute_with_cancellation(policy, &CancellationToken::new(), call).await
}

/// 按策略执行调用
///
/// - 成功立即返回
/// - 状态码不在可重试集合中：返回 `CallError::Rpc`
/// - 累计耗时加上下一次退避达到总时限：返回 `CallError::DeadlineExceeded`（携带最后的状态）
/// - `cancel` 被触发：立即中止当前尝试或跳过退避，返回 `CallError::Cancelled`
///
/// 单次尝试超时到期会被视为 `DEADLINE_EXCEEDED` 状态，按同样的规则判断是否重试
pub async fn execute_with_cancellation<P, F, Fut, T>(
    policy: &P,
    cancel: &CancellationToken,
    mut call: F,
) -> Result<T>
where
    P: RetryPolicy + ?Sized,
    F: FnMut(Attempt) -> Fut,
    Fut: Future<Output = std::result::Result<T, Status>>,
{
    let start = Instant::now();
    let mut attempt: u32 = 1;
    let mut delay = policy.initial_delay();
    let mut last_status: Option<Status> = None;

    loop {
        let elapsed = start.elapsed();
        let attempt_timeout = policy.attempt_timeout(elapsed);

        // 预算已耗尽，不再发出注定超时的尝试
        if attempt_timeout.is_zero() {
            if let Some(status) = last_status.take() {
                return Err(budget_exhausted(policy, status, attempt - 1, elapsed));
            }
        }

        let context = Attempt {
            number: attempt,
            timeout: attempt_timeout,
            elapsed,
        };

        let span = debug_span!(
            "rpc_attempt",
            service = policy.service(),
            method = policy.method(),
            attempt,
        );

        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!(service = policy.service(), method = policy.method(), attempt, "Call cancelled during attempt");
                return Err(CallError::Cancelled {
                    attempts: attempt,
                    elapsed: start.elapsed(),
                });
            }
            outcome = timeout(attempt_timeout, call(context)).instrument(span) => outcome,
        };

        let status = match outcome {
            Ok(Ok(response)) => {
                if attempt > 1 {
                    info!(
                        service = policy.service(),
                        method = policy.method(),
                        attempt,
                        "RPC succeeded after retries"
                    );
                }
                return Ok(response);
            }
            Ok(Err(status)) => status,
            Err(_) => Status::deadline_exceeded(format!(
                "attempt {} timed out after {}ms",
                attempt,
                duration_to_u64_ms(attempt_timeout)
            )),
        };

        let elapsed = start.elapsed();
        let code = status.code();

        if !policy.is_retryable(code) {
            let request_id = request_id_from_status(&status);
            warn!(
                service = policy.service(),
                method = policy.method(),
                attempt,
                code = ?code,
                message = %status.message(),
                request_id = request_id.as_deref().unwrap_or(""),
                "RPC failed with non-retryable status"
            );
            return Err(CallError::Rpc {
                code,
                message: status.message().to_string(),
                request_id,
                attempts: attempt,
                elapsed,
            });
        }

        // 退避结束时必须仍有剩余预算
        if elapsed + delay >= policy.total_timeout() {
            return Err(budget_exhausted(policy, status, attempt, elapsed));
        }

        debug!(
            service = policy.service(),
            method = policy.method(),
            attempt,
            code = ?code,
            backoff_ms = duration_to_u64_ms(delay),
            "Retrying RPC after backoff"
        );

        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!(service = policy.service(), method = policy.method(), attempt, "Call cancelled during backoff");
                return Err(CallError::Cancelled {
                    attempts: attempt,
                    elapsed: start.elapsed(),
                });
            }
            _ = sleep(delay) => {}
        }

        last_status = Some(status);
        attempt += 1;
        delay = policy.next_delay(delay);
    }
}

/// 总时限耗尽：携带最后一次观察到的状态
fn budget_exhausted<P>(policy: &P, status: Status, attempts: u32, elapsed: Duration) -> CallError
where
    P: RetryPolicy + ?Sized,
{
    let request_id = request_id_from_status(&status);
    warn!(
        service = policy.service(),
        method = policy.method(),
        attempts,
        code = ?status.code(),
        request_id = request_id.as_deref().unwrap_or(""),
        elapsed_ms = duration_to_u64_ms(elapsed),
        "Retry budget exhausted, giving up"
    );
    CallError::DeadlineExceeded {
        code: status.code(),
        message: status.message().to_string(),
        request_id,
        attempts,
        elapsed,
    }
}
