use std::fmt::Display;
use std::future::Future;
use std::time::Instant;

use tonic::Status;
use tracing::{debug, info, warn};

use super::CallDetails;
use super::metadata::LOGIN_CUSTOMER_ID_KEY;
use crate::error::{CallError, request_id_from_status};
use crate::retry::params::duration_to_u64_ms;

/// 可写入调用摘要日志的失败
pub trait CallFault: Display {
    /// 服务端分配的请求 ID
    fn request_id(&self) -> Option<String> {
        None
    }
}

impl CallFault for Status {
    fn request_id(&self) -> Option<String> {
        request_id_from_status(self)
    }
}

impl CallFault for CallError {
    fn request_id(&self) -> Option<String> {
        CallError::request_id(self).map(str::to_string)
    }
}

/// 日志拦截器
///
/// 调用前以 debug 级别记录方法与（已遮盖的）metadata，
/// 调用后记录一行摘要：成功为 info，失败为 warn
#[derive(Debug, Clone)]
pub struct LoggingInterceptor {
    endpoint: String,
}

impl LoggingInterceptor {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub async fn intercept<F, Fut, T, E>(&self, call: &CallDetails, proceed: F) -> Result<T, E>
    where
        F: FnOnce(CallDetails) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: CallFault,
    {
        let method = call.method().to_string();
        let customer_id = call
            .metadata()
            .get(LOGIN_CUSTOMER_ID_KEY)
            .unwrap_or("")
            .to_string();

        debug!(
            method = %method,
            endpoint = %self.endpoint,
            metadata = %call.metadata().to_redacted_json(),
            "Sending request"
        );

        let start = Instant::now();
        let result = proceed(call.clone()).await;
        let elapsed_ms = duration_to_u64_ms(start.elapsed());

        match &result {
            Ok(_) => {
                info!(
                    customer_id = %customer_id,
                    host = %self.endpoint,
                    method = %method,
                    elapsed_ms,
                    is_fault = false,
                    "Request made"
                );
            }
            Err(err) => {
                let request_id = err.request_id().unwrap_or_default();
                warn!(
                    request_id = %request_id,
                    customer_id = %customer_id,
                    host = %self.endpoint,
                    method = %method,
                    elapsed_ms,
                    is_fault = true,
                    fault_message = %err,
                    "Request made"
                );
            }
        }

        result
    }
}
