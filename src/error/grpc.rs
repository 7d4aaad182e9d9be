//! gRPC 错误处理
//!
//! 提供 CallError 到 tonic::Status 的转换

use super::CallError;
use tonic::metadata::{Ascii, MetadataValue};
use tonic::{Code, Status};

/// 尝试次数写入 status metadata 的键
pub const ATTEMPTS_METADATA_KEY: &str = "x-call-attempts";

/// 服务端在 trailing metadata 中返回的请求 ID 键
pub const REQUEST_ID_METADATA_KEY: &str = "request-id";

/// 读取状态中的请求 ID
pub fn request_id_from_status(status: &Status) -> Option<String> {
    status
        .metadata()
        .get(REQUEST_ID_METADATA_KEY)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
}

impl From<CallError> for Status {
    fn from(err: CallError) -> Self {
        let attempts = err.attempts();
        let request_id = err.request_id().map(str::to_string);
        let mut status = match err {
            CallError::Configuration {
                service,
                method,
                missing_key,
            } => Status::failed_precondition(format!(
                "no retry policy for {}/{}: missing {}",
                service, method, missing_key
            )),
            CallError::Rpc { code, message, .. } => Status::new(code, message),
            CallError::DeadlineExceeded { code, message, .. } => Status::new(code, message),
            CallError::Cancelled { .. } => Status::new(Code::Cancelled, "call cancelled by caller"),
        };

        // 添加尝试次数到 metadata
        status
            .metadata_mut()
            .insert(ATTEMPTS_METADATA_KEY, MetadataValue::from(attempts));
        if let Some(value) = request_id.and_then(|id| id.parse::<MetadataValue<Ascii>>().ok()) {
            status.metadata_mut().insert(REQUEST_ID_METADATA_KEY, value);
        }

        status
    }
}
