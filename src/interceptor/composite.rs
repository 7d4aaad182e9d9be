use std::future::Future;

use super::logging::CallFault;
use super::{CallDetails, LoggingInterceptor, MetadataInterceptor};

/// 组合拦截器
///
/// 先注入 metadata，再交给日志拦截器，日志中因此能看到注入后（已遮盖）的 metadata
#[derive(Debug, Clone, Default)]
pub struct CompositeInterceptor {
    metadata: Option<MetadataInterceptor>,
    logging: Option<LoggingInterceptor>,
}

impl CompositeInterceptor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_metadata(mut self, interceptor: MetadataInterceptor) -> Self {
        self.metadata = Some(interceptor);
        self
    }

    pub fn with_logging(mut self, endpoint: impl Into<String>) -> Self {
        self.logging = Some(LoggingInterceptor::new(endpoint));
        self
    }

    pub fn metadata(&self) -> Option<&MetadataInterceptor> {
        self.metadata.as_ref()
    }

    pub async fn intercept<F, Fut, T, E>(&self, call: &CallDetails, proceed: F) -> Result<T, E>
    where
        F: FnOnce(CallDetails) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: CallFault,
    {
        // 按顺序应用拦截器
        let call = match self.metadata {
            Some(ref metadata) => metadata.decorate(call),
            None => call.clone(),
        };

        match self.logging {
            Some(ref logging) => logging.intercept(&call, proceed).await,
            None => proceed(call).await,
        }
    }
}
