//! 元数据中间件
//!
//! 在 tower 服务栈中为每个出站 HTTP/2 请求追加注入的头，
//! 用于直接包装 `tonic::transport::Channel`

use std::task::{Context, Poll};

use tower::{Layer, Service};

use crate::interceptor::MetadataInterceptor;

/// 元数据中间件层
#[derive(Debug, Clone)]
pub struct MetadataLayer {
    interceptor: MetadataInterceptor,
}

impl MetadataLayer {
    pub fn new(interceptor: MetadataInterceptor) -> Self {
        Self { interceptor }
    }
}

impl<S> Layer<S> for MetadataLayer {
    type Service = MetadataService<S>;

    fn layer(&self, service: S) -> Self::Service {
        MetadataService {
            inner: service,
            interceptor: self.interceptor.clone(),
        }
    }
}

/// 追加注入头后转发请求，响应与错误原样返回
#[derive(Debug, Clone)]
pub struct MetadataService<S> {
    inner: S,
    interceptor: MetadataInterceptor,
}

impl<S, B> Service<http::Request<B>> for MetadataService<S>
where
    S: Service<http::Request<B>>,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = S::Future;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut request: http::Request<B>) -> Self::Future {
        self.interceptor.apply_headers(request.headers_mut());
        self.inner.call(request)
    }
}
