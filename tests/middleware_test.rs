//! tower 中间件与通道构建测试

use ads_call_core::{ChannelBuilder, ConfigError, MetadataInterceptor, MetadataLayer};
use std::convert::Infallible;
use std::time::Duration;
use tower::{ServiceBuilder, ServiceExt};

fn header_values(headers: &http::HeaderMap, key: &str) -> Vec<String> {
    headers
        .get_all(key)
        .iter()
        .map(|v| v.to_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn layer_appends_headers_to_outbound_request() {
    let interceptor = MetadataInterceptor::new("DEV123")
        .unwrap()
        .with_login_customer_id("9998887777")
        .unwrap();
    let service = ServiceBuilder::new()
        .layer(MetadataLayer::new(interceptor))
        .service_fn(|request: http::Request<()>| async move {
            Ok::<_, Infallible>(request.headers().clone())
        });

    let request = http::Request::builder()
        .header("x-goog-api-client", "v1")
        .header("developer-token", "caller-token")
        .body(())
        .unwrap();

    let headers = service.oneshot(request).await.unwrap();

    assert_eq!(header_values(&headers, "x-goog-api-client"), vec!["v1"]);
    assert_eq!(
        header_values(&headers, "developer-token"),
        vec!["caller-token", "DEV123"]
    );
    assert_eq!(header_values(&headers, "login-customer-id"), vec!["9998887777"]);
}

#[tokio::test]
async fn layer_passes_inner_errors_through() {
    let interceptor = MetadataInterceptor::new("DEV123").unwrap();
    let service = ServiceBuilder::new()
        .layer(MetadataLayer::new(interceptor))
        .service_fn(|_: http::Request<()>| async { Err::<(), _>("connection reset") });

    let err = service
        .oneshot(http::Request::new(()))
        .await
        .unwrap_err();

    assert_eq!(err, "connection reset");
}

#[test]
fn endpoint_without_scheme_defaults_to_https() {
    let builder = ChannelBuilder::new().endpoint("googleads.googleapis.com");
    assert_eq!(builder.normalized_endpoint(), "https://googleads.googleapis.com");

    let endpoint = builder.build_endpoint().unwrap();
    assert_eq!(endpoint.uri().host(), Some("googleads.googleapis.com"));
}

#[test]
fn channel_builder_keeps_options() {
    let builder = ChannelBuilder::default()
        .endpoint("http://localhost:50051")
        .connect_timeout(Duration::from_secs(3))
        .tcp_keepalive(None);

    assert_eq!(builder.config().connect_timeout, Duration::from_secs(3));
    assert_eq!(builder.config().tcp_keepalive, None);
    assert_eq!(builder.normalized_endpoint(), "http://localhost:50051");
}

#[test]
fn invalid_endpoint_is_rejected() {
    let err = ChannelBuilder::new()
        .endpoint("https://bad host")
        .build_endpoint()
        .unwrap_err();

    assert!(matches!(err, ConfigError::InvalidEndpoint { .. }));
}

#[tokio::test]
async fn lazy_channel_is_built_without_connecting() {
    let channel = ChannelBuilder::new()
        .endpoint("http://127.0.0.1:1")
        .connect_lazy();

    assert!(channel.is_ok());
}
