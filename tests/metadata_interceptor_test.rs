//! 元数据拦截器测试

use ads_call_core::error::REQUEST_ID_METADATA_KEY;
use ads_call_core::interceptor::{
    CallCredentials, CallDetails, CallFault, CallMetadata, CompositeInterceptor,
    DEVELOPER_TOKEN_KEY, LINKED_CUSTOMER_ID_KEY, LOGIN_CUSTOMER_ID_KEY, MetadataInterceptor,
};
use ads_call_core::{CallError, ClientConfig, ConfigError};
use std::time::Duration;
use tonic::metadata::MetadataMap;
use tonic::service::Interceptor;
use tonic::{Code, Status};

fn pairs(metadata: &CallMetadata) -> Vec<(&str, &str)> {
    metadata.iter().collect()
}

fn interceptor() -> MetadataInterceptor {
    MetadataInterceptor::new("DEV123")
        .unwrap()
        .with_login_customer_id("999-888-7777")
        .unwrap()
}

#[tokio::test]
async fn appends_developer_token_and_login_customer_id_after_caller_metadata() {
    let call = CallDetails::new("/ads.v1.services.CampaignService/GetCampaign")
        .with_metadata(CallMetadata::from_pairs([("x-goog-api-client", "v1")]));

    let forwarded = interceptor()
        .intercept(&call, |decorated| async move { decorated })
        .await;

    assert_eq!(
        pairs(forwarded.metadata()),
        vec![
            ("x-goog-api-client", "v1"),
            ("developer-token", "DEV123"),
            ("login-customer-id", "999-888-7777"),
        ]
    );
    // 调用方的描述符保持不变
    assert_eq!(pairs(call.metadata()), vec![("x-goog-api-client", "v1")]);
}

#[tokio::test]
async fn leaves_method_timeout_and_credentials_untouched() {
    let call = CallDetails::new("/svc/Method")
        .with_timeout(Some(Duration::from_secs(60)))
        .with_credentials(Some(CallCredentials::bearer("oauth-token")));

    let forwarded = interceptor()
        .intercept(&call, |decorated| async move { decorated })
        .await;

    assert_eq!(forwarded.method(), "/svc/Method");
    assert_eq!(forwarded.timeout(), Some(Duration::from_secs(60)));
    assert_eq!(
        forwarded.credentials().map(CallCredentials::token),
        Some("oauth-token")
    );
}

#[test]
fn nested_interceptors_only_append() {
    let call = CallDetails::new("/svc/Method")
        .with_metadata(CallMetadata::from_pairs([("x-goog-api-client", "v1")]));
    let interceptor = interceptor();

    let once = interceptor.decorate(&call);
    let twice = interceptor.decorate(&once);

    assert_eq!(&twice.metadata().as_slice()[..once.metadata().len()], once.metadata().as_slice());
    assert_eq!(twice.metadata().len(), 5);
    assert_eq!(
        twice.metadata().get_all(DEVELOPER_TOKEN_KEY).collect::<Vec<_>>(),
        vec!["DEV123", "DEV123"]
    );
}

#[test]
fn caller_supplied_values_for_same_key_are_kept() {
    let call = CallDetails::new("/svc/Method")
        .with_metadata(CallMetadata::from_pairs([("login-customer-id", "1111111111")]));

    let decorated = interceptor().decorate(&call);

    assert_eq!(
        decorated.metadata().get_all(LOGIN_CUSTOMER_ID_KEY).collect::<Vec<_>>(),
        vec!["1111111111", "999-888-7777"]
    );
}

#[test]
fn empty_login_customer_id_is_not_sent() {
    let interceptor = MetadataInterceptor::new("DEV123")
        .unwrap()
        .with_login_customer_id("")
        .unwrap();

    let decorated = interceptor.decorate(&CallDetails::new("/svc/Method"));

    assert_eq!(pairs(decorated.metadata()), vec![("developer-token", "DEV123")]);
}

#[test]
fn linked_customer_id_is_appended_last() {
    let interceptor = interceptor().with_linked_customer_id("5555555555").unwrap();

    assert_eq!(
        interceptor.injected_pairs(),
        vec![
            (DEVELOPER_TOKEN_KEY, "DEV123"),
            (LOGIN_CUSTOMER_ID_KEY, "999-888-7777"),
            (LINKED_CUSTOMER_ID_KEY, "5555555555"),
        ]
    );
}

#[test]
fn cloud_org_access_omits_developer_token() {
    let interceptor = interceptor().with_cloud_org_access(true);

    let decorated = interceptor.decorate(&CallDetails::new("/svc/Method"));

    assert_eq!(decorated.metadata().get(DEVELOPER_TOKEN_KEY), None);
    assert_eq!(decorated.metadata().get(LOGIN_CUSTOMER_ID_KEY), Some("999-888-7777"));
}

#[test]
fn rejects_values_that_are_not_valid_metadata() {
    let err = MetadataInterceptor::new("token\nwith newline").unwrap_err();
    assert!(matches!(err, ConfigError::InvalidMetadataValue { ref key } if key == "developer-token"));
}

#[tokio::test]
async fn errors_from_proceed_pass_through_unchanged() {
    let call = CallDetails::new("/svc/Method");

    let result: Result<(), Status> = interceptor()
        .intercept(&call, |_| async { Err(Status::permission_denied("no access")) })
        .await;

    let status = result.unwrap_err();
    assert_eq!(status.code(), Code::PermissionDenied);
    assert_eq!(status.message(), "no access");
}

#[test]
fn tonic_interceptor_appends_to_request_metadata() {
    let mut interceptor = interceptor();
    let mut request = tonic::Request::new(());
    request
        .metadata_mut()
        .insert("developer-token", "caller-token".parse().unwrap());

    let request = interceptor.call(request).unwrap();

    let tokens: Vec<&str> = request
        .metadata()
        .get_all("developer-token")
        .iter()
        .map(|v| v.to_str().unwrap())
        .collect();
    assert_eq!(tokens, vec!["caller-token", "DEV123"]);
    assert_eq!(
        request
            .metadata()
            .get("login-customer-id")
            .and_then(|v| v.to_str().ok()),
        Some("999-888-7777")
    );
}

#[test]
fn from_config_uses_normalized_customer_ids() {
    let config = ClientConfig::from_toml_str(
        r#"
        developer_token = "DEV123"
        login_customer_id = "999-888-7777"
        use_cloud_org_for_api_access = false
        "#,
    )
    .unwrap();

    let interceptor = MetadataInterceptor::from_config(&config).unwrap();

    assert_eq!(interceptor.login_customer_id(), Some("9998887777"));
    assert_eq!(interceptor.linked_customer_id(), None);
}

#[test]
fn debug_output_redacts_developer_token() {
    let rendered = format!("{:?}", interceptor());
    assert!(!rendered.contains("DEV123"));
    assert!(rendered.contains("REDACTED"));

    let credentials = format!("{:?}", CallCredentials::bearer("secret"));
    assert!(!credentials.contains("secret"));
}

#[test]
fn redacted_json_masks_developer_token() {
    let decorated = interceptor().decorate(
        &CallDetails::new("/svc/Method")
            .with_metadata(CallMetadata::from_pairs([("x-goog-api-client", "v1")])),
    );

    let json: serde_json::Value =
        serde_json::from_str(&decorated.metadata().to_redacted_json()).unwrap();

    assert_eq!(json["developer-token"], "REDACTED");
    assert_eq!(json["login-customer-id"], "999-888-7777");
    assert_eq!(json["x-goog-api-client"], "v1");
}

#[tokio::test]
async fn composite_interceptor_injects_before_logging() {
    let composite = CompositeInterceptor::new()
        .with_metadata(interceptor())
        .with_logging("googleads.googleapis.com");

    let result: Result<CallDetails, Status> = composite
        .intercept(&CallDetails::new("/svc/Method"), |decorated| async move {
            Ok(decorated)
        })
        .await;

    let forwarded = result.unwrap();
    assert_eq!(forwarded.metadata().get(DEVELOPER_TOKEN_KEY), Some("DEV123"));
}

#[test]
fn call_details_split_method_path() {
    let call = CallDetails::for_method("ads.v1.services.CampaignService", "GetCampaign");

    assert_eq!(call.method(), "/ads.v1.services.CampaignService/GetCampaign");
    assert_eq!(call.service_name(), Some("ads.v1.services.CampaignService"));
    assert_eq!(call.method_name(), Some("GetCampaign"));
    assert_eq!(CallDetails::new("no-slash").method_name(), None);
}

#[test]
fn call_metadata_converts_to_tonic_metadata_map() {
    let metadata = CallMetadata::from_pairs([
        ("x-goog-api-client", "v1"),
        ("developer-token", "a"),
        ("developer-token", "b"),
    ]);

    let map = metadata.to_metadata_map().unwrap();
    let tokens: Vec<&str> = map
        .get_all("developer-token")
        .iter()
        .map(|v| v.to_str().unwrap())
        .collect();
    assert_eq!(tokens, vec!["a", "b"]);

    let invalid = CallMetadata::from_pairs([("Bad Key", "v")]);
    assert_eq!(invalid.to_metadata_map().unwrap_err().code(), Code::Internal);
}

#[test]
fn outbound_metadata_adds_authorization_from_credentials() {
    let call = interceptor()
        .decorate(&CallDetails::new("/svc/Method"))
        .with_credentials(Some(CallCredentials::bearer("oauth-token")));

    let map = call.outbound_metadata().unwrap();

    assert_eq!(
        map.get("authorization").and_then(|v| v.to_str().ok()),
        Some("Bearer oauth-token")
    );
    assert_eq!(
        map.get(DEVELOPER_TOKEN_KEY).and_then(|v| v.to_str().ok()),
        Some("DEV123")
    );

    let without_credentials = CallDetails::new("/svc/Method").outbound_metadata().unwrap();
    assert!(without_credentials.get("authorization").is_none());
}

#[test]
fn authorization_is_redacted_in_log_json() {
    let metadata = CallMetadata::from_pairs([(
        "authorization",
        CallCredentials::bearer("oauth-token").authorization_value(),
    )]);

    let json: serde_json::Value = serde_json::from_str(&metadata.to_redacted_json()).unwrap();

    assert_eq!(json["authorization"], "REDACTED");
}

#[tokio::test]
async fn logged_failures_expose_request_id() {
    let mut metadata = MetadataMap::new();
    metadata.insert(REQUEST_ID_METADATA_KEY, "req-42".parse().unwrap());
    let composite = CompositeInterceptor::new()
        .with_metadata(interceptor())
        .with_logging("googleads.googleapis.com");

    let result: Result<(), Status> = composite
        .intercept(&CallDetails::new("/svc/Method"), |_| async move {
            Err(Status::with_metadata(Code::Internal, "boom", metadata))
        })
        .await;

    let status = result.unwrap_err();
    assert_eq!(status.code(), Code::Internal);
    assert_eq!(CallFault::request_id(&status).as_deref(), Some("req-42"));
    assert_eq!(CallFault::request_id(&Status::internal("no id")), None);

    let err = CallError::Rpc {
        code: Code::Internal,
        message: "boom".to_string(),
        request_id: Some("req-42".to_string()),
        attempts: 1,
        elapsed: Duration::ZERO,
    };
    assert_eq!(CallFault::request_id(&err).as_deref(), Some("req-42"));
}
