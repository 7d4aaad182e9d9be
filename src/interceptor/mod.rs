//! gRPC 拦截器模块
//!
//! 提供 metadata 注入、日志与组合拦截器。拦截器只变换调用描述符，
//! 不改变方法、超时、凭证或请求负载

pub mod composite;
pub mod details;
pub mod logging;
pub mod metadata;

pub use composite::CompositeInterceptor;
pub use details::{CallCredentials, CallDetails, CallMetadata, SENSITIVE_INFO_MASK};
pub use logging::{CallFault, LoggingInterceptor};
pub use metadata::{
    DEVELOPER_TOKEN_KEY, LINKED_CUSTOMER_ID_KEY, LOGIN_CUSTOMER_ID_KEY, MetadataInterceptor,
};
