//! Ads API Client Call Governance
//!
//! Governs every outbound unary RPC of the generated Ads API stubs: appends
//! authentication/routing metadata and applies the per-method timeout and retry
//! policy declared in each service's configuration table.

pub mod client;
pub mod config;
pub mod error;
pub mod interceptor;
pub mod logging;
pub mod middleware;
pub mod retry;

// Re-exports
pub use client::{CallOptions, ChannelBuilder, GovernedClient, UnaryTransport};
pub use config::{ClientConfig, LogFormat, LoggingConfig};
pub use error::{CallError, ConfigError, Result};
pub use interceptor::{
    CallCredentials, CallDetails, CallMetadata, CompositeInterceptor, LoggingInterceptor,
    MetadataInterceptor,
};
pub use logging::init_logging;
pub use middleware::{MetadataLayer, MetadataService};
pub use retry::{
    Attempt, DelaySchedule, MethodPolicy, PolicyTable, RetryCodes, RetryParams, RetryPolicy,
    execute_with_cancellation, execute_with_retry,
};

// 取消信号类型，调用方通过 CallOptions::cancellation 传入
pub use tokio_util::sync::CancellationToken;
