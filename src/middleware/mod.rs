//! gRPC 中间件模块
//!
//! 提供可挂在 tower 服务栈上的 metadata 注入中间件

pub mod metadata;

pub use metadata::{MetadataLayer, MetadataService};
