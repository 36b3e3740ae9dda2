//! 共享库
//!
//! 包含各服务共用的配置加载、数据库连接、可观测性等基础设施代码。

pub mod config;
pub mod database;
pub mod observability;
