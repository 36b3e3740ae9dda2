//! 统一可观测性模块
//!
//! 提供日志初始化和 HTTP 请求追踪中间件。
//! 所有服务通过单一入口点配置日志，确保一致的输出格式。

pub mod middleware;

use anyhow::Result;
use tracing::info;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

pub use crate::config::ObservabilityConfig;

/// 可观测性资源守卫
///
/// 当 Guard 被 drop 时记录关闭日志；持有者应将其保存到 main 结束。
pub struct ObservabilityGuard {
    _private: (),
}

impl ObservabilityGuard {
    /// 创建一个空的 Guard（用于测试或禁用可观测性时）
    pub fn empty() -> Self {
        Self { _private: () }
    }
}

impl Drop for ObservabilityGuard {
    fn drop(&mut self) {
        info!("Shutting down observability...");
    }
}

/// 初始化日志订阅器
///
/// 日志级别优先读取 RUST_LOG 环境变量，其次使用配置中的 log_level。
/// json_logs 控制输出结构化 JSON（生产）还是带颜色的可读格式（开发）。
pub fn init(config: &ObservabilityConfig) -> Result<ObservabilityGuard> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let fmt_layer = if config.json_logs {
        fmt::layer()
            .json()
            .with_span_events(FmtSpan::CLOSE)
            .with_target(true)
            .with_thread_ids(true)
            .boxed()
    } else {
        fmt::layer()
            .with_target(true)
            .with_thread_ids(false)
            .with_ansi(true)
            .boxed()
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()?;

    info!(
        service = %config.service_name,
        log_level = %config.log_level,
        json_logs = config.json_logs,
        "Observability initialized"
    );

    Ok(ObservabilityGuard { _private: () })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ObservabilityConfig::default();
        assert_eq!(config.log_level, "info");
        assert!(!config.json_logs);
    }

    #[test]
    fn test_empty_guard() {
        let _guard = ObservabilityGuard::empty();
    }
}
