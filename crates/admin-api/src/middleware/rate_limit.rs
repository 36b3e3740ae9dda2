//! 登录/注册限流中间件
//!
//! 进程内滑动窗口计数：每个客户端在窗口内最多允许 N 次请求，
//! 超限后进入封禁期，封禁期内所有请求直接 429。
//! 只覆盖认证端点，业务端点不限流。

use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use dashmap::DashMap;
use marketplace_shared::config::RateLimitConfig;
use serde_json::json;
use tracing::warn;

use crate::state::AppState;

/// 单个客户端的请求记录
struct ClientRecord {
    /// 窗口内的请求时间点
    timestamps: Vec<Instant>,
    /// 封禁截止时间
    banned_until: Option<Instant>,
}

/// 进程内滑动窗口限流器
pub struct RateLimiter {
    config: RateLimitConfig,
    clients: DashMap<String, ClientRecord>,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            clients: DashMap::new(),
        }
    }

    /// 检查并记录一次请求
    ///
    /// 返回 Err(剩余封禁秒数) 表示该客户端当前被拒绝。
    pub fn check(&self, key: &str) -> Result<(), u64> {
        let now = Instant::now();
        let window = Duration::from_secs(self.config.window_seconds);

        let mut record = self.clients.entry(key.to_string()).or_insert(ClientRecord {
            timestamps: Vec::new(),
            banned_until: None,
        });

        if let Some(banned_until) = record.banned_until {
            if now < banned_until {
                return Err((banned_until - now).as_secs().max(1));
            }
            // 封禁期结束，重置记录
            record.banned_until = None;
            record.timestamps.clear();
        }

        record.timestamps.retain(|t| now - *t < window);

        if record.timestamps.len() >= self.config.max_requests as usize {
            let ban = Duration::from_secs(self.config.ban_seconds);
            record.banned_until = Some(now + ban);
            return Err(self.config.ban_seconds);
        }

        record.timestamps.push(now);
        Ok(())
    }
}

/// 认证端点限流中间件
///
/// 放在 auth 中间件之外（登录/注册请求没有 Claims），
/// 以客户端 IP 为限流键。
pub async fn rate_limit_middleware(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let path = request.uri().path();

    if !is_limited_path(path) {
        return next.run(request).await;
    }

    let client_key = client_key(&request);

    if let Err(retry_after) = state.rate_limiter.check(&client_key) {
        warn!(client = %client_key, path = %path, "认证端点限流触发");
        return too_many_requests_response(retry_after);
    }

    next.run(request).await
}

/// 需要限流的路径
fn is_limited_path(path: &str) -> bool {
    path.starts_with("/api/admin/auth/login") || path.starts_with("/api/admin/auth/register")
}

/// 提取客户端标识
///
/// 反向代理部署时取 x-forwarded-for 的第一个地址。
fn client_key(request: &Request<Body>) -> String {
    request
        .headers()
        .get("x-forwarded-for")
        .and_then(|h| h.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|s| s.trim().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

/// 生成 429 响应，带 Retry-After 头
fn too_many_requests_response(retry_after: u64) -> Response {
    let body = json!({
        "success": false,
        "code": "RATE_LIMITED",
        "message": "请求过于频繁，请稍后再试",
        "data": null
    });

    let mut response = (StatusCode::TOO_MANY_REQUESTS, axum::Json(body)).into_response();
    if let Ok(val) = axum::http::HeaderValue::from_str(&retry_after.to_string()) {
        response.headers_mut().insert("Retry-After", val);
    }
    response
}
