//! 能力检查中间件
//!
//! 在路由组上声明所需能力，请求主体缺少该能力时返回 403。
//! 细粒度的属主判断仍在处理器与工作流引擎内完成。

use axum::{
    body::Body,
    http::{Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use futures::future::BoxFuture;
use marketplace_moderation::Capability;
use serde_json::json;

use crate::auth::Claims;

/// 构造按能力拦截的中间件
///
/// 用法：`route_layer(middleware::from_fn(require_capability(Capability::TransitionStatus)))`。
/// 依赖 auth 中间件先行注入 Claims。
pub fn require_capability(
    capability: Capability,
) -> impl Fn(Request<Body>, Next) -> BoxFuture<'static, Response> + Clone {
    move |request: Request<Body>, next: Next| {
        Box::pin(async move {
            let Some(claims) = request.extensions().get::<Claims>() else {
                return error_response(StatusCode::UNAUTHORIZED, "UNAUTHORIZED", "未认证");
            };

            let principal = match claims.principal() {
                Ok(principal) => principal,
                Err(e) => {
                    return error_response(
                        StatusCode::UNAUTHORIZED,
                        "UNAUTHORIZED",
                        &e.to_string(),
                    );
                }
            };

            if principal.require(capability).is_err() {
                return error_response(
                    StatusCode::FORBIDDEN,
                    "FORBIDDEN",
                    &format!("权限不足: {}", capability.name()),
                );
            }

            next.run(request).await
        })
    }
}

fn error_response(status: StatusCode, code: &str, message: &str) -> Response {
    let body = json!({
        "success": false,
        "code": code,
        "message": message,
        "data": null
    });

    (status, axum::Json(body)).into_response()
}
