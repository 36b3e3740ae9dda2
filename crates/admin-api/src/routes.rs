//! 路由配置模块
//!
//! 定义所有 REST API 端点的路由映射。能力检查在路由组上声明，
//! 属主级别的细粒度判断由处理器与工作流引擎完成。

use axum::{
    Router, middleware,
    routing::{delete, get, patch, post, put},
};
use marketplace_moderation::Capability;

use crate::{handlers, middleware::require_capability, state::AppState};

/// 认证相关路由（login/register 公开，其余需认证）
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(handlers::auth::register))
        .route("/auth/login", post(handlers::auth::login))
        .route("/auth/logout", post(handlers::auth::logout))
        .route("/auth/me", get(handlers::auth::get_current_user))
        .route("/auth/refresh", post(handlers::auth::refresh_token))
}

/// 管理员账号审批路由（仅 SuperAdmin）
fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/admins", get(handlers::admin::list_admins))
        .route("/admins/{id}", get(handlers::admin::get_admin))
        .route("/admins/{id}", patch(handlers::admin::review_admin))
        .route("/admins/{id}", delete(handlers::admin::delete_admin))
        .route_layer(middleware::from_fn(require_capability(
            Capability::ManageAdmins,
        )))
}

/// 材料管理路由
///
/// 提交/修改对管理员开放，审批流转仅 SuperAdmin。
fn material_routes() -> Router<AppState> {
    let review = Router::new()
        .route(
            "/materials/{id}/status",
            patch(handlers::material::transition_material),
        )
        .route_layer(middleware::from_fn(require_capability(
            Capability::TransitionStatus,
        )));

    let bulk = Router::new()
        .route(
            "/materials/bulk-status",
            post(handlers::material::bulk_transition_materials),
        )
        .route_layer(middleware::from_fn(require_capability(
            Capability::BulkTransition,
        )));

    Router::new()
        .route("/materials", post(handlers::material::create_material))
        .route("/materials", get(handlers::material::list_materials))
        .route(
            "/materials/statistics",
            get(handlers::material::material_statistics),
        )
        .route("/materials/{id}", get(handlers::material::get_material))
        .route("/materials/{id}", put(handlers::material::update_material))
        .route(
            "/materials/{id}",
            delete(handlers::material::delete_material),
        )
        .merge(review)
        .merge(bulk)
}

/// 店铺管理路由
fn store_routes() -> Router<AppState> {
    Router::new()
        .route("/stores", post(handlers::store::create_store))
        .route("/stores", get(handlers::store::list_stores))
        .route("/stores/{id}", get(handlers::store::get_store))
        .route("/stores/{id}", put(handlers::store::update_store))
        .route("/stores/{id}", delete(handlers::store::delete_store))
}

/// 商品管理路由
fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/products", post(handlers::product::create_product))
        .route("/products", get(handlers::product::list_products))
        .route("/products/{id}", get(handlers::product::get_product))
        .route("/products/{id}", put(handlers::product::update_product))
        .route("/products/{id}", delete(handlers::product::delete_product))
}

/// 通知路由
fn notification_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/notifications",
            get(handlers::notification::list_notifications),
        )
        .route(
            "/notifications/{id}/read",
            post(handlers::notification::mark_notification_read),
        )
}

/// 组装全部 API 路由
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(auth_routes())
        .merge(admin_routes())
        .merge(material_routes())
        .merge(store_routes())
        .merge(product_routes())
        .merge(notification_routes())
}
