//! 通知的 HTTP 处理器
//!
//! 拉取模式：客户端轮询列表接口获取通知，逐条标记已读。

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};
use marketplace_moderation::Notification;
use uuid::Uuid;

use crate::auth::Claims;
use crate::dto::{ApiResponse, PageResponse, PaginationParams};
use crate::error::Result;
use crate::state::AppState;

/// 通知列表
///
/// GET /api/admin/notifications
///
/// 只返回面向当前主体的通知（角色广播或点对点），按创建时间降序。
pub async fn list_notifications(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Query(pagination): Query<PaginationParams>,
) -> Result<Json<ApiResponse<PageResponse<Notification>>>> {
    let principal = claims.principal()?;

    let (items, total) = state
        .fanout
        .list_for(&principal, pagination.limit(), pagination.offset())
        .await?;

    Ok(Json(ApiResponse::success(PageResponse::new(
        items,
        total,
        pagination.page,
        pagination.limit(),
    ))))
}

/// 标记通知已读
///
/// POST /api/admin/notifications/{id}/read
///
/// 幂等：重复调用保持已读状态，返回成功。
pub async fn mark_notification_read(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<()>>> {
    let principal = claims.principal()?;

    state.fanout.mark_read(&principal, id).await?;

    Ok(Json(ApiResponse::success(())))
}
