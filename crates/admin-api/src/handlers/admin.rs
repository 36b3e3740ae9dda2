//! 管理员账号审批的 HTTP 处理器
//!
//! SuperAdmin 审核注册申请：核验证件、批准或驳回账号。
//! SuperAdmin 账号本身不允许通过这些接口修改或删除。

use axum::{
    Json,
    extract::{Path, Query, State},
};
use marketplace_moderation::{
    AdminAccount, EntityKind, ModerationStatus, NotificationTarget, Role,
};
use serde::Deserialize;
use std::collections::HashMap;
use tracing::{info, warn};
use uuid::Uuid;

use crate::dto::{ApiResponse, DeletedResponse, PageResponse, PaginationParams};
use crate::error::{AdminError, Result};
use crate::state::AppState;

/// 审批更新请求
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewAdminRequest {
    pub is_identity_verified: Option<bool>,
    pub is_approved: Option<bool>,
}

/// 列出管理员账号
///
/// GET /api/admin/admins
pub async fn list_admins(
    State(state): State<AppState>,
    Query(pagination): Query<PaginationParams>,
) -> Result<Json<ApiResponse<PageResponse<AdminAccount>>>> {
    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM admins")
        .fetch_one(&state.pool)
        .await?;

    if total == 0 {
        return Ok(Json(ApiResponse::success(PageResponse::empty(
            pagination.page,
            pagination.limit(),
        ))));
    }

    let admins: Vec<AdminAccount> = sqlx::query_as(
        r#"
        SELECT id, username, email, password_hash, role, id_document_url, selfie_url,
               is_identity_verified, is_approved, status, created_at, updated_at
        FROM admins
        ORDER BY created_at DESC
        LIMIT $1 OFFSET $2
        "#,
    )
    .bind(pagination.limit())
    .bind(pagination.offset())
    .fetch_all(&state.pool)
    .await?;

    Ok(Json(ApiResponse::success(PageResponse::new(
        admins,
        total,
        pagination.page,
        pagination.limit(),
    ))))
}

/// 获取单个管理员账号
///
/// GET /api/admin/admins/{id}
pub async fn get_admin(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<AdminAccount>>> {
    let admin = fetch_admin(&state, id).await?;
    Ok(Json(ApiResponse::success(admin)))
}

/// 审批管理员账号
///
/// PATCH /api/admin/admins/{id}
///
/// 更新核验/审批标志位。两个标志都为 true 视为通过，显式置
/// `isApproved=false` 视为驳回；审批结果变化时通知账号所有者，
/// 重复提交相同结果不产生新通知。
pub async fn review_admin(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<ReviewAdminRequest>,
) -> Result<Json<ApiResponse<AdminAccount>>> {
    if req.is_identity_verified.is_none() && req.is_approved.is_none() {
        return Err(AdminError::Validation(
            "至少需要一个审批字段".to_string(),
        ));
    }

    let mut admin = fetch_admin(&state, id).await?;

    if admin.role == Role::SuperAdmin {
        return Err(AdminError::SuperAdminImmutable);
    }

    let should_notify = apply_review(&mut admin, &req);

    sqlx::query(
        r#"
        UPDATE admins
        SET is_identity_verified = $1, is_approved = $2, status = $3, updated_at = $4
        WHERE id = $5
        "#,
    )
    .bind(admin.is_identity_verified)
    .bind(admin.is_approved)
    .bind(admin.status)
    .bind(admin.updated_at)
    .bind(admin.id)
    .execute(&state.pool)
    .await?;

    info!(
        admin_id = %admin.id,
        status = %admin.status,
        "管理员审批已更新"
    );

    if should_notify {
        notify_review_result(&state, &admin, admin.status).await;
    }

    Ok(Json(ApiResponse::success(admin)))
}

/// 删除管理员账号
///
/// DELETE /api/admin/admins/{id}
pub async fn delete_admin(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<DeletedResponse>>> {
    let admin = fetch_admin(&state, id).await?;

    if admin.role == Role::SuperAdmin {
        return Err(AdminError::SuperAdminImmutable);
    }

    sqlx::query("DELETE FROM admins WHERE id = $1")
        .bind(id)
        .execute(&state.pool)
        .await?;

    info!(admin_id = %id, "管理员账号已删除");

    Ok(Json(ApiResponse::success(DeletedResponse::success())))
}

// ============================================
// 内部辅助
// ============================================

async fn fetch_admin(state: &AppState, id: Uuid) -> Result<AdminAccount> {
    sqlx::query_as(
        r#"
        SELECT id, username, email, password_hash, role, id_document_url, selfie_url,
               is_identity_verified, is_approved, status, created_at, updated_at
        FROM admins
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(&state.pool)
    .await?
    .ok_or_else(|| AdminError::UserNotFound(id.to_string()))
}

/// 应用审批请求的标志位并推导新状态，返回是否需要通知所有者
///
/// 结论（approved / rejected）持久化在 `status` 上，结论未变化或
/// 回到待审时不通知，因此重复驳回同一账号只通知一次。
fn apply_review(admin: &mut AdminAccount, req: &ReviewAdminRequest) -> bool {
    let previous = admin.status;

    if let Some(verified) = req.is_identity_verified {
        admin.is_identity_verified = verified;
    }
    if let Some(approved) = req.is_approved {
        admin.is_approved = approved;
    }
    admin.status = review_outcome(req, admin);
    admin.updated_at = chrono::Utc::now();

    admin.status != previous && admin.status != ModerationStatus::Pending
}

/// 本次审批请求得出的账号状态（在标志位已应用之后调用）
///
/// 显式置 `isApproved=false` 视为驳回；两个标志都置位视为通过；
/// 其余情况（如只核验了证件）回到待审。
fn review_outcome(req: &ReviewAdminRequest, admin: &AdminAccount) -> ModerationStatus {
    if req.is_approved == Some(false) {
        ModerationStatus::Rejected
    } else if admin.is_identity_verified && admin.is_approved {
        ModerationStatus::Approved
    } else {
        ModerationStatus::Pending
    }
}

/// 通知账号所有者审批结果，失败只记日志
async fn notify_review_result(state: &AppState, admin: &AdminAccount, status: ModerationStatus) {
    let mut vars = HashMap::new();
    vars.insert("name".to_string(), admin.username.clone());

    let Some((title, message)) =
        state
            .templates
            .render_notification(EntityKind::AdminRegistration, status, &vars)
    else {
        warn!(status = %status, "缺少管理员审批通知模板，跳过通知");
        return;
    };

    if let Err(e) = state
        .fanout
        .notify(
            NotificationTarget::User(admin.id),
            title,
            message,
            EntityKind::AdminRegistration.as_str(),
            Some(admin.id),
        )
        .await
    {
        warn!(admin_id = %admin.id, error = %e, "审批通知写入失败，审批结果已保存，不回滚");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_admin() -> AdminAccount {
        AdminAccount::new_pending(
            "alice".to_string(),
            "alice@example.com".to_string(),
            "$2b$12$hash".to_string(),
            None,
            None,
        )
    }

    #[test]
    fn test_review_outcome_requires_both_flags_for_approval() {
        let mut admin = sample_admin();

        let req = ReviewAdminRequest {
            is_identity_verified: Some(true),
            is_approved: None,
        };
        let notified = apply_review(&mut admin, &req);
        assert_eq!(admin.status, ModerationStatus::Pending);
        assert!(!notified, "只核验证件不应通知");

        let req = ReviewAdminRequest {
            is_identity_verified: None,
            is_approved: Some(true),
        };
        let notified = apply_review(&mut admin, &req);
        assert_eq!(admin.status, ModerationStatus::Approved);
        assert!(notified);
    }

    #[test]
    fn test_explicit_rejection_wins_over_flags() {
        let mut admin = sample_admin();
        admin.is_identity_verified = true;

        let req = ReviewAdminRequest {
            is_identity_verified: None,
            is_approved: Some(false),
        };
        let notified = apply_review(&mut admin, &req);
        assert_eq!(admin.status, ModerationStatus::Rejected);
        assert!(notified);
    }

    /// 重复驳回同一账号不应重复通知：驳回结论持久化在 status 上，
    /// 第二次请求得出相同结论视为无变化
    #[test]
    fn test_repeated_rejection_does_not_renotify() {
        let mut admin = sample_admin();
        let reject = ReviewAdminRequest {
            is_identity_verified: None,
            is_approved: Some(false),
        };

        let notified = apply_review(&mut admin, &reject);
        assert_eq!(admin.status, ModerationStatus::Rejected);
        assert!(notified, "第一次驳回应通知账号所有者");

        let notified = apply_review(&mut admin, &reject);
        assert_eq!(admin.status, ModerationStatus::Rejected);
        assert!(!notified, "重复驳回不应产生新通知");
    }

    /// 驳回后重新批准仍会通知（结论发生变化）
    #[test]
    fn test_approval_after_rejection_notifies_again() {
        let mut admin = sample_admin();
        let reject = ReviewAdminRequest {
            is_identity_verified: None,
            is_approved: Some(false),
        };
        apply_review(&mut admin, &reject);

        let approve = ReviewAdminRequest {
            is_identity_verified: Some(true),
            is_approved: Some(true),
        };
        let notified = apply_review(&mut admin, &approve);
        assert_eq!(admin.status, ModerationStatus::Approved);
        assert!(notified);
    }
}
