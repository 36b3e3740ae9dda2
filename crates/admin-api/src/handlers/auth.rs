//! 认证相关的 HTTP 处理器
//!
//! 提供注册、登录、获取当前用户和刷新 Token 的 API

use axum::{
    Extension, Json,
    extract::{Multipart, State},
};
use marketplace_moderation::{
    AdminAccount, EntityKind, ModerationStatus, NotificationTarget, Role,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{info, warn};
use validator::Validate;

use crate::auth::{Claims, hash_password, verify_password};
use crate::dto::ApiResponse;
use crate::error::{AdminError, Result};
use crate::state::AppState;

// ============================================
// 请求/响应 DTO
// ============================================

/// 登录请求
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    #[validate(length(min = 1, max = 50, message = "用户名长度必须在 1-50 之间"))]
    pub username: String,
    #[validate(length(min = 1, max = 100, message = "密码长度必须在 1-100 之间"))]
    pub password: String,
}

/// 注册表单（multipart 字段汇总后校验）
#[derive(Debug, Default, Validate)]
pub struct RegisterForm {
    #[validate(length(min = 3, max = 50, message = "用户名长度必须在 3-50 之间"))]
    pub username: String,
    #[validate(email(message = "邮箱格式不正确"))]
    pub email: String,
    #[validate(length(min = 8, max = 100, message = "密码长度必须在 8-100 之间"))]
    pub password: String,
}

/// 登录响应
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    pub user: AdminAccount,
    pub expires_at: i64,
}

/// Token 刷新响应
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshResponse {
    pub token: String,
    pub expires_at: i64,
}

// ============================================
// API 处理器
// ============================================

/// 管理员注册
///
/// POST /api/admin/auth/register（multipart）
///
/// 字段：username / email / password，证件照 idDocument 与手持自拍 selfie。
/// 新账号以未验证、未审批状态落库，等待 SuperAdmin 审核后方可登录。
pub async fn register(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<ApiResponse<AdminAccount>>> {
    let mut form = RegisterForm::default();
    let mut id_document: Option<(Vec<u8>, String, String)> = None;
    let mut selfie: Option<(Vec<u8>, String, String)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AdminError::FileProcessingError(format!("读取表单失败: {}", e)))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "username" => form.username = text_field(field).await?,
            "email" => form.email = text_field(field).await?,
            "password" => form.password = text_field(field).await?,
            "idDocument" => id_document = Some(file_field(field).await?),
            "selfie" => selfie = Some(file_field(field).await?),
            _ => {}
        }
    }

    form.validate()?;

    // 用户名与邮箱唯一
    let exists: Option<(uuid::Uuid,)> =
        sqlx::query_as("SELECT id FROM admins WHERE username = $1 OR email = $2")
            .bind(&form.username)
            .bind(&form.email)
            .fetch_optional(&state.pool)
            .await?;
    if exists.is_some() {
        return Err(AdminError::DuplicateName(form.username));
    }

    let account_id = uuid::Uuid::new_v4();

    // 证件材料先上传，失败时账号不落库
    let id_document_url = match id_document {
        Some((bytes, content_type, file_name)) => Some(
            state
                .blob
                .upload(
                    bytes,
                    &content_type,
                    &format!("admins/{}/id-{}", account_id, file_name),
                )
                .await?,
        ),
        None => None,
    };
    let selfie_url = match selfie {
        Some((bytes, content_type, file_name)) => Some(
            state
                .blob
                .upload(
                    bytes,
                    &content_type,
                    &format!("admins/{}/selfie-{}", account_id, file_name),
                )
                .await?,
        ),
        None => None,
    };

    let mut account = AdminAccount::new_pending(
        form.username,
        form.email,
        hash_password(&form.password)?,
        id_document_url,
        selfie_url,
    );
    account.id = account_id;

    sqlx::query(
        r#"
        INSERT INTO admins (
            id, username, email, password_hash, role, id_document_url, selfie_url,
            is_identity_verified, is_approved, status, created_at, updated_at
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
        "#,
    )
    .bind(account.id)
    .bind(&account.username)
    .bind(&account.email)
    .bind(&account.password_hash)
    .bind(account.role)
    .bind(&account.id_document_url)
    .bind(&account.selfie_url)
    .bind(account.is_identity_verified)
    .bind(account.is_approved)
    .bind(account.status)
    .bind(account.created_at)
    .bind(account.updated_at)
    .execute(&state.pool)
    .await?;

    info!(admin_id = %account.id, username = %account.username, "管理员注册，等待审批");

    // 账号已落库，通知失败只记日志
    notify_registration_pending(&state, &account).await;

    Ok(Json(ApiResponse::success(account)))
}

/// 用户登录
///
/// POST /api/admin/auth/login
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<ApiResponse<LoginResponse>>> {
    req.validate()?;

    let user: AdminAccount = sqlx::query_as(
        r#"
        SELECT id, username, email, password_hash, role, id_document_url, selfie_url,
               is_identity_verified, is_approved, status, created_at, updated_at
        FROM admins
        WHERE username = $1
        "#,
    )
    .bind(&req.username)
    .fetch_optional(&state.pool)
    .await?
    .ok_or(AdminError::InvalidCredentials)?;

    if !verify_password(&req.password, &user.password_hash)? {
        return Err(AdminError::InvalidCredentials);
    }

    // SuperAdmin 账号不走审批流程，其余账号必须审批通过才能登录
    if user.role != Role::SuperAdmin && !(user.is_approved && user.is_identity_verified) {
        return Err(AdminError::AccountNotApproved);
    }

    let (token, expires_at) = state
        .jwt_manager
        .generate_token(user.id, &user.username, user.role)?;

    info!(admin_id = %user.id, "登录成功");

    Ok(Json(ApiResponse::success(LoginResponse {
        token,
        user,
        expires_at,
    })))
}

/// 用户登出
///
/// POST /api/admin/auth/logout
pub async fn logout() -> Result<Json<ApiResponse<()>>> {
    // JWT 是无状态的，登出只需前端清除 Token
    Ok(Json(ApiResponse::success(())))
}

/// 获取当前用户信息
///
/// GET /api/admin/auth/me
pub async fn get_current_user(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<ApiResponse<AdminAccount>>> {
    let principal = claims.principal()?;

    let user: AdminAccount = sqlx::query_as(
        r#"
        SELECT id, username, email, password_hash, role, id_document_url, selfie_url,
               is_identity_verified, is_approved, status, created_at, updated_at
        FROM admins
        WHERE id = $1
        "#,
    )
    .bind(principal.id)
    .fetch_optional(&state.pool)
    .await?
    .ok_or_else(|| AdminError::UserNotFound(claims.sub.clone()))?;

    Ok(Json(ApiResponse::success(user)))
}

/// 刷新 Token
///
/// POST /api/admin/auth/refresh
pub async fn refresh_token(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<ApiResponse<RefreshResponse>>> {
    let (token, expires_at) = state.jwt_manager.refresh_token(&claims)?;

    Ok(Json(ApiResponse::success(RefreshResponse {
        token,
        expires_at,
    })))
}

// ============================================
// 内部辅助
// ============================================

async fn text_field(field: axum::extract::multipart::Field<'_>) -> Result<String> {
    field
        .text()
        .await
        .map_err(|e| AdminError::FileProcessingError(format!("读取字段失败: {}", e)))
}

async fn file_field(
    field: axum::extract::multipart::Field<'_>,
) -> Result<(Vec<u8>, String, String)> {
    let content_type = field
        .content_type()
        .unwrap_or("application/octet-stream")
        .to_string();
    let file_name = field.file_name().unwrap_or("upload").to_string();
    let bytes = field
        .bytes()
        .await
        .map_err(|e| AdminError::FileProcessingError(format!("读取文件失败: {}", e)))?;

    if bytes.is_empty() {
        return Err(AdminError::FileProcessingError("文件内容为空".to_string()));
    }

    Ok((bytes.to_vec(), content_type, file_name))
}

/// 通知 SuperAdmin 有新的注册申请
async fn notify_registration_pending(state: &AppState, account: &AdminAccount) {
    let mut vars = HashMap::new();
    vars.insert("name".to_string(), account.username.clone());

    let Some((title, message)) = state.templates.render_notification(
        EntityKind::AdminRegistration,
        ModerationStatus::Pending,
        &vars,
    ) else {
        warn!("缺少管理员注册通知模板，跳过通知");
        return;
    };

    if let Err(e) = state
        .fanout
        .notify(
            NotificationTarget::Role(Role::SuperAdmin),
            title,
            message,
            EntityKind::AdminRegistration.as_str(),
            Some(account.id),
        )
        .await
    {
        warn!(admin_id = %account.id, error = %e, "注册通知写入失败，账号已创建，不回滚");
    }
}
