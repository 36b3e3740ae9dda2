//! 管理员账号模型

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::enums::{ModerationStatus, Role};

/// 管理员账号
///
/// 注册时上传证件照与手持自拍，`is_identity_verified` 与 `is_approved`
/// 由 SuperAdmin 审核后置位；未审批通过的账号不能登录。
/// `status` 持久化审核结论（驳回不能只靠标志位还原），
/// SuperAdmin 账号不允许通过管理接口修改或删除。
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct AdminAccount {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: Role,
    pub id_document_url: Option<String>,
    pub selfie_url: Option<String>,
    pub is_identity_verified: bool,
    pub is_approved: bool,
    pub status: ModerationStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AdminAccount {
    /// 创建待审批的管理员账号
    pub fn new_pending(
        username: String,
        email: String,
        password_hash: String,
        id_document_url: Option<String>,
        selfie_url: Option<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            username,
            email,
            password_hash,
            role: Role::Admin,
            id_document_url,
            selfie_url,
            is_identity_verified: false,
            is_approved: false,
            status: ModerationStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }
}
