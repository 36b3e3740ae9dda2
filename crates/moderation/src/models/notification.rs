//! 通知模型
//!
//! 通知是拉取模式的持久化记录：写入后由接收方轮询读取，
//! 除 `read` 标志外不可变，没有推送投递环节。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::enums::Role;
use crate::error::{ModerationError, Result};
use crate::principal::Principal;

/// 通知目标
///
/// 按角色广播或指向单个用户，二者必居其一。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationTarget {
    /// 广播给某个角色的所有成员
    Role(Role),
    /// 发送给指定用户
    User(Uuid),
}

impl NotificationTarget {
    /// 从存储层的两个可空字段还原目标
    ///
    /// 两者都为空是非法记录；两者都存在时以用户目标优先，
    /// 读取方按自身身份匹配任一字段即可看到该通知。
    pub fn from_parts(for_role: Option<Role>, user_id: Option<Uuid>) -> Result<Self> {
        match (for_role, user_id) {
            (_, Some(user_id)) => Ok(Self::User(user_id)),
            (Some(role), None) => Ok(Self::Role(role)),
            (None, None) => Err(ModerationError::Validation(
                "通知目标缺失: forRole 与 userId 至少需要一个".to_string(),
            )),
        }
    }
}

/// 通知记录
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: Uuid,
    pub title: String,
    pub message: String,
    /// 来源实体类型标签（自由文本，如 "material"）
    pub kind: String,
    pub related_id: Option<Uuid>,
    pub for_role: Option<Role>,
    pub user_id: Option<Uuid>,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    /// 创建未读通知
    pub fn new(
        target: NotificationTarget,
        title: impl Into<String>,
        message: impl Into<String>,
        kind: impl Into<String>,
        related_id: Option<Uuid>,
    ) -> Self {
        let (for_role, user_id) = match target {
            NotificationTarget::Role(role) => (Some(role), None),
            NotificationTarget::User(user_id) => (None, Some(user_id)),
        };

        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            message: message.into(),
            kind: kind.into(),
            related_id,
            for_role,
            user_id,
            read: false,
            created_at: Utc::now(),
        }
    }

    /// 通知是否面向该主体
    ///
    /// 角色匹配或用户 ID 匹配任一满足即可。
    pub fn is_addressed_to(&self, principal: &Principal) -> bool {
        self.for_role == Some(principal.role) || self.user_id == Some(principal.id)
    }
}
