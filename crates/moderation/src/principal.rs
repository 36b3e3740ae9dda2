//! 主体与能力模型
//!
//! 角色到允许操作的映射集中在一张静态能力表中，
//! 每个工作流操作只查询一次，避免散落各处的角色字符串比较。

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{ModerationError, Result};
use crate::models::Role;

/// 已认证主体
///
/// 从验证过的凭证中提取，凭证存续期内不可变。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub id: Uuid,
    pub role: Role,
}

impl Principal {
    pub fn new(id: Uuid, role: Role) -> Self {
        Self { id, role }
    }

    /// 要求主体具备某项能力，否则返回 Forbidden
    pub fn require(&self, capability: Capability) -> Result<()> {
        if self.role.can(capability) {
            Ok(())
        } else {
            Err(ModerationError::Forbidden {
                operation: capability.name().to_string(),
            })
        }
    }
}

/// 操作能力
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    /// 提交可审核实体
    SubmitEntity,
    /// 重新提交自己拥有的实体
    ResubmitOwn,
    /// 流转任意实体的审核状态
    TransitionStatus,
    /// 批量流转审核状态
    BulkTransition,
    /// 读取所有实体（不限属主）
    ReadAllEntities,
    /// 管理管理员账号（审批、删除）
    ManageAdmins,
    /// 管理自己的店铺与商品
    ManageOwnResources,
    /// 读取面向自己的通知
    ReadNotifications,
}

impl Capability {
    /// 稳定的操作名，用于 Forbidden 错误信息和日志
    pub fn name(&self) -> &'static str {
        match self {
            Self::SubmitEntity => "entity:submit",
            Self::ResubmitOwn => "entity:resubmit",
            Self::TransitionStatus => "entity:transition",
            Self::BulkTransition => "entity:bulk-transition",
            Self::ReadAllEntities => "entity:read-all",
            Self::ManageAdmins => "admin:manage",
            Self::ManageOwnResources => "resource:manage-own",
            Self::ReadNotifications => "notification:read",
        }
    }
}

impl Role {
    /// 角色的能力集
    ///
    /// SuperAdmin 显式列出 Admin 能力的超集，不做隐式继承。
    pub fn capabilities(&self) -> &'static [Capability] {
        match self {
            Role::User => &[],
            Role::Admin => &[
                Capability::SubmitEntity,
                Capability::ResubmitOwn,
                Capability::ManageOwnResources,
                Capability::ReadNotifications,
            ],
            Role::SuperAdmin => &[
                Capability::SubmitEntity,
                Capability::ResubmitOwn,
                Capability::TransitionStatus,
                Capability::BulkTransition,
                Capability::ReadAllEntities,
                Capability::ManageAdmins,
                Capability::ManageOwnResources,
                Capability::ReadNotifications,
            ],
        }
    }

    /// 角色是否具备某项能力
    pub fn can(&self, capability: Capability) -> bool {
        self.capabilities().contains(&capability)
    }
}
