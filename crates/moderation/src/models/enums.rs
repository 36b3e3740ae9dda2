//! 枚举类型定义

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 审核状态
///
/// 任何可审核实体都在这三个状态间流转，状态只能通过工作流引擎修改。
/// 没有终态：所有者重新提交会回到 pending，SuperAdmin 可在
/// approved 与 rejected 之间直接改判。
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type,
)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "varchar", rename_all = "lowercase")]
pub enum ModerationStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

impl ModerationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }
}

impl fmt::Display for ModerationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModerationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            other => Err(format!("无效的审核状态: {}", other)),
        }
    }
}

/// 角色
///
/// 扁平的授权格局：SuperAdmin 的能力是 Admin 的超集，
/// 但通过显式的能力表声明，而非继承。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "varchar")]
pub enum Role {
    User,
    Admin,
    SuperAdmin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "User",
            Self::Admin => "Admin",
            Self::SuperAdmin => "SuperAdmin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "User" => Ok(Self::User),
            "Admin" => Ok(Self::Admin),
            "SuperAdmin" => Ok(Self::SuperAdmin),
            other => Err(format!("无效的角色: {}", other)),
        }
    }
}

/// 可审核实体类型标签
///
/// 通知模板以 (实体类型, 新状态) 为键，新增实体类型时
/// 只需注册模板，无需修改工作流引擎。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Material,
    AdminRegistration,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Material => "material",
            Self::AdminRegistration => "admin_registration",
        }
    }

    /// 错误信息中使用的实体名称
    pub fn entity_name(&self) -> &'static str {
        match self {
            Self::Material => "Material",
            Self::AdminRegistration => "AdminRegistration",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_moderation_status_default_is_pending() {
        assert_eq!(ModerationStatus::default(), ModerationStatus::Pending);
    }

    #[test]
    fn test_moderation_status_serde_lowercase() {
        let json = serde_json::to_string(&ModerationStatus::Approved).unwrap();
        assert_eq!(json, "\"approved\"");

        let status: ModerationStatus = serde_json::from_str("\"rejected\"").unwrap();
        assert_eq!(status, ModerationStatus::Rejected);
    }

    #[test]
    fn test_moderation_status_from_str() {
        assert_eq!(
            "pending".parse::<ModerationStatus>().unwrap(),
            ModerationStatus::Pending
        );
        assert!("unknown".parse::<ModerationStatus>().is_err());
    }

    #[test]
    fn test_role_serde_keeps_pascal_case() {
        // 凭证中的角色字符串必须与历史数据保持一致
        let json = serde_json::to_string(&Role::SuperAdmin).unwrap();
        assert_eq!(json, "\"SuperAdmin\"");

        let role: Role = serde_json::from_str("\"Admin\"").unwrap();
        assert_eq!(role, Role::Admin);
    }

    #[test]
    fn test_role_from_str_is_case_sensitive() {
        assert_eq!("SuperAdmin".parse::<Role>().unwrap(), Role::SuperAdmin);
        assert!("superadmin".parse::<Role>().is_err());
    }

    #[test]
    fn test_entity_kind_as_str() {
        assert_eq!(EntityKind::Material.as_str(), "material");
        assert_eq!(
            EntityKind::AdminRegistration.as_str(),
            "admin_registration"
        );
    }
}
