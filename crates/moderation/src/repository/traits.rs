//! 仓储接口定义

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::Result;
use crate::models::{Material, ModerationStatus, Notification, Role};

/// 物料列表查询条件
///
/// 所有条件为可选，组合生效。keyword 对名称做模糊匹配。
#[derive(Debug, Clone, Default)]
pub struct MaterialFilter {
    pub store_id: Option<Uuid>,
    pub owner_id: Option<Uuid>,
    pub status: Option<ModerationStatus>,
    pub keyword: Option<String>,
}

/// 物料仓储接口
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MaterialRepositoryTrait: Send + Sync {
    /// 按 ID 读取物料
    async fn get(&self, id: Uuid) -> Result<Option<Material>>;

    /// 插入或整行更新物料
    async fn upsert(&self, material: &Material) -> Result<()>;

    /// 删除物料，返回是否实际删除
    async fn delete(&self, id: Uuid) -> Result<bool>;

    /// 按条件分页查询
    async fn list(
        &self,
        filter: &MaterialFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Material>>;

    /// 按条件统计总数
    async fn count(&self, filter: &MaterialFilter) -> Result<i64>;

    /// 按状态分组统计
    async fn count_by_status(&self) -> Result<Vec<(ModerationStatus, i64)>>;
}

/// 通知仓储接口
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NotificationRepositoryTrait: Send + Sync {
    /// 追加一条通知
    async fn append(&self, notification: &Notification) -> Result<()>;

    /// 按 ID 读取通知
    async fn get(&self, id: Uuid) -> Result<Option<Notification>>;

    /// 查询面向指定角色或用户的通知，按创建时间降序
    async fn list_for(
        &self,
        role: Role,
        user_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Notification>>;

    /// 统计面向指定角色或用户的通知总数
    async fn count_for(&self, role: Role, user_id: Uuid) -> Result<i64>;

    /// 标记已读，幂等
    async fn mark_read(&self, id: Uuid) -> Result<()>;
}
