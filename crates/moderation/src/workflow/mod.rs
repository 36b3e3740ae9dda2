//! 审批工作流
//!
//! 定义可审核实体契约与状态机引擎。

mod engine;

pub use engine::WorkflowEngine;

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::Result;
use crate::models::{EntityKind, ModerationStatus};

/// 可审核实体契约
///
/// 任何经过 pending / approved / rejected 审核的实体都实现此 trait，
/// 工作流引擎据此对不同实体类型做统一的状态流转。
pub trait Moderatable: Clone + Send + Sync + 'static {
    /// 实体类型标签，用作通知模板表的键
    const KIND: EntityKind;

    fn id(&self) -> Uuid;

    /// 创建者；只有创建者（或 SuperAdmin）可以重新提交
    fn owner_id(&self) -> Uuid;

    fn status(&self) -> ModerationStatus;

    fn set_status(&mut self, status: ModerationStatus);

    /// 记录最后修改人并刷新修改时间
    fn mark_modified(&mut self, actor_id: Uuid);

    /// 通知文案中使用的展示名称
    fn display_name(&self) -> String;
}

/// 工作流引擎依赖的实体存储接口
///
/// 存储层只需提供按 ID 读取与整行写入；实现可以是 Postgres 仓储
/// 或测试用的内存仓储。单条写入由存储层保证原子，
/// 实体写入与通知写入之间没有跨表事务。
#[async_trait]
pub trait ModerationStore<E: Moderatable>: Send + Sync {
    async fn get(&self, id: Uuid) -> Result<Option<E>>;

    async fn upsert(&self, entity: &E) -> Result<()>;
}
