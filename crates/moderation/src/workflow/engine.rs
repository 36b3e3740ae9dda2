//! 审批工作流引擎
//!
//! 状态机：pending → approved / rejected，所有者重新提交回到 pending，
//! SuperAdmin 可在 approved 与 rejected 之间直接改判。没有终态。
//!
//! 实体写入与通知写入是两步 saga：先落库实体，再尽力而为地写通知；
//! 通知失败只记日志不回滚，实体未落库则绝不发通知。

use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::Arc;

use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use super::{Moderatable, ModerationStore};
use crate::error::{ModerationError, Result};
use crate::models::{ModerationStatus, NotificationTarget, Role};
use crate::notification::{NotificationFanout, TemplateEngine};
use crate::principal::{Capability, Principal};
use crate::repository::NotificationRepositoryTrait;

/// 审批工作流引擎
///
/// 对任意 [`Moderatable`] 实体提供 submit / resubmit / transition /
/// bulk_transition 四个操作。权限在任何写入发生前检查，
/// 检查失败时保证零副作用。
pub struct WorkflowEngine<E, S, N>
where
    E: Moderatable,
    S: ModerationStore<E>,
    N: NotificationRepositoryTrait,
{
    store: Arc<S>,
    fanout: Arc<NotificationFanout<N>>,
    templates: Arc<TemplateEngine>,
    _entity: PhantomData<fn() -> E>,
}

impl<E, S, N> WorkflowEngine<E, S, N>
where
    E: Moderatable,
    S: ModerationStore<E>,
    N: NotificationRepositoryTrait,
{
    pub fn new(
        store: Arc<S>,
        fanout: Arc<NotificationFanout<N>>,
        templates: Arc<TemplateEngine>,
    ) -> Self {
        Self {
            store,
            fanout,
            templates,
            _entity: PhantomData,
        }
    }

    /// 提交新实体进入审核
    ///
    /// 流程：
    /// 1. 校验提交能力与属主一致性
    /// 2. 强制初始状态为 pending，落库
    /// 3. 尽力而为地通知 SuperAdmin 有新的待审项
    #[instrument(skip(self, entity), fields(kind = %E::KIND))]
    pub async fn submit(&self, actor: &Principal, mut entity: E) -> Result<E> {
        actor.require(Capability::SubmitEntity)?;

        if entity.owner_id() != actor.id {
            return Err(ModerationError::Forbidden {
                operation: Capability::SubmitEntity.name().to_string(),
            });
        }

        entity.set_status(ModerationStatus::Pending);
        entity.mark_modified(actor.id);
        self.store.upsert(&entity).await?;

        info!(entity_id = %entity.id(), "实体已提交，进入待审核状态");

        self.notify_pending(&entity).await;

        Ok(entity)
    }

    /// 所有者重新提交
    ///
    /// 流程：
    /// 1. 加载实体，不存在返回 NotFound
    /// 2. 非所有者且非全局读写角色返回 Forbidden
    /// 3. 应用补丁，无条件重置为 pending（即使之前已通过）
    /// 4. 落库后尽力而为地通知 SuperAdmin 再次待审
    #[instrument(skip(self, apply), fields(kind = %E::KIND))]
    pub async fn resubmit<F>(&self, actor: &Principal, entity_id: Uuid, apply: F) -> Result<E>
    where
        F: FnOnce(&mut E) + Send,
    {
        actor.require(Capability::ResubmitOwn)?;

        let mut entity = self
            .store
            .get(entity_id)
            .await?
            .ok_or_else(|| ModerationError::not_found(E::KIND.entity_name(), entity_id))?;

        if entity.owner_id() != actor.id && !actor.role.can(Capability::ReadAllEntities) {
            return Err(ModerationError::Forbidden {
                operation: Capability::ResubmitOwn.name().to_string(),
            });
        }

        apply(&mut entity);
        entity.set_status(ModerationStatus::Pending);
        entity.mark_modified(actor.id);
        self.store.upsert(&entity).await?;

        info!(entity_id = %entity.id(), "实体已重新提交，状态重置为待审核");

        self.notify_pending(&entity).await;

        Ok(entity)
    }

    /// SuperAdmin 流转实体状态
    ///
    /// 流程：
    /// 1. 校验流转能力（非 SuperAdmin 返回 Forbidden，零副作用）
    /// 2. 加载实体，不存在返回 NotFound
    /// 3. 目标状态与当前一致：只落库修改人与时间戳，不发通知（幂等去噪）
    /// 4. 否则落库新状态，再尽力而为地通知实体所有者
    #[instrument(skip(self), fields(kind = %E::KIND))]
    pub async fn transition(
        &self,
        actor: &Principal,
        entity_id: Uuid,
        new_status: ModerationStatus,
    ) -> Result<E> {
        actor.require(Capability::TransitionStatus)?;

        let mut entity = self
            .store
            .get(entity_id)
            .await?
            .ok_or_else(|| ModerationError::not_found(E::KIND.entity_name(), entity_id))?;

        if entity.status() == new_status {
            entity.mark_modified(actor.id);
            self.store.upsert(&entity).await?;
            debug!(entity_id = %entity.id(), status = %new_status, "状态未变化，跳过通知");
            return Ok(entity);
        }

        entity.set_status(new_status);
        entity.mark_modified(actor.id);
        self.store.upsert(&entity).await?;

        info!(
            entity_id = %entity.id(),
            new_status = %new_status,
            actor_id = %actor.id,
            "实体状态已流转"
        );

        self.notify_owner(&entity, new_status).await;

        Ok(entity)
    }

    /// 批量流转状态
    ///
    /// 对每个 ID 应用单条流转语义；不存在的 ID 静默跳过，
    /// 单条失败不会中止整个批次。返回状态实际发生变化的条数。
    #[instrument(skip(self, entity_ids), fields(kind = %E::KIND, total = entity_ids.len()))]
    pub async fn bulk_transition(
        &self,
        actor: &Principal,
        entity_ids: &[Uuid],
        new_status: ModerationStatus,
    ) -> Result<u64> {
        actor.require(Capability::BulkTransition)?;

        let mut modified = 0u64;

        for &entity_id in entity_ids {
            let Some(mut entity) = self.store.get(entity_id).await? else {
                debug!(entity_id = %entity_id, "实体不存在，批量流转中跳过");
                continue;
            };

            if entity.status() == new_status {
                entity.mark_modified(actor.id);
                self.store.upsert(&entity).await?;
                continue;
            }

            entity.set_status(new_status);
            entity.mark_modified(actor.id);
            self.store.upsert(&entity).await?;
            modified += 1;

            self.notify_owner(&entity, new_status).await;
        }

        info!(
            total = entity_ids.len(),
            modified,
            new_status = %new_status,
            "批量流转完成"
        );

        Ok(modified)
    }

    /// 通知 SuperAdmin 有新的待审项
    async fn notify_pending(&self, entity: &E) {
        let mut vars = HashMap::new();
        vars.insert("name".to_string(), entity.display_name());
        vars.insert("owner".to_string(), entity.owner_id().to_string());

        self.send_notification(
            entity,
            ModerationStatus::Pending,
            NotificationTarget::Role(Role::SuperAdmin),
            vars,
        )
        .await;
    }

    /// 通知所有者审核结果
    ///
    /// 只在得出审核结论（approved / rejected）时通知；
    /// 退回待审不产生所有者通知，待审通告只面向 SuperAdmin。
    async fn notify_owner(&self, entity: &E, status: ModerationStatus) {
        if status == ModerationStatus::Pending {
            debug!(entity_id = %entity.id(), "退回待审核，不通知所有者");
            return;
        }

        let mut vars = HashMap::new();
        vars.insert("name".to_string(), entity.display_name());

        self.send_notification(
            entity,
            status,
            NotificationTarget::User(entity.owner_id()),
            vars,
        )
        .await;
    }

    /// 尽力而为地写入通知
    ///
    /// 调用前实体写入必须已提交；通知失败只记日志，不回滚实体。
    async fn send_notification(
        &self,
        entity: &E,
        status: ModerationStatus,
        target: NotificationTarget,
        vars: HashMap<String, String>,
    ) {
        let Some((title, message)) = self.templates.render_notification(E::KIND, status, &vars)
        else {
            warn!(kind = %E::KIND, status = %status, "缺少通知模板，跳过通知");
            return;
        };

        if let Err(e) = self
            .fanout
            .notify(target, title, message, E::KIND.as_str(), Some(entity.id()))
            .await
        {
            warn!(
                entity_id = %entity.id(),
                error = %e,
                "通知写入失败，实体变更已提交，不回滚"
            );
        }
    }
}
