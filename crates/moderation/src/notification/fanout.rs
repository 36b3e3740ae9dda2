//! 通知扇出服务
//!
//! 负责写入通知记录、按主体读取通知列表，以及标记已读。
//! 写入即完成——没有投递环节，接收方通过轮询拉取。

use std::sync::Arc;

use tracing::{info, instrument};
use uuid::Uuid;

use crate::error::{ModerationError, Result};
use crate::models::{Notification, NotificationTarget};
use crate::principal::Principal;
use crate::repository::NotificationRepositoryTrait;

/// 通知扇出服务
pub struct NotificationFanout<R: NotificationRepositoryTrait> {
    repo: Arc<R>,
}

impl<R: NotificationRepositoryTrait> NotificationFanout<R> {
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    /// 写入一条未读通知
    ///
    /// 目标在类型层面保证了角色与用户二选一；写入失败（数据库不可用）
    /// 向上传播，由调用方决定是否容忍。
    #[instrument(skip(self, title, message))]
    pub async fn notify(
        &self,
        target: NotificationTarget,
        title: impl Into<String> + Send,
        message: impl Into<String> + Send,
        kind: &str,
        related_id: Option<Uuid>,
    ) -> Result<Notification> {
        let notification = Notification::new(target, title, message, kind, related_id);
        self.repo.append(&notification).await?;

        info!(
            notification_id = %notification.id,
            kind = %notification.kind,
            "通知已写入"
        );

        Ok(notification)
    }

    /// 读取面向主体的通知
    ///
    /// 返回角色匹配或用户 ID 匹配的通知，按创建时间降序。
    /// 纯查询，服务端不保留游标状态。
    pub async fn list_for(
        &self,
        principal: &Principal,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<Notification>, i64)> {
        let total = self.repo.count_for(principal.role, principal.id).await?;
        if total == 0 {
            return Ok((Vec::new(), 0));
        }

        let items = self
            .repo
            .list_for(principal.role, principal.id, limit, offset)
            .await?;

        Ok((items, total))
    }

    /// 标记通知已读
    ///
    /// 幂等：重复调用保持 read=true。只有通知的接收方可以标记。
    #[instrument(skip(self))]
    pub async fn mark_read(&self, principal: &Principal, notification_id: Uuid) -> Result<()> {
        let notification = self
            .repo
            .get(notification_id)
            .await?
            .ok_or_else(|| ModerationError::not_found("Notification", notification_id))?;

        if !notification.is_addressed_to(principal) {
            return Err(ModerationError::Forbidden {
                operation: "notification:mark-read".to_string(),
            });
        }

        self.repo.mark_read(notification_id).await
    }
}
