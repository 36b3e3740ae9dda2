//! 通知 Postgres 仓储

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::traits::NotificationRepositoryTrait;
use crate::error::Result;
use crate::models::{Notification, Role};

/// 通知仓储 Postgres 实现
#[derive(Clone)]
pub struct PgNotificationRepository {
    pool: PgPool,
}

impl PgNotificationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl NotificationRepositoryTrait for PgNotificationRepository {
    async fn append(&self, notification: &Notification) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO notifications (
                id, title, message, kind, related_id, for_role, user_id, read, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(notification.id)
        .bind(&notification.title)
        .bind(&notification.message)
        .bind(&notification.kind)
        .bind(notification.related_id)
        .bind(notification.for_role)
        .bind(notification.user_id)
        .bind(notification.read)
        .bind(notification.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<Notification>> {
        let notification = sqlx::query_as::<_, Notification>(
            r#"
            SELECT id, title, message, kind, related_id, for_role, user_id, read, created_at
            FROM notifications
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(notification)
    }

    async fn list_for(
        &self,
        role: Role,
        user_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Notification>> {
        let notifications = sqlx::query_as::<_, Notification>(
            r#"
            SELECT id, title, message, kind, related_id, for_role, user_id, read, created_at
            FROM notifications
            WHERE for_role = $1 OR user_id = $2
            ORDER BY created_at DESC
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(role)
        .bind(user_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(notifications)
    }

    async fn count_for(&self, role: Role, user_id: Uuid) -> Result<i64> {
        let total = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM notifications WHERE for_role = $1 OR user_id = $2",
        )
        .bind(role)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(total)
    }

    async fn mark_read(&self, id: Uuid) -> Result<()> {
        // 重复标记已读不报错，UPDATE 本身幂等
        sqlx::query("UPDATE notifications SET read = TRUE WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
