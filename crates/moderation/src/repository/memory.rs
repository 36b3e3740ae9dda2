//! 内存仓储
//!
//! DashMap 实现的仓储，供集成测试与本地演示使用，
//! 语义与 Postgres 实现保持一致。

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;
use uuid::Uuid;

use super::traits::{MaterialFilter, MaterialRepositoryTrait, NotificationRepositoryTrait};
use crate::error::{ModerationError, Result};
use crate::models::{Material, ModerationStatus, Notification, Role};
use crate::workflow::ModerationStore;

/// 物料内存仓储
#[derive(Default)]
pub struct MemoryMaterialRepository {
    materials: DashMap<Uuid, Material>,
}

impl MemoryMaterialRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn matches(material: &Material, filter: &MaterialFilter) -> bool {
        if let Some(store_id) = filter.store_id {
            if material.store_id != store_id {
                return false;
            }
        }
        if let Some(owner_id) = filter.owner_id {
            if material.owner_id != owner_id {
                return false;
            }
        }
        if let Some(status) = filter.status {
            if material.status != status {
                return false;
            }
        }
        if let Some(ref keyword) = filter.keyword {
            if !material
                .name
                .to_lowercase()
                .contains(&keyword.to_lowercase())
            {
                return false;
            }
        }
        true
    }
}

#[async_trait]
impl MaterialRepositoryTrait for MemoryMaterialRepository {
    async fn get(&self, id: Uuid) -> Result<Option<Material>> {
        Ok(self.materials.get(&id).map(|entry| entry.clone()))
    }

    async fn upsert(&self, material: &Material) -> Result<()> {
        self.materials.insert(material.id, material.clone());
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        Ok(self.materials.remove(&id).is_some())
    }

    async fn list(
        &self,
        filter: &MaterialFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Material>> {
        let mut materials: Vec<Material> = self
            .materials
            .iter()
            .filter(|entry| Self::matches(entry.value(), filter))
            .map(|entry| entry.clone())
            .collect();

        materials.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        Ok(materials
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect())
    }

    async fn count(&self, filter: &MaterialFilter) -> Result<i64> {
        let total = self
            .materials
            .iter()
            .filter(|entry| Self::matches(entry.value(), filter))
            .count();
        Ok(total as i64)
    }

    async fn count_by_status(&self) -> Result<Vec<(ModerationStatus, i64)>> {
        let mut counts = std::collections::HashMap::new();
        for entry in self.materials.iter() {
            *counts.entry(entry.status).or_insert(0i64) += 1;
        }
        Ok(counts.into_iter().collect())
    }
}

#[async_trait]
impl ModerationStore<Material> for MemoryMaterialRepository {
    async fn get(&self, id: Uuid) -> Result<Option<Material>> {
        MaterialRepositoryTrait::get(self, id).await
    }

    async fn upsert(&self, material: &Material) -> Result<()> {
        MaterialRepositoryTrait::upsert(self, material).await
    }
}

/// 通知内存仓储
///
/// `fail_writes` 打开后 append 返回错误，用于验证通知写入失败
/// 不影响已提交的实体变更。
#[derive(Default)]
pub struct MemoryNotificationRepository {
    notifications: DashMap<Uuid, Notification>,
    fail_writes: AtomicBool,
}

impl MemoryNotificationRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// 控制后续 append 是否失败
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// 按创建时间降序返回全部通知
    pub fn all(&self) -> Vec<Notification> {
        let mut notifications: Vec<Notification> = self
            .notifications
            .iter()
            .map(|entry| entry.clone())
            .collect();
        notifications.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        notifications
    }
}

#[async_trait]
impl NotificationRepositoryTrait for MemoryNotificationRepository {
    async fn append(&self, notification: &Notification) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(ModerationError::Internal(
                "通知存储写入失败（注入）".to_string(),
            ));
        }
        self.notifications
            .insert(notification.id, notification.clone());
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<Notification>> {
        Ok(self.notifications.get(&id).map(|entry| entry.clone()))
    }

    async fn list_for(
        &self,
        role: Role,
        user_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Notification>> {
        let mut notifications: Vec<Notification> = self
            .notifications
            .iter()
            .filter(|entry| entry.for_role == Some(role) || entry.user_id == Some(user_id))
            .map(|entry| entry.clone())
            .collect();

        notifications.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        Ok(notifications
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect())
    }

    async fn count_for(&self, role: Role, user_id: Uuid) -> Result<i64> {
        let total = self
            .notifications
            .iter()
            .filter(|entry| entry.for_role == Some(role) || entry.user_id == Some(user_id))
            .count();
        Ok(total as i64)
    }

    async fn mark_read(&self, id: Uuid) -> Result<()> {
        if let Some(mut entry) = self.notifications.get_mut(&id) {
            entry.read = true;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_material(name: &str, owner_id: Uuid) -> Material {
        Material::new(
            name.to_string(),
            10,
            "kg".to_string(),
            2.5,
            Uuid::new_v4(),
            None,
            owner_id,
        )
    }

    #[tokio::test]
    async fn test_material_upsert_and_get() {
        let repo = MemoryMaterialRepository::new();
        let material = sample_material("Flour", Uuid::new_v4());

        MaterialRepositoryTrait::upsert(&repo, &material).await.unwrap();
        let loaded = MaterialRepositoryTrait::get(&repo, material.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(loaded.name, "Flour");
    }

    #[tokio::test]
    async fn test_material_filter_by_status_and_keyword() {
        let repo = MemoryMaterialRepository::new();
        let owner = Uuid::new_v4();

        let mut approved = sample_material("Brown Sugar", owner);
        approved.status = ModerationStatus::Approved;
        MaterialRepositoryTrait::upsert(&repo, &approved).await.unwrap();

        let pending = sample_material("White Sugar", owner);
        MaterialRepositoryTrait::upsert(&repo, &pending).await.unwrap();

        let filter = MaterialFilter {
            status: Some(ModerationStatus::Approved),
            keyword: Some("sugar".to_string()),
            ..Default::default()
        };

        let materials = repo.list(&filter, 20, 0).await.unwrap();
        assert_eq!(materials.len(), 1);
        assert_eq!(materials[0].name, "Brown Sugar");
        assert_eq!(repo.count(&filter).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_notification_list_for_matches_role_or_user() {
        let repo = MemoryNotificationRepository::new();
        let user_id = Uuid::new_v4();

        let for_role = Notification::new(
            crate::models::NotificationTarget::Role(Role::SuperAdmin),
            "t1",
            "m1",
            "material",
            None,
        );
        let for_user = Notification::new(
            crate::models::NotificationTarget::User(user_id),
            "t2",
            "m2",
            "material",
            None,
        );
        let for_other = Notification::new(
            crate::models::NotificationTarget::User(Uuid::new_v4()),
            "t3",
            "m3",
            "material",
            None,
        );

        repo.append(&for_role).await.unwrap();
        repo.append(&for_user).await.unwrap();
        repo.append(&for_other).await.unwrap();

        let visible = repo.list_for(Role::Admin, user_id, 20, 0).await.unwrap();
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].title, "t2");

        let super_visible = repo
            .list_for(Role::SuperAdmin, Uuid::new_v4(), 20, 0)
            .await
            .unwrap();
        assert_eq!(super_visible.len(), 1);
        assert_eq!(super_visible[0].title, "t1");
    }

    #[tokio::test]
    async fn test_notification_mark_read_idempotent() {
        let repo = MemoryNotificationRepository::new();
        let notification = Notification::new(
            crate::models::NotificationTarget::Role(Role::SuperAdmin),
            "t",
            "m",
            "material",
            None,
        );
        repo.append(&notification).await.unwrap();

        repo.mark_read(notification.id).await.unwrap();
        repo.mark_read(notification.id).await.unwrap();

        let loaded = repo.get(notification.id).await.unwrap().unwrap();
        assert!(loaded.read);
    }

    #[tokio::test]
    async fn test_notification_fail_injection() {
        let repo = MemoryNotificationRepository::new();
        repo.set_fail_writes(true);

        let notification = Notification::new(
            crate::models::NotificationTarget::Role(Role::SuperAdmin),
            "t",
            "m",
            "material",
            None,
        );

        assert!(repo.append(&notification).await.is_err());
        assert!(repo.all().is_empty());
    }
}
