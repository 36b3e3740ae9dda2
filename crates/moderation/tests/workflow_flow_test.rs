//! 审批工作流集成测试
//!
//! 使用内存仓储覆盖完整的提交 → 审批 → 重新提交 → 批量流转链路，
//! 以及权限与通知可见性约束。

use std::sync::Arc;

use uuid::Uuid;

use marketplace_moderation::repository::{MemoryMaterialRepository, MemoryNotificationRepository};
use marketplace_moderation::{
    Material, ModerationError, ModerationStatus, NotificationFanout, Principal, Role,
    TemplateEngine, WorkflowEngine,
};

struct TestHarness {
    engine: WorkflowEngine<Material, MemoryMaterialRepository, MemoryNotificationRepository>,
    materials: Arc<MemoryMaterialRepository>,
    notifications: Arc<MemoryNotificationRepository>,
    fanout: Arc<NotificationFanout<MemoryNotificationRepository>>,
}

fn harness() -> TestHarness {
    let materials = Arc::new(MemoryMaterialRepository::new());
    let notifications = Arc::new(MemoryNotificationRepository::new());
    let fanout = Arc::new(NotificationFanout::new(notifications.clone()));
    let engine = WorkflowEngine::new(
        materials.clone(),
        fanout.clone(),
        Arc::new(TemplateEngine::with_defaults()),
    );

    TestHarness {
        engine,
        materials,
        notifications,
        fanout,
    }
}

fn admin() -> Principal {
    Principal::new(Uuid::new_v4(), Role::Admin)
}

fn super_admin() -> Principal {
    Principal::new(Uuid::new_v4(), Role::SuperAdmin)
}

fn material_for(owner: &Principal, name: &str) -> Material {
    Material::new(
        name.to_string(),
        100,
        "kg".to_string(),
        3.5,
        Uuid::new_v4(),
        None,
        owner.id,
    )
}

#[tokio::test]
async fn test_submit_is_always_pending_and_notifies_super_admin() {
    let h = harness();
    let owner = admin();

    let mut material = material_for(&owner, "Flour");
    // 即使调用方伪造了状态，提交后也必须回到 pending
    material.status = ModerationStatus::Approved;

    let submitted = h.engine.submit(&owner, material).await.unwrap();
    assert_eq!(submitted.status, ModerationStatus::Pending);

    let all = h.notifications.all();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].for_role, Some(Role::SuperAdmin));
    assert_eq!(all[0].title, "New Material Awaiting Approval");
    assert_eq!(all[0].related_id, Some(submitted.id));
}

#[tokio::test]
async fn test_transition_notifies_owner_with_result() {
    let h = harness();
    let owner = admin();
    let reviewer = super_admin();

    let material = h
        .engine
        .submit(&owner, material_for(&owner, "Flour"))
        .await
        .unwrap();

    let approved = h
        .engine
        .transition(&reviewer, material.id, ModerationStatus::Approved)
        .await
        .unwrap();
    assert_eq!(approved.status, ModerationStatus::Approved);
    assert_eq!(approved.last_modified_by, Some(reviewer.id));

    let owner_notices: Vec<_> = h
        .notifications
        .all()
        .into_iter()
        .filter(|n| n.user_id == Some(owner.id))
        .collect();
    assert_eq!(owner_notices.len(), 1);
    assert!(owner_notices[0].message.contains("approved"));
    assert!(owner_notices[0].message.contains("Flour"));
}

#[tokio::test]
async fn test_noop_transition_adds_no_notification() {
    let h = harness();
    let owner = admin();
    let reviewer = super_admin();

    let material = h
        .engine
        .submit(&owner, material_for(&owner, "Flour"))
        .await
        .unwrap();
    h.engine
        .transition(&reviewer, material.id, ModerationStatus::Approved)
        .await
        .unwrap();

    let before = h.notifications.all().len();

    // 重复审批同一状态：成功返回但不产生新通知
    let unchanged = h
        .engine
        .transition(&reviewer, material.id, ModerationStatus::Approved)
        .await
        .unwrap();
    assert_eq!(unchanged.status, ModerationStatus::Approved);
    assert_eq!(h.notifications.all().len(), before);
}

#[tokio::test]
async fn test_transition_back_to_pending_notifies_nobody() {
    let h = harness();
    let owner = admin();
    let reviewer = super_admin();

    let material = h
        .engine
        .submit(&owner, material_for(&owner, "Flour"))
        .await
        .unwrap();
    h.engine
        .transition(&reviewer, material.id, ModerationStatus::Approved)
        .await
        .unwrap();

    let before = h.notifications.all().len();

    // SuperAdmin 将已通过的材料退回待审：状态变化但没有任何新通知
    let reverted = h
        .engine
        .transition(&reviewer, material.id, ModerationStatus::Pending)
        .await
        .unwrap();
    assert_eq!(reverted.status, ModerationStatus::Pending);
    assert_eq!(h.notifications.all().len(), before);

    let (owner_notices, _) = h.fanout.list_for(&owner, 20, 0).await.unwrap();
    assert_eq!(owner_notices.len(), 1, "所有者只保留审批通过那一条通知");
}

#[tokio::test]
async fn test_resubmit_resets_to_pending() {
    let h = harness();
    let owner = admin();
    let reviewer = super_admin();

    let material = h
        .engine
        .submit(&owner, material_for(&owner, "Flour"))
        .await
        .unwrap();
    h.engine
        .transition(&reviewer, material.id, ModerationStatus::Approved)
        .await
        .unwrap();

    let resubmitted = h
        .engine
        .resubmit(&owner, material.id, |m| m.quantity = 250)
        .await
        .unwrap();

    assert_eq!(resubmitted.status, ModerationStatus::Pending);
    assert_eq!(resubmitted.quantity, 250);

    // 提交与重新提交各产生一条 SuperAdmin 待审通知
    let pending_notices: Vec<_> = h
        .notifications
        .all()
        .into_iter()
        .filter(|n| n.for_role == Some(Role::SuperAdmin))
        .collect();
    assert_eq!(pending_notices.len(), 2);
}

#[tokio::test]
async fn test_non_super_admin_transition_has_zero_side_effects() {
    let h = harness();
    let owner = admin();

    let material = h
        .engine
        .submit(&owner, material_for(&owner, "Flour"))
        .await
        .unwrap();
    let before = h.notifications.all().len();

    let err = h
        .engine
        .transition(&owner, material.id, ModerationStatus::Approved)
        .await
        .unwrap_err();
    assert!(matches!(err, ModerationError::Forbidden { .. }));

    let loaded = marketplace_moderation::MaterialRepositoryTrait::get(&*h.materials, material.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(loaded.status, ModerationStatus::Pending);
    assert_eq!(h.notifications.all().len(), before);
}

#[tokio::test]
async fn test_resubmit_by_stranger_is_forbidden() {
    let h = harness();
    let owner = admin();
    let stranger = admin();

    let material = h
        .engine
        .submit(&owner, material_for(&owner, "Flour"))
        .await
        .unwrap();

    let err = h
        .engine
        .resubmit(&stranger, material.id, |m| m.quantity = 1)
        .await
        .unwrap_err();
    assert!(matches!(err, ModerationError::Forbidden { .. }));
}

#[tokio::test]
async fn test_bulk_transition_skips_missing_ids() {
    let h = harness();
    let owner = admin();
    let reviewer = super_admin();

    let m1 = h
        .engine
        .submit(&owner, material_for(&owner, "Flour"))
        .await
        .unwrap();
    let m2 = h
        .engine
        .submit(&owner, material_for(&owner, "Sugar"))
        .await
        .unwrap();

    let modified = h
        .engine
        .bulk_transition(
            &reviewer,
            &[m1.id, Uuid::new_v4(), m2.id],
            ModerationStatus::Approved,
        )
        .await
        .unwrap();

    assert_eq!(modified, 2);
}

#[tokio::test]
async fn test_bulk_transition_counts_only_changed() {
    let h = harness();
    let owner = admin();
    let reviewer = super_admin();

    let m1 = h
        .engine
        .submit(&owner, material_for(&owner, "Flour"))
        .await
        .unwrap();
    h.engine
        .transition(&reviewer, m1.id, ModerationStatus::Rejected)
        .await
        .unwrap();

    let before = h.notifications.all().len();

    // m1 已是 rejected，不计入也不再通知
    let modified = h
        .engine
        .bulk_transition(&reviewer, &[m1.id, Uuid::new_v4()], ModerationStatus::Rejected)
        .await
        .unwrap();

    assert_eq!(modified, 0);
    assert_eq!(h.notifications.all().len(), before);
}

#[tokio::test]
async fn test_notification_failure_does_not_roll_back_entity() {
    let h = harness();
    let owner = admin();
    let reviewer = super_admin();

    let material = h
        .engine
        .submit(&owner, material_for(&owner, "Flour"))
        .await
        .unwrap();

    h.notifications.set_fail_writes(true);

    let approved = h
        .engine
        .transition(&reviewer, material.id, ModerationStatus::Approved)
        .await
        .unwrap();
    assert_eq!(approved.status, ModerationStatus::Approved);

    h.notifications.set_fail_writes(false);
    let loaded = marketplace_moderation::MaterialRepositoryTrait::get(&*h.materials, material.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(loaded.status, ModerationStatus::Approved);
}

#[tokio::test]
async fn test_list_for_never_leaks_mismatched_notifications() {
    let h = harness();
    let owner = admin();
    let other = admin();
    let reviewer = super_admin();

    let material = h
        .engine
        .submit(&owner, material_for(&owner, "Flour"))
        .await
        .unwrap();
    h.engine
        .transition(&reviewer, material.id, ModerationStatus::Approved)
        .await
        .unwrap();

    let (owner_notices, owner_total) = h.fanout.list_for(&owner, 20, 0).await.unwrap();
    assert_eq!(owner_total, 1);
    assert!(owner_notices.iter().all(|n| n.is_addressed_to(&owner)));

    let (other_notices, other_total) = h.fanout.list_for(&other, 20, 0).await.unwrap();
    assert_eq!(other_total, 0);
    assert!(other_notices.is_empty());

    // SuperAdmin 看到的是按角色广播的待审通知
    let (reviewer_notices, reviewer_total) = h.fanout.list_for(&reviewer, 20, 0).await.unwrap();
    assert_eq!(reviewer_total, 1);
    assert_eq!(reviewer_notices[0].for_role, Some(Role::SuperAdmin));
}

#[tokio::test]
async fn test_full_material_lifecycle_scenario() {
    let h = harness();
    let owner = admin();
    let reviewer = super_admin();

    // 提交 → pending，SuperAdmin 收到待审通知
    let m1 = h
        .engine
        .submit(&owner, material_for(&owner, "Olive Oil"))
        .await
        .unwrap();
    assert_eq!(m1.status, ModerationStatus::Pending);
    let (reviewer_notices, _) = h.fanout.list_for(&reviewer, 20, 0).await.unwrap();
    assert_eq!(reviewer_notices.len(), 1);

    // 审批通过 → 所有者收到包含 "approved" 的通知
    h.engine
        .transition(&reviewer, m1.id, ModerationStatus::Approved)
        .await
        .unwrap();
    let (owner_notices, _) = h.fanout.list_for(&owner, 20, 0).await.unwrap();
    assert!(owner_notices[0].message.contains("approved"));

    // 所有者修改后重新提交 → 回到 pending，SuperAdmin 再收一条
    let resubmitted = h
        .engine
        .resubmit(&owner, m1.id, |m| m.unit_cost = 4.2)
        .await
        .unwrap();
    assert_eq!(resubmitted.status, ModerationStatus::Pending);
    let (reviewer_notices, _) = h.fanout.list_for(&reviewer, 20, 0).await.unwrap();
    assert_eq!(reviewer_notices.len(), 2);

    // 批量驳回 [m1, 不存在的 ID] → 只有 m1 计入
    let modified = h
        .engine
        .bulk_transition(&reviewer, &[m1.id, Uuid::new_v4()], ModerationStatus::Rejected)
        .await
        .unwrap();
    assert_eq!(modified, 1);

    let (owner_notices, _) = h.fanout.list_for(&owner, 20, 0).await.unwrap();
    assert!(owner_notices[0].message.contains("rejected"));

    // 标记已读幂等
    let notice_id = owner_notices[0].id;
    h.fanout.mark_read(&owner, notice_id).await.unwrap();
    h.fanout.mark_read(&owner, notice_id).await.unwrap();
    let (owner_notices, _) = h.fanout.list_for(&owner, 20, 0).await.unwrap();
    assert!(owner_notices.iter().find(|n| n.id == notice_id).unwrap().read);
}
