//! 材料模型
//!
//! 材料是典型的可审核实体：由店铺管理员提交，SuperAdmin 审批。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::enums::{EntityKind, ModerationStatus};
use crate::workflow::Moderatable;

/// 材料
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Material {
    pub id: Uuid,
    pub name: String,
    pub quantity: i64,
    pub unit: String,
    pub unit_cost: f64,
    pub store_id: Uuid,
    pub image_url: Option<String>,
    pub status: ModerationStatus,
    pub owner_id: Uuid,
    pub last_modified_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Material {
    /// 创建新材料（初始状态由工作流引擎设置）
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        name: String,
        quantity: i64,
        unit: String,
        unit_cost: f64,
        store_id: Uuid,
        image_url: Option<String>,
        owner_id: Uuid,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name,
            quantity,
            unit,
            unit_cost,
            store_id,
            image_url,
            status: ModerationStatus::Pending,
            owner_id,
            last_modified_by: None,
            created_at: now,
            updated_at: now,
        }
    }
}

impl Moderatable for Material {
    const KIND: EntityKind = EntityKind::Material;

    fn id(&self) -> Uuid {
        self.id
    }

    fn owner_id(&self) -> Uuid {
        self.owner_id
    }

    fn status(&self) -> ModerationStatus {
        self.status
    }

    fn set_status(&mut self, status: ModerationStatus) {
        self.status = status;
    }

    fn mark_modified(&mut self, actor_id: Uuid) {
        self.last_modified_by = Some(actor_id);
        self.updated_at = Utc::now();
    }

    fn display_name(&self) -> String {
        self.name.clone()
    }
}

/// 材料部分更新
///
/// 重新提交时只替换请求中出现的字段，未出现的字段保持原值。
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaterialPatch {
    pub name: Option<String>,
    pub quantity: Option<i64>,
    pub unit: Option<String>,
    pub unit_cost: Option<f64>,
    pub image_url: Option<String>,
}

impl MaterialPatch {
    /// 是否没有任何字段需要更新
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.quantity.is_none()
            && self.unit.is_none()
            && self.unit_cost.is_none()
            && self.image_url.is_none()
    }

    /// 将补丁应用到材料上
    pub fn apply(&self, material: &mut Material) {
        if let Some(name) = &self.name {
            material.name = name.clone();
        }
        if let Some(quantity) = self.quantity {
            material.quantity = quantity;
        }
        if let Some(unit) = &self.unit {
            material.unit = unit.clone();
        }
        if let Some(unit_cost) = self.unit_cost {
            material.unit_cost = unit_cost;
        }
        if let Some(image_url) = &self.image_url {
            material.image_url = Some(image_url.clone());
        }
    }
}
