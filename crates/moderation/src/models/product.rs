//! 商品模型
//!
//! 商品与店铺一样是普通的属主资源，不经过审核工作流。

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::store::slugify;

/// 商品
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    /// 由名称派生的唯一货号
    pub sku: String,
    pub price: f64,
    pub stock: i64,
    pub store_id: Uuid,
    pub owner_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 由商品名称派生 SKU
///
/// slug 化后转大写并追加 4 位随机后缀，降低同名商品的冲突概率。
/// 唯一性最终由数据库唯一索引保证。
pub fn sku_from_name(name: &str) -> String {
    const SUFFIX_CHARS: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";
    let mut rng = rand::rng();
    let suffix: String = (0..4)
        .map(|_| {
            let idx = rng.random_range(0..SUFFIX_CHARS.len());
            SUFFIX_CHARS[idx] as char
        })
        .collect();

    let base = slugify(name).replace('-', "_").to_uppercase();
    if base.is_empty() {
        format!("SKU_{}", suffix)
    } else {
        format!("{}_{}", base, suffix)
    }
}
