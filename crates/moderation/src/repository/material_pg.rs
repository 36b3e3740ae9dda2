//! 物料 Postgres 仓储

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::traits::{MaterialFilter, MaterialRepositoryTrait};
use crate::error::Result;
use crate::models::{Material, ModerationStatus};
use crate::workflow::ModerationStore;

/// 物料仓储 Postgres 实现
#[derive(Clone)]
pub struct PgMaterialRepository {
    pool: PgPool,
}

impl PgMaterialRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// 拼接动态 WHERE 子句
    ///
    /// 返回 SQL 片段；绑定顺序必须与这里的编号顺序一致。
    fn build_where_clause(filter: &MaterialFilter) -> (String, usize) {
        let mut conditions = Vec::new();
        let mut bind_index = 1;

        if filter.store_id.is_some() {
            conditions.push(format!("store_id = ${}", bind_index));
            bind_index += 1;
        }
        if filter.owner_id.is_some() {
            conditions.push(format!("owner_id = ${}", bind_index));
            bind_index += 1;
        }
        if filter.status.is_some() {
            conditions.push(format!("status = ${}", bind_index));
            bind_index += 1;
        }
        if filter.keyword.is_some() {
            conditions.push(format!("name ILIKE ${}", bind_index));
            bind_index += 1;
        }

        let clause = if conditions.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", conditions.join(" AND "))
        };

        (clause, bind_index)
    }
}

#[async_trait]
impl MaterialRepositoryTrait for PgMaterialRepository {
    async fn get(&self, id: Uuid) -> Result<Option<Material>> {
        let material = sqlx::query_as::<_, Material>(
            r#"
            SELECT id, name, quantity, unit, unit_cost, store_id, image_url,
                   status, owner_id, last_modified_by, created_at, updated_at
            FROM materials
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(material)
    }

    async fn upsert(&self, material: &Material) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO materials (
                id, name, quantity, unit, unit_cost, store_id, image_url,
                status, owner_id, last_modified_by, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            ON CONFLICT (id) DO UPDATE SET
                name = EXCLUDED.name,
                quantity = EXCLUDED.quantity,
                unit = EXCLUDED.unit,
                unit_cost = EXCLUDED.unit_cost,
                store_id = EXCLUDED.store_id,
                image_url = EXCLUDED.image_url,
                status = EXCLUDED.status,
                last_modified_by = EXCLUDED.last_modified_by,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(material.id)
        .bind(&material.name)
        .bind(material.quantity)
        .bind(&material.unit)
        .bind(material.unit_cost)
        .bind(material.store_id)
        .bind(&material.image_url)
        .bind(material.status)
        .bind(material.owner_id)
        .bind(material.last_modified_by)
        .bind(material.created_at)
        .bind(material.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM materials WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn list(
        &self,
        filter: &MaterialFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Material>> {
        let (where_clause, bind_index) = Self::build_where_clause(filter);

        let sql = format!(
            r#"
            SELECT id, name, quantity, unit, unit_cost, store_id, image_url,
                   status, owner_id, last_modified_by, created_at, updated_at
            FROM materials{}
            ORDER BY created_at DESC
            LIMIT ${} OFFSET ${}
            "#,
            where_clause,
            bind_index,
            bind_index + 1
        );

        let mut query = sqlx::query_as::<_, Material>(&sql);

        if let Some(store_id) = filter.store_id {
            query = query.bind(store_id);
        }
        if let Some(owner_id) = filter.owner_id {
            query = query.bind(owner_id);
        }
        if let Some(status) = filter.status {
            query = query.bind(status);
        }
        if let Some(ref keyword) = filter.keyword {
            query = query.bind(format!("%{}%", keyword));
        }

        let materials = query.bind(limit).bind(offset).fetch_all(&self.pool).await?;

        Ok(materials)
    }

    async fn count(&self, filter: &MaterialFilter) -> Result<i64> {
        let (where_clause, _) = Self::build_where_clause(filter);

        let sql = format!("SELECT COUNT(*) FROM materials{}", where_clause);

        let mut query = sqlx::query_scalar::<_, i64>(&sql);

        if let Some(store_id) = filter.store_id {
            query = query.bind(store_id);
        }
        if let Some(owner_id) = filter.owner_id {
            query = query.bind(owner_id);
        }
        if let Some(status) = filter.status {
            query = query.bind(status);
        }
        if let Some(ref keyword) = filter.keyword {
            query = query.bind(format!("%{}%", keyword));
        }

        let total = query.fetch_one(&self.pool).await?;

        Ok(total)
    }

    async fn count_by_status(&self) -> Result<Vec<(ModerationStatus, i64)>> {
        let rows = sqlx::query_as::<_, (ModerationStatus, i64)>(
            "SELECT status, COUNT(*) FROM materials GROUP BY status",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}

#[async_trait]
impl ModerationStore<Material> for PgMaterialRepository {
    async fn get(&self, id: Uuid) -> Result<Option<Material>> {
        MaterialRepositoryTrait::get(self, id).await
    }

    async fn upsert(&self, material: &Material) -> Result<()> {
        MaterialRepositoryTrait::upsert(self, material).await
    }
}
