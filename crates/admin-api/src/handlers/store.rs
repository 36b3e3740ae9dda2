//! 店铺管理的 HTTP 处理器
//!
//! 店铺是材料与商品的归属单位，不走审核流程。
//! 管理员只能操作自己的店铺，SuperAdmin 可见全部。

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};
use chrono::Utc;
use marketplace_moderation::models::slugify;
use marketplace_moderation::{Capability, Store};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::auth::Claims;
use crate::dto::{ApiResponse, DeletedResponse, PageResponse, PaginationParams};
use crate::error::{AdminError, Result};
use crate::state::AppState;

/// 创建店铺请求
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateStoreRequest {
    #[validate(length(min = 1, max = 100, message = "店铺名长度必须在 1-100 之间"))]
    pub name: String,
    #[validate(length(max = 500, message = "描述不能超过 500 字符"))]
    pub description: Option<String>,
}

/// 更新店铺请求
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStoreRequest {
    #[validate(length(min = 1, max = 100, message = "店铺名长度必须在 1-100 之间"))]
    pub name: Option<String>,
    #[validate(length(max = 500, message = "描述不能超过 500 字符"))]
    pub description: Option<String>,
}

/// 创建店铺
///
/// POST /api/admin/stores
pub async fn create_store(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CreateStoreRequest>,
) -> Result<Json<ApiResponse<Store>>> {
    req.validate()?;
    let principal = claims.principal()?;

    let slug = unique_slug(&state, &req.name).await?;
    let now = Utc::now();
    let store = Store {
        id: Uuid::new_v4(),
        name: req.name,
        slug,
        description: req.description,
        owner_id: principal.id,
        created_at: now,
        updated_at: now,
    };

    sqlx::query(
        r#"
        INSERT INTO stores (id, name, slug, description, owner_id, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        "#,
    )
    .bind(store.id)
    .bind(&store.name)
    .bind(&store.slug)
    .bind(&store.description)
    .bind(store.owner_id)
    .bind(store.created_at)
    .bind(store.updated_at)
    .execute(&state.pool)
    .await?;

    info!(store_id = %store.id, slug = %store.slug, "店铺已创建");

    Ok(Json(ApiResponse::success(store)))
}

/// 店铺列表
///
/// GET /api/admin/stores
pub async fn list_stores(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Query(pagination): Query<PaginationParams>,
) -> Result<Json<ApiResponse<PageResponse<Store>>>> {
    let principal = claims.principal()?;
    let owner_filter = if principal.role.can(Capability::ReadAllEntities) {
        None
    } else {
        Some(principal.id)
    };

    let total: i64 = match owner_filter {
        Some(owner_id) => {
            sqlx::query_scalar("SELECT COUNT(*) FROM stores WHERE owner_id = $1")
                .bind(owner_id)
                .fetch_one(&state.pool)
                .await?
        }
        None => {
            sqlx::query_scalar("SELECT COUNT(*) FROM stores")
                .fetch_one(&state.pool)
                .await?
        }
    };

    if total == 0 {
        return Ok(Json(ApiResponse::success(PageResponse::empty(
            pagination.page,
            pagination.limit(),
        ))));
    }

    let stores: Vec<Store> = match owner_filter {
        Some(owner_id) => {
            sqlx::query_as(
                r#"
                SELECT id, name, slug, description, owner_id, created_at, updated_at
                FROM stores
                WHERE owner_id = $1
                ORDER BY created_at DESC
                LIMIT $2 OFFSET $3
                "#,
            )
            .bind(owner_id)
            .bind(pagination.limit())
            .bind(pagination.offset())
            .fetch_all(&state.pool)
            .await?
        }
        None => {
            sqlx::query_as(
                r#"
                SELECT id, name, slug, description, owner_id, created_at, updated_at
                FROM stores
                ORDER BY created_at DESC
                LIMIT $1 OFFSET $2
                "#,
            )
            .bind(pagination.limit())
            .bind(pagination.offset())
            .fetch_all(&state.pool)
            .await?
        }
    };

    Ok(Json(ApiResponse::success(PageResponse::new(
        stores,
        total,
        pagination.page,
        pagination.limit(),
    ))))
}

/// 获取单个店铺
///
/// GET /api/admin/stores/{id}
pub async fn get_store(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Store>>> {
    let principal = claims.principal()?;
    let store = fetch_store(&state, id).await?;

    if store.owner_id != principal.id && !principal.role.can(Capability::ReadAllEntities) {
        return Err(AdminError::Forbidden("resource:manage-own".to_string()));
    }

    Ok(Json(ApiResponse::success(store)))
}

/// 更新店铺
///
/// PUT /api/admin/stores/{id}
///
/// slug 创建后保持稳定，改名不会重新生成。
pub async fn update_store(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateStoreRequest>,
) -> Result<Json<ApiResponse<Store>>> {
    req.validate()?;
    let principal = claims.principal()?;
    let mut store = fetch_store(&state, id).await?;

    if store.owner_id != principal.id && !principal.role.can(Capability::ReadAllEntities) {
        return Err(AdminError::Forbidden("resource:manage-own".to_string()));
    }

    if let Some(name) = req.name {
        store.name = name;
    }
    if let Some(description) = req.description {
        store.description = Some(description);
    }
    store.updated_at = Utc::now();

    sqlx::query(
        r#"
        UPDATE stores
        SET name = $1, description = $2, updated_at = $3
        WHERE id = $4
        "#,
    )
    .bind(&store.name)
    .bind(&store.description)
    .bind(store.updated_at)
    .bind(store.id)
    .execute(&state.pool)
    .await?;

    Ok(Json(ApiResponse::success(store)))
}

/// 删除店铺
///
/// DELETE /api/admin/stores/{id}
pub async fn delete_store(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<DeletedResponse>>> {
    let principal = claims.principal()?;
    let store = fetch_store(&state, id).await?;

    if store.owner_id != principal.id && !principal.role.can(Capability::ReadAllEntities) {
        return Err(AdminError::Forbidden("resource:manage-own".to_string()));
    }

    sqlx::query("DELETE FROM stores WHERE id = $1")
        .bind(id)
        .execute(&state.pool)
        .await?;

    info!(store_id = %id, "店铺已删除");

    Ok(Json(ApiResponse::success(DeletedResponse::success())))
}

// ============================================
// 内部辅助
// ============================================

async fn fetch_store(state: &AppState, id: Uuid) -> Result<Store> {
    sqlx::query_as(
        r#"
        SELECT id, name, slug, description, owner_id, created_at, updated_at
        FROM stores
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(&state.pool)
    .await?
    .ok_or_else(|| AdminError::NotFound(format!("Store {}", id)))
}

/// 生成不冲突的 slug
///
/// 基础 slug 被占用时追加递增序号，尝试次数封顶防止死循环。
async fn unique_slug(state: &AppState, name: &str) -> Result<String> {
    let base = slugify(name);
    if base.is_empty() {
        return Err(AdminError::Validation(
            "店铺名无法生成有效的 slug".to_string(),
        ));
    }

    for attempt in 0..10 {
        let candidate = if attempt == 0 {
            base.clone()
        } else {
            format!("{}-{}", base, attempt + 1)
        };

        let taken: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM stores WHERE slug = $1")
            .bind(&candidate)
            .fetch_optional(&state.pool)
            .await?;

        if taken.is_none() {
            return Ok(candidate);
        }
    }

    Err(AdminError::DuplicateName(base))
}
