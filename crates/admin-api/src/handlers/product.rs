//! 商品管理的 HTTP 处理器
//!
//! 商品隶属于店铺，SKU 在创建时根据名称生成并保证唯一。

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};
use chrono::Utc;
use marketplace_moderation::models::sku_from_name;
use marketplace_moderation::{Capability, Product};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::auth::Claims;
use crate::dto::{ApiResponse, DeletedResponse, PageResponse, PaginationParams};
use crate::error::{AdminError, Result};
use crate::state::AppState;

/// 创建商品请求
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductRequest {
    #[validate(length(min = 1, max = 100, message = "商品名长度必须在 1-100 之间"))]
    pub name: String,
    #[validate(range(min = 0.0, message = "价格不能为负数"))]
    pub price: f64,
    #[validate(range(min = 0, message = "库存不能为负数"))]
    pub stock: i64,
    pub store_id: Uuid,
}

/// 更新商品请求
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProductRequest {
    #[validate(length(min = 1, max = 100, message = "商品名长度必须在 1-100 之间"))]
    pub name: Option<String>,
    #[validate(range(min = 0.0, message = "价格不能为负数"))]
    pub price: Option<f64>,
    #[validate(range(min = 0, message = "库存不能为负数"))]
    pub stock: Option<i64>,
}

/// 商品列表查询参数
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListProductsQuery {
    #[serde(flatten)]
    pub pagination: PaginationParams,
    pub store_id: Option<Uuid>,
}

/// 创建商品
///
/// POST /api/admin/products
pub async fn create_product(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CreateProductRequest>,
) -> Result<Json<ApiResponse<Product>>> {
    req.validate()?;
    let principal = claims.principal()?;

    // 店铺必须存在且归属当前用户
    let store_owner: Option<(Uuid,)> =
        sqlx::query_as("SELECT owner_id FROM stores WHERE id = $1")
            .bind(req.store_id)
            .fetch_optional(&state.pool)
            .await?;
    let (store_owner,) =
        store_owner.ok_or_else(|| AdminError::NotFound(format!("Store {}", req.store_id)))?;
    if store_owner != principal.id && !principal.role.can(Capability::ReadAllEntities) {
        return Err(AdminError::Forbidden("resource:manage-own".to_string()));
    }

    let sku = unique_sku(&state, &req.name).await?;
    let now = Utc::now();
    let product = Product {
        id: Uuid::new_v4(),
        name: req.name,
        sku,
        price: req.price,
        stock: req.stock,
        store_id: req.store_id,
        owner_id: principal.id,
        created_at: now,
        updated_at: now,
    };

    sqlx::query(
        r#"
        INSERT INTO products (id, name, sku, price, stock, store_id, owner_id, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        "#,
    )
    .bind(product.id)
    .bind(&product.name)
    .bind(&product.sku)
    .bind(product.price)
    .bind(product.stock)
    .bind(product.store_id)
    .bind(product.owner_id)
    .bind(product.created_at)
    .bind(product.updated_at)
    .execute(&state.pool)
    .await?;

    info!(product_id = %product.id, sku = %product.sku, "商品已创建");

    Ok(Json(ApiResponse::success(product)))
}

/// 商品列表
///
/// GET /api/admin/products
pub async fn list_products(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Query(query): Query<ListProductsQuery>,
) -> Result<Json<ApiResponse<PageResponse<Product>>>> {
    let principal = claims.principal()?;
    let owner_filter = if principal.role.can(Capability::ReadAllEntities) {
        None
    } else {
        Some(principal.id)
    };

    // 动态拼接查询条件，绑定顺序与编号一致
    let mut conditions = Vec::new();
    let mut bind_index = 1;
    if owner_filter.is_some() {
        conditions.push(format!("owner_id = ${}", bind_index));
        bind_index += 1;
    }
    if query.store_id.is_some() {
        conditions.push(format!("store_id = ${}", bind_index));
        bind_index += 1;
    }
    let where_clause = if conditions.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", conditions.join(" AND "))
    };

    let count_sql = format!("SELECT COUNT(*) FROM products{}", where_clause);
    let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);
    if let Some(owner_id) = owner_filter {
        count_query = count_query.bind(owner_id);
    }
    if let Some(store_id) = query.store_id {
        count_query = count_query.bind(store_id);
    }
    let total = count_query.fetch_one(&state.pool).await?;

    if total == 0 {
        return Ok(Json(ApiResponse::success(PageResponse::empty(
            query.pagination.page,
            query.pagination.limit(),
        ))));
    }

    let list_sql = format!(
        r#"
        SELECT id, name, sku, price, stock, store_id, owner_id, created_at, updated_at
        FROM products{}
        ORDER BY created_at DESC
        LIMIT ${} OFFSET ${}
        "#,
        where_clause,
        bind_index,
        bind_index + 1
    );
    let mut list_query = sqlx::query_as::<_, Product>(&list_sql);
    if let Some(owner_id) = owner_filter {
        list_query = list_query.bind(owner_id);
    }
    if let Some(store_id) = query.store_id {
        list_query = list_query.bind(store_id);
    }
    let products = list_query
        .bind(query.pagination.limit())
        .bind(query.pagination.offset())
        .fetch_all(&state.pool)
        .await?;

    Ok(Json(ApiResponse::success(PageResponse::new(
        products,
        total,
        query.pagination.page,
        query.pagination.limit(),
    ))))
}

/// 获取单个商品
///
/// GET /api/admin/products/{id}
pub async fn get_product(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Product>>> {
    let principal = claims.principal()?;
    let product = fetch_product(&state, id).await?;

    if product.owner_id != principal.id && !principal.role.can(Capability::ReadAllEntities) {
        return Err(AdminError::Forbidden("resource:manage-own".to_string()));
    }

    Ok(Json(ApiResponse::success(product)))
}

/// 更新商品
///
/// PUT /api/admin/products/{id}
///
/// SKU 创建后保持稳定，改名不会重新生成。
pub async fn update_product(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateProductRequest>,
) -> Result<Json<ApiResponse<Product>>> {
    req.validate()?;
    let principal = claims.principal()?;
    let mut product = fetch_product(&state, id).await?;

    if product.owner_id != principal.id && !principal.role.can(Capability::ReadAllEntities) {
        return Err(AdminError::Forbidden("resource:manage-own".to_string()));
    }

    if let Some(name) = req.name {
        product.name = name;
    }
    if let Some(price) = req.price {
        product.price = price;
    }
    if let Some(stock) = req.stock {
        product.stock = stock;
    }
    product.updated_at = Utc::now();

    sqlx::query(
        r#"
        UPDATE products
        SET name = $1, price = $2, stock = $3, updated_at = $4
        WHERE id = $5
        "#,
    )
    .bind(&product.name)
    .bind(product.price)
    .bind(product.stock)
    .bind(product.updated_at)
    .bind(product.id)
    .execute(&state.pool)
    .await?;

    Ok(Json(ApiResponse::success(product)))
}

/// 删除商品
///
/// DELETE /api/admin/products/{id}
pub async fn delete_product(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<DeletedResponse>>> {
    let principal = claims.principal()?;
    let product = fetch_product(&state, id).await?;

    if product.owner_id != principal.id && !principal.role.can(Capability::ReadAllEntities) {
        return Err(AdminError::Forbidden("resource:manage-own".to_string()));
    }

    sqlx::query("DELETE FROM products WHERE id = $1")
        .bind(id)
        .execute(&state.pool)
        .await?;

    info!(product_id = %id, "商品已删除");

    Ok(Json(ApiResponse::success(DeletedResponse::success())))
}

// ============================================
// 内部辅助
// ============================================

async fn fetch_product(state: &AppState, id: Uuid) -> Result<Product> {
    sqlx::query_as(
        r#"
        SELECT id, name, sku, price, stock, store_id, owner_id, created_at, updated_at
        FROM products
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(&state.pool)
    .await?
    .ok_or_else(|| AdminError::NotFound(format!("Product {}", id)))
}

/// 生成不冲突的 SKU
///
/// 随机后缀冲突概率极低，仍设置尝试上限。
async fn unique_sku(state: &AppState, name: &str) -> Result<String> {
    for _ in 0..5 {
        let candidate = sku_from_name(name);
        let taken: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM products WHERE sku = $1")
            .bind(&candidate)
            .fetch_optional(&state.pool)
            .await?;

        if taken.is_none() {
            return Ok(candidate);
        }
    }

    Err(AdminError::DuplicateName(name.to_string()))
}
