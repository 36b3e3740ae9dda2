//! 材料管理的 HTTP 处理器
//!
//! 材料是核心的可审核实体：管理员提交后进入待审，
//! SuperAdmin 审批或驳回，所有者可修改后重新提交。

use axum::{
    Extension, Json,
    extract::{Multipart, Path, Query, State},
};
use marketplace_moderation::{
    Capability, Material, MaterialFilter, MaterialPatch, MaterialRepositoryTrait,
    ModerationStatus,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::auth::Claims;
use crate::dto::{ApiResponse, DeletedResponse, PageResponse, PaginationParams};
use crate::error::{AdminError, Result};
use crate::state::AppState;

// ============================================
// 请求/响应 DTO
// ============================================

/// 材料列表查询参数
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListMaterialsQuery {
    #[serde(flatten)]
    pub pagination: PaginationParams,
    pub store_id: Option<Uuid>,
    pub status: Option<ModerationStatus>,
    pub keyword: Option<String>,
}

/// 状态流转请求
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransitionRequest {
    pub status: ModerationStatus,
}

/// 批量状态流转请求
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkTransitionRequest {
    pub ids: Vec<Uuid>,
    pub status: ModerationStatus,
}

/// 批量流转响应
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkTransitionResponse {
    pub modified_count: u64,
}

/// 状态统计响应
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MaterialStatistics {
    pub pending: i64,
    pub approved: i64,
    pub rejected: i64,
    pub total: i64,
}

// ============================================
// API 处理器
// ============================================

/// 提交材料
///
/// POST /api/admin/materials（multipart）
///
/// 字段：name / quantity / unit / unitCost / storeId，可选图片 image。
/// 提交后进入待审核状态，SuperAdmin 会收到待审通知。
pub async fn create_material(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    mut multipart: Multipart,
) -> Result<Json<ApiResponse<Material>>> {
    let principal = claims.principal()?;

    let mut name = String::new();
    let mut quantity: i64 = 0;
    let mut unit = String::new();
    let mut unit_cost: f64 = 0.0;
    let mut store_id: Option<Uuid> = None;
    let mut image: Option<(Vec<u8>, String, String)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AdminError::FileProcessingError(format!("读取表单失败: {}", e)))?
    {
        let field_name = field.name().unwrap_or_default().to_string();
        match field_name.as_str() {
            "name" => name = text(field).await?,
            "quantity" => {
                quantity = text(field).await?.parse().map_err(|_| {
                    AdminError::Validation("quantity 必须是整数".to_string())
                })?
            }
            "unit" => unit = text(field).await?,
            "unitCost" => {
                unit_cost = text(field).await?.parse().map_err(|_| {
                    AdminError::Validation("unitCost 必须是数字".to_string())
                })?
            }
            "storeId" => {
                store_id = Some(text(field).await?.parse().map_err(|_| {
                    AdminError::Validation("storeId 必须是 UUID".to_string())
                })?)
            }
            "image" => image = Some(file(field).await?),
            _ => {}
        }
    }

    validate_material_fields(&name, quantity, &unit, unit_cost)?;
    let store_id =
        store_id.ok_or_else(|| AdminError::Validation("storeId 不能为空".to_string()))?;

    let material_id = Uuid::new_v4();

    let image_url = match image {
        Some((bytes, content_type, file_name)) => Some(
            state
                .blob
                .upload(
                    bytes,
                    &content_type,
                    &format!("materials/{}/{}", material_id, file_name),
                )
                .await?,
        ),
        None => None,
    };

    let mut material = Material::new(
        name,
        quantity,
        unit,
        unit_cost,
        store_id,
        image_url,
        principal.id,
    );
    material.id = material_id;

    let material = state.material_engine.submit(&principal, material).await?;

    Ok(Json(ApiResponse::success(material)))
}

/// 材料列表
///
/// GET /api/admin/materials
///
/// 普通管理员只能看到自己提交的材料，SuperAdmin 可见全部。
pub async fn list_materials(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Query(query): Query<ListMaterialsQuery>,
) -> Result<Json<ApiResponse<PageResponse<Material>>>> {
    let principal = claims.principal()?;

    let mut filter = MaterialFilter {
        store_id: query.store_id,
        owner_id: None,
        status: query.status,
        keyword: query.keyword.clone(),
    };

    if !principal.role.can(Capability::ReadAllEntities) {
        filter.owner_id = Some(principal.id);
    }

    let total = state.material_repo.count(&filter).await?;
    if total == 0 {
        return Ok(Json(ApiResponse::success(PageResponse::empty(
            query.pagination.page,
            query.pagination.limit(),
        ))));
    }

    let materials = state
        .material_repo
        .list(&filter, query.pagination.limit(), query.pagination.offset())
        .await?;

    Ok(Json(ApiResponse::success(PageResponse::new(
        materials,
        total,
        query.pagination.page,
        query.pagination.limit(),
    ))))
}

/// 材料状态统计
///
/// GET /api/admin/materials/statistics
pub async fn material_statistics(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<MaterialStatistics>>> {
    let counts = state.material_repo.count_by_status().await?;

    let mut stats = MaterialStatistics {
        pending: 0,
        approved: 0,
        rejected: 0,
        total: 0,
    };
    for (status, count) in counts {
        match status {
            ModerationStatus::Pending => stats.pending = count,
            ModerationStatus::Approved => stats.approved = count,
            ModerationStatus::Rejected => stats.rejected = count,
        }
        stats.total += count;
    }

    Ok(Json(ApiResponse::success(stats)))
}

/// 获取单个材料
///
/// GET /api/admin/materials/{id}
pub async fn get_material(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Material>>> {
    let principal = claims.principal()?;
    let material = fetch_material(&state, id).await?;

    if material.owner_id != principal.id && !principal.role.can(Capability::ReadAllEntities) {
        return Err(AdminError::Forbidden("entity:read-all".to_string()));
    }

    Ok(Json(ApiResponse::success(material)))
}

/// 修改并重新提交材料
///
/// PUT /api/admin/materials/{id}
///
/// 无论当前处于什么状态，重新提交后都会回到待审核。
pub async fn update_material(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    Json(patch): Json<MaterialPatch>,
) -> Result<Json<ApiResponse<Material>>> {
    let principal = claims.principal()?;

    if patch.is_empty() {
        return Err(AdminError::Validation(
            "至少需要一个更新字段".to_string(),
        ));
    }

    let material = state
        .material_engine
        .resubmit(&principal, id, |m| patch.apply(m))
        .await?;

    Ok(Json(ApiResponse::success(material)))
}

/// 流转材料状态
///
/// PATCH /api/admin/materials/{id}/status
pub async fn transition_material(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    Json(req): Json<TransitionRequest>,
) -> Result<Json<ApiResponse<Material>>> {
    let principal = claims.principal()?;

    let material = state
        .material_engine
        .transition(&principal, id, req.status)
        .await?;

    Ok(Json(ApiResponse::success(material)))
}

/// 批量流转材料状态
///
/// POST /api/admin/materials/bulk-status
///
/// 不存在的 ID 静默跳过，返回状态实际变化的条数。
pub async fn bulk_transition_materials(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<BulkTransitionRequest>,
) -> Result<Json<ApiResponse<BulkTransitionResponse>>> {
    let principal = claims.principal()?;

    if req.ids.is_empty() {
        return Err(AdminError::Validation("ids 不能为空".to_string()));
    }

    let modified_count = state
        .material_engine
        .bulk_transition(&principal, &req.ids, req.status)
        .await?;

    Ok(Json(ApiResponse::success(BulkTransitionResponse {
        modified_count,
    })))
}

/// 删除材料
///
/// DELETE /api/admin/materials/{id}
pub async fn delete_material(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<DeletedResponse>>> {
    let principal = claims.principal()?;
    let material = fetch_material(&state, id).await?;

    if material.owner_id != principal.id && !principal.role.can(Capability::ReadAllEntities) {
        return Err(AdminError::Forbidden("resource:manage-own".to_string()));
    }

    state.material_repo.delete(id).await?;
    info!(material_id = %id, "材料已删除");

    Ok(Json(ApiResponse::success(DeletedResponse::success())))
}

// ============================================
// 内部辅助
// ============================================

async fn fetch_material(state: &AppState, id: Uuid) -> Result<Material> {
    state
        .material_repo
        .get(id)
        .await?
        .ok_or_else(|| AdminError::NotFound(format!("Material {}", id)))
}

fn validate_material_fields(
    name: &str,
    quantity: i64,
    unit: &str,
    unit_cost: f64,
) -> Result<()> {
    if name.is_empty() || name.len() > 100 {
        return Err(AdminError::Validation(
            "name 长度必须在 1-100 之间".to_string(),
        ));
    }
    if quantity < 0 {
        return Err(AdminError::Validation("quantity 不能为负数".to_string()));
    }
    if unit.is_empty() || unit.len() > 20 {
        return Err(AdminError::Validation(
            "unit 长度必须在 1-20 之间".to_string(),
        ));
    }
    if unit_cost < 0.0 {
        return Err(AdminError::Validation("unitCost 不能为负数".to_string()));
    }
    Ok(())
}

async fn text(field: axum::extract::multipart::Field<'_>) -> Result<String> {
    field
        .text()
        .await
        .map_err(|e| AdminError::FileProcessingError(format!("读取字段失败: {}", e)))
}

async fn file(
    field: axum::extract::multipart::Field<'_>,
) -> Result<(Vec<u8>, String, String)> {
    let content_type = field
        .content_type()
        .unwrap_or("application/octet-stream")
        .to_string();
    let file_name = field.file_name().unwrap_or("upload").to_string();
    let bytes = field
        .bytes()
        .await
        .map_err(|e| AdminError::FileProcessingError(format!("读取文件失败: {}", e)))?;

    if bytes.is_empty() {
        return Err(AdminError::FileProcessingError("文件内容为空".to_string()));
    }

    Ok((bytes.to_vec(), content_type, file_name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Uri;

    #[test]
    fn test_validate_material_fields() {
        assert!(validate_material_fields("Flour", 100, "kg", 3.5).is_ok());
        assert!(validate_material_fields("", 100, "kg", 3.5).is_err());
        assert!(validate_material_fields("Flour", -1, "kg", 3.5).is_err());
        assert!(validate_material_fields("Flour", 100, "", 3.5).is_err());
        assert!(validate_material_fields("Flour", 100, "kg", -0.5).is_err());
    }

    /// 列表查询串必须能带显式分页与过滤参数解析，
    /// 分页字段嵌套在查询结构里时数字仍以字符串到达
    #[test]
    fn test_list_query_parses_explicit_pagination() {
        let uri: Uri = "/api/admin/materials?page=2&pageSize=10&status=pending&keyword=flour"
            .parse()
            .unwrap();
        let Query(query) = Query::<ListMaterialsQuery>::try_from_uri(&uri).unwrap();

        assert_eq!(query.pagination.page, 2);
        assert_eq!(query.pagination.limit(), 10);
        assert_eq!(query.status, Some(ModerationStatus::Pending));
        assert_eq!(query.keyword.as_deref(), Some("flour"));
    }

    #[test]
    fn test_list_query_defaults_without_params() {
        let uri: Uri = "/api/admin/materials".parse().unwrap();
        let Query(query) = Query::<ListMaterialsQuery>::try_from_uri(&uri).unwrap();

        assert_eq!(query.pagination.page, 1);
        assert_eq!(query.pagination.limit(), 20);
        assert!(query.store_id.is_none());
    }
}
