//! 应用状态定义

use std::sync::Arc;

use marketplace_moderation::blob::BlobStorage;
use marketplace_moderation::{
    Material, NotificationFanout, PgMaterialRepository, PgNotificationRepository, TemplateEngine,
    WorkflowEngine,
};
use marketplace_shared::config::RateLimitConfig;
use sqlx::PgPool;

use crate::auth::{JwtConfig, JwtManager};
use crate::middleware::RateLimiter;

/// 材料审批引擎的具体类型
pub type MaterialEngine =
    WorkflowEngine<Material, PgMaterialRepository, PgNotificationRepository>;

/// 应用共享状态
#[derive(Clone)]
pub struct AppState {
    /// 数据库连接池
    pub pool: PgPool,
    /// JWT 管理器
    pub jwt_manager: JwtManager,
    /// 材料审批工作流引擎
    pub material_engine: Arc<MaterialEngine>,
    /// 材料仓储（列表查询、统计、删除）
    pub material_repo: Arc<PgMaterialRepository>,
    /// 通知扇出
    pub fanout: Arc<NotificationFanout<PgNotificationRepository>>,
    /// 通知模板
    pub templates: Arc<TemplateEngine>,
    /// 对象存储
    pub blob: Arc<dyn BlobStorage>,
    /// 敏感端点限流器
    pub rate_limiter: Arc<RateLimiter>,
}

impl AppState {
    /// 创建应用状态，组装仓储、扇出与工作流引擎
    pub fn new(
        pool: PgPool,
        jwt_config: JwtConfig,
        blob: Arc<dyn BlobStorage>,
        rate_limit: RateLimitConfig,
    ) -> Self {
        let material_repo = Arc::new(PgMaterialRepository::new(pool.clone()));
        let notification_repo = Arc::new(PgNotificationRepository::new(pool.clone()));
        let fanout = Arc::new(NotificationFanout::new(notification_repo));
        let templates = Arc::new(TemplateEngine::with_defaults());
        let material_engine = Arc::new(WorkflowEngine::new(
            material_repo.clone(),
            fanout.clone(),
            templates.clone(),
        ));

        Self {
            pool,
            jwt_manager: JwtManager::new(jwt_config),
            material_engine,
            material_repo,
            fanout,
            templates,
            blob,
            rate_limiter: Arc::new(RateLimiter::new(rate_limit)),
        }
    }
}
