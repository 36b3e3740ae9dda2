//! 市场内容审核核心库
//!
//! 提供可审核实体抽象、审批工作流引擎和通知扇出。
//! 所有状态流转（pending / approved / rejected）必须经过
//! [`WorkflowEngine`]，实体写入与通知写入是两步尽力而为的操作。

pub mod blob;
pub mod error;
pub mod models;
pub mod notification;
pub mod principal;
pub mod repository;
pub mod workflow;

pub use blob::BlobStorage;
pub use error::{ModerationError, Result};
pub use models::{
    AdminAccount, EntityKind, Material, MaterialPatch, ModerationStatus, Notification,
    NotificationTarget, Product, Role, Store,
};
pub use notification::{NotificationFanout, TemplateEngine};
pub use principal::{Capability, Principal};
pub use repository::{
    MaterialFilter, MaterialRepositoryTrait, NotificationRepositoryTrait, PgMaterialRepository,
    PgNotificationRepository,
};
pub use workflow::{Moderatable, ModerationStore, WorkflowEngine};
