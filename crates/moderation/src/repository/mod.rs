//! 仓储层
//!
//! trait 定义数据访问接口，Postgres 实现负责生产环境持久化，
//! 内存实现用于测试与本地演示。

mod material_pg;
mod memory;
mod notification_pg;
mod traits;

pub use material_pg::PgMaterialRepository;
pub use memory::{MemoryMaterialRepository, MemoryNotificationRepository};
pub use notification_pg::PgNotificationRepository;
pub use traits::{MaterialFilter, MaterialRepositoryTrait, NotificationRepositoryTrait};

#[cfg(test)]
pub use traits::{MockMaterialRepositoryTrait, MockNotificationRepositoryTrait};
