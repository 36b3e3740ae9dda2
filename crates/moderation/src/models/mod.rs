//! 领域模型定义

mod admin;
mod enums;
mod material;
mod notification;
mod product;
mod store;

pub use admin::AdminAccount;
pub use enums::{EntityKind, ModerationStatus, Role};
pub use material::{Material, MaterialPatch};
pub use notification::{Notification, NotificationTarget};
pub use product::{Product, sku_from_name};
pub use store::{Store, slugify};
