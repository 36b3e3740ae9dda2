//! 市场管理后台服务
//!
//! 面向店铺管理员与 SuperAdmin 的 REST API：
//! 材料提交与审批、管理员注册审批、店铺与商品管理、通知轮询。

pub mod auth;
pub mod dto;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod state;

pub use error::{AdminError, Result};
pub use state::AppState;
