//! HTTP 处理器

pub mod admin;
pub mod auth;
pub mod material;
pub mod notification;
pub mod product;
pub mod store;
