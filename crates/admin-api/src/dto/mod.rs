//! 请求/响应 DTO 定义

mod request;
mod response;

pub use request::PaginationParams;
pub use response::{ApiResponse, CreatedResponse, DeletedResponse, PageResponse};
