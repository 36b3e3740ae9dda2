//! 认证模块
//!
//! JWT Token 的签发与验证，密码哈希

mod jwt;
mod password;

pub use jwt::{Claims, JwtConfig, JwtManager};
pub use password::{hash_password, verify_password};
