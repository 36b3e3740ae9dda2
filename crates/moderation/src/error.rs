//! 审核服务错误类型
//!
//! 定义核心层的业务错误和系统错误，使用 thiserror 提供良好的错误信息。

use thiserror::Error;

/// 审核核心错误类型
#[derive(Debug, Error)]
pub enum ModerationError {
    // ==================== 数据库错误 ====================
    #[error("数据库错误: {0}")]
    Database(#[from] sqlx::Error),

    #[error("记录未找到: {entity} id={id}")]
    NotFound { entity: &'static str, id: String },

    // ==================== 验证错误 ====================
    #[error("参数验证失败: {0}")]
    Validation(String),

    // ==================== 权限错误 ====================
    #[error("未授权访问: {0}")]
    Unauthorized(String),

    #[error("权限不足: {operation}")]
    Forbidden { operation: String },

    // ==================== 外部依赖错误 ====================
    #[error("外部服务错误: {service} - {message}")]
    Dependency { service: String, message: String },

    // ==================== 通用错误 ====================
    #[error("内部错误: {0}")]
    Internal(String),
}

/// 错误结果类型别名
pub type Result<T> = std::result::Result<T, ModerationError>;

impl ModerationError {
    /// 获取稳定的机器可读错误码
    pub fn code(&self) -> &'static str {
        match self {
            Self::Database(_) => "DATABASE_ERROR",
            Self::NotFound { .. } => "NOT_FOUND",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Unauthorized(_) => "UNAUTHORIZED",
            Self::Forbidden { .. } => "FORBIDDEN",
            Self::Dependency { .. } => "DEPENDENCY_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// 是否为可重试错误
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Database(_) | Self::Dependency { .. })
    }

    /// 构造 NotFound 便捷方法
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code() {
        let err = ModerationError::not_found("Material", "123");
        assert_eq!(err.code(), "NOT_FOUND");

        let err = ModerationError::Forbidden {
            operation: "material:transition".to_string(),
        };
        assert_eq!(err.code(), "FORBIDDEN");
    }

    #[test]
    fn test_is_retryable() {
        let db_err = ModerationError::Database(sqlx::Error::PoolTimedOut);
        assert!(db_err.is_retryable());

        let not_found = ModerationError::not_found("Material", "123");
        assert!(!not_found.is_retryable());
    }

    #[test]
    fn test_display_contains_context() {
        let err = ModerationError::not_found("Material", "abc-1");
        assert!(err.to_string().contains("Material"));
        assert!(err.to_string().contains("abc-1"));
    }
}
