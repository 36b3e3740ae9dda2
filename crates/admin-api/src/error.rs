//! 管理后台错误类型定义
//!
//! 包含所有 admin-api 特有的错误类型

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use marketplace_moderation::ModerationError;
use serde_json::json;

/// 管理后台错误类型
#[derive(Debug, thiserror::Error)]
pub enum AdminError {
    // 认证错误
    #[error("未授权: {0}")]
    Unauthorized(String),
    #[error("禁止访问: {0}")]
    Forbidden(String),
    #[error("用户名或密码错误")]
    InvalidCredentials,
    #[error("账号尚未通过审批")]
    AccountNotApproved,
    #[error("SuperAdmin 账号不允许修改或删除")]
    SuperAdminImmutable,
    #[error("用户不存在: {0}")]
    UserNotFound(String),

    // 验证错误
    #[error("参数验证失败: {0}")]
    Validation(String),

    // 资源不存在
    #[error("资源不存在: {0}")]
    NotFound(String),

    // 业务错误
    #[error("名称已被占用: {0}")]
    DuplicateName(String),
    #[error("文件处理失败: {0}")]
    FileProcessingError(String),
    #[error("请求过于频繁，请稍后再试")]
    RateLimited,

    // 系统错误
    #[error("数据库错误: {0}")]
    Database(#[from] sqlx::Error),
    #[error("外部存储错误: {0}")]
    Storage(String),
    #[error("内部错误: {0}")]
    Internal(String),
}

impl AdminError {
    /// 返回对应的 HTTP 状态码
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Unauthorized(_) | Self::InvalidCredentials => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) | Self::AccountNotApproved | Self::SuperAdminImmutable => {
                StatusCode::FORBIDDEN
            }
            Self::UserNotFound(_) | Self::NotFound(_) => StatusCode::NOT_FOUND,

            Self::Validation(_) => StatusCode::BAD_REQUEST,

            Self::DuplicateName(_) => StatusCode::CONFLICT,
            Self::FileProcessingError(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::RateLimited => StatusCode::TOO_MANY_REQUESTS,

            Self::Database(_) | Self::Storage(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// 返回错误码（用于 API 响应）
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Unauthorized(_) => "UNAUTHORIZED",
            Self::Forbidden(_) => "FORBIDDEN",
            Self::InvalidCredentials => "INVALID_CREDENTIALS",
            Self::AccountNotApproved => "ACCOUNT_NOT_APPROVED",
            Self::SuperAdminImmutable => "SUPER_ADMIN_IMMUTABLE",
            Self::UserNotFound(_) => "USER_NOT_FOUND",

            Self::Validation(_) => "VALIDATION_ERROR",
            Self::NotFound(_) => "NOT_FOUND",
            Self::DuplicateName(_) => "DUPLICATE_NAME",
            Self::FileProcessingError(_) => "FILE_PROCESSING_ERROR",
            Self::RateLimited => "RATE_LIMITED",

            Self::Database(_) => "DATABASE_ERROR",
            Self::Storage(_) => "STORAGE_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl IntoResponse for AdminError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // 系统级错误只返回通用提示，详细信息仅记录日志，防止信息泄露
        let message = match &self {
            Self::Database(e) => {
                tracing::error!(error = %e, "数据库操作失败");
                "服务内部错误，请稍后重试".to_string()
            }
            Self::Storage(e) => {
                tracing::error!(error = %e, "对象存储操作失败");
                "服务内部错误，请稍后重试".to_string()
            }
            Self::Internal(e) => {
                tracing::error!(error = %e, "内部错误");
                "服务内部错误，请稍后重试".to_string()
            }
            other => other.to_string(),
        };

        let mut response = (
            status,
            axum::Json(json!({
                "success": false,
                "code": self.error_code(),
                "message": message,
                "data": serde_json::Value::Null
            })),
        )
            .into_response();

        if matches!(self, Self::RateLimited) {
            if let Ok(val) = axum::http::HeaderValue::from_str("60") {
                response.headers_mut().insert("Retry-After", val);
            }
        }

        response
    }
}

/// 从 validator 错误转换
impl From<validator::ValidationErrors> for AdminError {
    fn from(errors: validator::ValidationErrors) -> Self {
        Self::Validation(errors.to_string())
    }
}

/// 从 JSON 序列化错误转换
impl From<serde_json::Error> for AdminError {
    fn from(err: serde_json::Error) -> Self {
        Self::Internal(format!("JSON 处理错误: {}", err))
    }
}

/// 从审核核心层的错误转换
impl From<ModerationError> for AdminError {
    fn from(err: ModerationError) -> Self {
        match err {
            ModerationError::Database(e) => Self::Database(e),
            ModerationError::NotFound { entity, id } => {
                Self::NotFound(format!("{} {}", entity, id))
            }
            ModerationError::Validation(msg) => Self::Validation(msg),
            ModerationError::Unauthorized(msg) => Self::Unauthorized(msg),
            ModerationError::Forbidden { operation } => Self::Forbidden(operation),
            ModerationError::Dependency { service, message } => {
                Self::Storage(format!("{}: {}", service, message))
            }
            ModerationError::Internal(msg) => Self::Internal(msg),
        }
    }
}

/// 服务层 Result 类型别名
pub type Result<T> = std::result::Result<T, AdminError>;

#[cfg(test)]
mod tests {
    use super::*;
    use axum::response::IntoResponse;

    /// 构造所有错误变体及其期望的 (StatusCode, error_code) 映射。
    /// 表驱动避免逐个变体写重复断言，新增变体时只需在一处维护。
    fn all_error_variants() -> Vec<(AdminError, StatusCode, &'static str)> {
        vec![
            (AdminError::Unauthorized("token expired".into()), StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            (AdminError::Forbidden("entity:transition".into()), StatusCode::FORBIDDEN, "FORBIDDEN"),
            (AdminError::InvalidCredentials, StatusCode::UNAUTHORIZED, "INVALID_CREDENTIALS"),
            (AdminError::AccountNotApproved, StatusCode::FORBIDDEN, "ACCOUNT_NOT_APPROVED"),
            (AdminError::SuperAdminImmutable, StatusCode::FORBIDDEN, "SUPER_ADMIN_IMMUTABLE"),
            (AdminError::UserNotFound("alice".into()), StatusCode::NOT_FOUND, "USER_NOT_FOUND"),
            (AdminError::Validation("name is required".into()), StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            (AdminError::NotFound("Material abc".into()), StatusCode::NOT_FOUND, "NOT_FOUND"),
            (AdminError::DuplicateName("fresh-market".into()), StatusCode::CONFLICT, "DUPLICATE_NAME"),
            (AdminError::FileProcessingError("corrupt image".into()), StatusCode::UNPROCESSABLE_ENTITY, "FILE_PROCESSING_ERROR"),
            (AdminError::RateLimited, StatusCode::TOO_MANY_REQUESTS, "RATE_LIMITED"),
            (AdminError::Storage("upload rejected".into()), StatusCode::INTERNAL_SERVER_ERROR, "STORAGE_ERROR"),
            (AdminError::Internal("unexpected state".into()), StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        ]
    }

    /// 确保每个错误变体都映射到正确的 HTTP 状态码。
    /// 状态码错误会导致前端误判请求结果（如把 403 当 500 处理）。
    #[test]
    fn test_all_variants_status_code() {
        for (error, expected_status, label) in all_error_variants() {
            assert_eq!(
                error.status_code(),
                expected_status,
                "状态码不匹配: variant={label}"
            );
        }
    }

    /// 错误码是 API 契约的一部分，客户端用它做条件分支，必须逐一锁定。
    #[test]
    fn test_all_variants_error_code() {
        for (error, _status, expected_code) in all_error_variants() {
            assert_eq!(
                error.error_code(),
                expected_code,
                "错误码不匹配: expected={expected_code}"
            );
        }
    }

    /// IntoResponse 是错误到 HTTP 响应的最终出口。
    /// 必须验证状态码正确、响应体四字段（success/code/message/data）完整。
    #[tokio::test]
    async fn test_into_response_body_structure() {
        for (error, expected_status, expected_code) in all_error_variants() {
            let label = format!("{:?}", error);
            let response = error.into_response();

            assert_eq!(
                response.status(),
                expected_status,
                "响应状态码不匹配: {label}"
            );

            let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
                .await
                .expect("读取响应体失败");
            let body: serde_json::Value =
                serde_json::from_slice(&body_bytes).expect("响应体不是合法 JSON");

            assert_eq!(body["success"], json!(false), "success 字段应为 false: {label}");
            assert_eq!(body["code"], json!(expected_code), "code 字段不匹配: {label}");
            assert!(!body["message"].as_str().unwrap_or("").is_empty(), "message 不应为空: {label}");
            assert!(body["data"].is_null(), "data 字段应为 null: {label}");
        }
    }

    /// 系统级错误的响应消息不应泄露内部细节，只返回通用提示。
    #[tokio::test]
    async fn test_system_errors_hide_internal_details() {
        let system_errors: Vec<(AdminError, &str)> = vec![
            (AdminError::Storage("http://10.0.0.9:9000 connection refused".into()), "10.0.0.9"),
            (AdminError::Internal("stack overflow at module X".into()), "stack overflow"),
        ];

        for (error, leaked_detail) in system_errors {
            let response = error.into_response();
            let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
                .await
                .expect("读取响应体失败");
            let body: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap();
            let message = body["message"].as_str().unwrap();

            assert!(
                !message.contains(leaked_detail),
                "系统错误消息泄露了内部细节: message={message}, leaked={leaked_detail}"
            );
            assert!(
                message.contains("服务内部错误"),
                "系统错误应返回通用提示，实际: {message}"
            );
        }
    }

    /// 限流响应必须带 Retry-After 头，客户端依赖它做退避
    #[tokio::test]
    async fn test_rate_limited_response_has_retry_after() {
        let response = AdminError::RateLimited.into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert!(response.headers().contains_key("Retry-After"));
    }

    /// 审核核心层错误映射：NotFound → 404，Forbidden → 403，
    /// Dependency → 500（存储类），Database 保持 Database。
    #[test]
    fn test_from_moderation_error() {
        let err: AdminError = ModerationError::not_found("Material", "abc-1").into();
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
        assert!(err.to_string().contains("Material"));

        let err: AdminError = ModerationError::Forbidden {
            operation: "entity:transition".to_string(),
        }
        .into();
        assert_eq!(err.status_code(), StatusCode::FORBIDDEN);

        let err: AdminError = ModerationError::Dependency {
            service: "blob-storage".to_string(),
            message: "timeout".to_string(),
        }
        .into();
        assert!(matches!(err, AdminError::Storage(_)));

        let err: AdminError = ModerationError::Database(sqlx::Error::RowNotFound).into();
        assert!(matches!(err, AdminError::Database(_)));
        assert_eq!(err.error_code(), "DATABASE_ERROR");
    }

    /// validator 转换必须把字段级错误信息带入，否则用户无法定位校验失败的字段
    #[test]
    fn test_from_validation_errors() {
        use validator::{ValidationError, ValidationErrors};

        let mut errors = ValidationErrors::new();
        let mut field_error = ValidationError::new("length");
        field_error.message = Some("名称长度不能超过 50 个字符".into());
        errors.add("name", field_error);

        let admin_error: AdminError = errors.into();
        match &admin_error {
            AdminError::Validation(msg) => {
                assert!(msg.contains("name"), "转换后应保留字段名: {msg}");
            }
            other => panic!("期望 Validation 变体，实际: {:?}", other),
        }

        assert_eq!(admin_error.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(admin_error.error_code(), "VALIDATION_ERROR");
    }

    /// 确保表驱动用例覆盖所有变体（Database 依赖 sqlx::Error 不易构造，故排除）
    #[test]
    fn test_all_variants_covered_in_table() {
        assert_eq!(
            all_error_variants().len(),
            13,
            "表驱动用例数量与变体总数不一致，可能新增了变体但未更新测试"
        );
    }
}
