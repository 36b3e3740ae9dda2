//! JWT Token 处理
//!
//! 提供 JWT Token 的生成和验证功能。Token 载荷只携带
//! 用户 ID 与角色，权限判定统一走角色能力表。

use std::str::FromStr;

use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use marketplace_moderation::{Principal, Role};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AdminError;

/// JWT 配置
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// 签名密钥
    pub secret: String,
    /// Token 过期时间（秒）
    pub expires_in_secs: i64,
    /// Token 签发者
    pub issuer: String,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: "marketplace-admin-secret-change-in-production".to_string(),
            expires_in_secs: 86400, // 24 小时
            issuer: "marketplace-admin-api".to_string(),
        }
    }
}

/// JWT Claims（Token 载荷）
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// 用户 ID（UUID 字符串）
    pub sub: String,
    /// 用户名
    pub username: String,
    /// 角色名（User / Admin / SuperAdmin）
    pub role: String,
    /// 签发时间
    pub iat: i64,
    /// 过期时间
    pub exp: i64,
    /// 签发者
    pub iss: String,
}

impl Claims {
    /// 还原为审核核心层的主体
    pub fn principal(&self) -> Result<Principal, AdminError> {
        let id = Uuid::parse_str(&self.sub)
            .map_err(|_| AdminError::Unauthorized("无效的用户 ID".to_string()))?;
        let role = Role::from_str(&self.role)
            .map_err(|_| AdminError::Unauthorized(format!("未知角色: {}", self.role)))?;
        Ok(Principal::new(id, role))
    }
}

/// JWT 管理器
#[derive(Clone)]
pub struct JwtManager {
    config: JwtConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl JwtManager {
    pub fn new(config: JwtConfig) -> Self {
        let encoding_key = EncodingKey::from_secret(config.secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.secret.as_bytes());

        Self {
            config,
            encoding_key,
            decoding_key,
        }
    }

    /// 生成 JWT Token，返回 (token, 过期时间戳)
    pub fn generate_token(
        &self,
        user_id: Uuid,
        username: &str,
        role: Role,
    ) -> Result<(String, i64), AdminError> {
        let now = Utc::now();
        let exp = now + Duration::seconds(self.config.expires_in_secs);

        let claims = Claims {
            sub: user_id.to_string(),
            username: username.to_string(),
            role: role.to_string(),
            iat: now.timestamp(),
            exp: exp.timestamp(),
            iss: self.config.issuer.clone(),
        };

        let token = encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| AdminError::Internal(format!("JWT 生成失败: {}", e)))?;

        Ok((token, exp.timestamp()))
    }

    /// 验证并解析 JWT Token
    ///
    /// 返回解析后的 Claims，如果 Token 无效或过期则返回错误
    pub fn verify_token(&self, token: &str) -> Result<Claims, AdminError> {
        let mut validation = Validation::default();
        validation.set_issuer(&[&self.config.issuer]);

        let token_data = decode::<Claims>(token, &self.decoding_key, &validation).map_err(
            |e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                    AdminError::Unauthorized("Token 已过期".to_string())
                }
                jsonwebtoken::errors::ErrorKind::InvalidToken => {
                    AdminError::Unauthorized("无效的 Token".to_string())
                }
                _ => AdminError::Unauthorized(format!("Token 验证失败: {}", e)),
            },
        )?;

        Ok(token_data.claims)
    }

    /// 刷新 Token
    ///
    /// 基于现有的 Claims 生成新的 Token（延长过期时间）
    pub fn refresh_token(&self, claims: &Claims) -> Result<(String, i64), AdminError> {
        let principal = claims.principal()?;
        self.generate_token(principal.id, &claims.username, principal.role)
    }

    /// 获取 Token 过期时间（秒）
    pub fn expires_in_secs(&self) -> i64 {
        self.config.expires_in_secs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_and_verify_token() {
        let manager = JwtManager::new(JwtConfig::default());
        let user_id = Uuid::new_v4();

        let (token, _exp) = manager
            .generate_token(user_id, "alice", Role::SuperAdmin)
            .unwrap();

        let claims = manager.verify_token(&token).unwrap();
        assert_eq!(claims.sub, user_id.to_string());
        assert_eq!(claims.username, "alice");
        assert_eq!(claims.role, "SuperAdmin");

        let principal = claims.principal().unwrap();
        assert_eq!(principal.id, user_id);
        assert_eq!(principal.role, Role::SuperAdmin);
    }

    #[test]
    fn test_invalid_token() {
        let manager = JwtManager::new(JwtConfig::default());
        assert!(manager.verify_token("invalid.token.here").is_err());
    }

    #[test]
    fn test_principal_rejects_unknown_role() {
        let claims = Claims {
            sub: Uuid::new_v4().to_string(),
            username: "bob".to_string(),
            role: "Emperor".to_string(),
            iat: 0,
            exp: 0,
            iss: "marketplace-admin-api".to_string(),
        };
        assert!(claims.principal().is_err());
    }

    #[test]
    fn test_refresh_token_keeps_identity() {
        let manager = JwtManager::new(JwtConfig::default());
        let user_id = Uuid::new_v4();
        let (token, _) = manager.generate_token(user_id, "alice", Role::Admin).unwrap();
        let claims = manager.verify_token(&token).unwrap();

        let (new_token, _) = manager.refresh_token(&claims).unwrap();
        let new_claims = manager.verify_token(&new_token).unwrap();
        assert_eq!(new_claims.sub, user_id.to_string());
        assert_eq!(new_claims.role, "Admin");
    }
}
