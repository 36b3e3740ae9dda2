//! 密码哈希
//!
//! 使用 bcrypt 存储密码，验证时恒定时间比较。

use crate::error::AdminError;

/// 哈希密码
pub fn hash_password(password: &str) -> Result<String, AdminError> {
    bcrypt::hash(password, bcrypt::DEFAULT_COST)
        .map_err(|e| AdminError::Internal(format!("密码哈希失败: {}", e)))
}

/// 验证密码
pub fn verify_password(password: &str, hash: &str) -> Result<bool, AdminError> {
    bcrypt::verify(password, hash)
        .map_err(|e| AdminError::Internal(format!("密码验证失败: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("s3cret-password").unwrap();
        assert_ne!(hash, "s3cret-password");
        assert!(verify_password("s3cret-password", &hash).unwrap());
        assert!(!verify_password("wrong-password", &hash).unwrap());
    }
}
