//! 对象存储客户端
//!
//! 上传材料图片与管理员身份证明文件，返回可公开访问的 URL。
//! 接口抽象为 trait，HTTP 实现走外部对象存储服务。

use std::time::Duration;

use async_trait::async_trait;
use marketplace_shared::config::StorageConfig;
use tracing::{info, instrument};

use crate::error::{ModerationError, Result};

/// 对象存储接口
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BlobStorage: Send + Sync {
    /// 上传文件内容，返回可访问 URL
    async fn upload(&self, bytes: Vec<u8>, content_type: &str, file_name: &str) -> Result<String>;
}

/// HTTP 对象存储实现
pub struct HttpBlobStorage {
    client: reqwest::Client,
    config: StorageConfig,
}

impl HttpBlobStorage {
    pub fn new(config: StorageConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.upload_timeout_seconds))
            .build()
            .map_err(|e| ModerationError::Dependency {
                service: "blob-storage".to_string(),
                message: format!("HTTP 客户端初始化失败: {}", e),
            })?;

        Ok(Self { client, config })
    }
}

#[async_trait]
impl BlobStorage for HttpBlobStorage {
    #[instrument(skip(self, bytes), fields(size = bytes.len()))]
    async fn upload(&self, bytes: Vec<u8>, content_type: &str, file_name: &str) -> Result<String> {
        let url = format!(
            "{}/object/{}/{}",
            self.config.endpoint, self.config.bucket, file_name
        );

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.access_token)
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(bytes)
            .send()
            .await
            .map_err(|e| ModerationError::Dependency {
                service: "blob-storage".to_string(),
                message: format!("上传请求失败: {}", e),
            })?;

        if !response.status().is_success() {
            return Err(ModerationError::Dependency {
                service: "blob-storage".to_string(),
                message: format!("上传被拒绝: HTTP {}", response.status()),
            });
        }

        info!(file_name, "文件上传完成");

        Ok(url)
    }
}
