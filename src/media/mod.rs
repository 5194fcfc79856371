//! 媒体对象存储
//!
//! 课时视频与头像通过 `MediaStore` 保存，业务层只持有 `{url, public_id}`。
//! 默认实现为本地文件系统，由 `GET /media/{public_id}` 对外提供。

pub mod local;
pub mod upload;

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::config::AppConfig;
use crate::errors::Result;
use crate::utils::MediaKind;

pub use local::LocalMediaStore;
pub use upload::{MediaForm, UploadError, UploadedFile, read_media_form};

/// 已保存对象的访问地址与 id
#[derive(Debug, Clone, PartialEq)]
pub struct StoredMedia {
    pub url: String,
    pub public_id: String,
}

#[async_trait]
pub trait MediaStore: Send + Sync {
    /// 保存对象，`file_name` 仅用于推断扩展名
    async fn upload(&self, data: Vec<u8>, file_name: &str, kind: MediaKind)
    -> Result<StoredMedia>;

    /// 删除对象；对象不存在视为成功
    async fn delete(&self, public_id: &str) -> Result<()>;

    /// 读取对象内容
    async fn read(&self, public_id: &str) -> Result<Vec<u8>>;
}

/// 尽力删除旧对象，失败只记录孤儿 id
pub async fn delete_quietly(store: &dyn MediaStore, public_id: Option<&str>) {
    let Some(public_id) = public_id else {
        return;
    };
    match store.delete(public_id).await {
        Ok(()) => debug!("Deleted media object {}", public_id),
        Err(e) => warn!("Failed to delete media object, orphaned {}: {}", public_id, e),
    }
}

pub async fn create_media_store() -> Result<Arc<dyn MediaStore>> {
    let config = AppConfig::get();
    let store = LocalMediaStore::new(&config.media.dir, &config.media.public_base_url).await?;
    Ok(Arc::new(store))
}
