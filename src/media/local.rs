use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;
use uuid::Uuid;

use super::{MediaStore, StoredMedia};
use crate::errors::{CourseHubError, Result};
use crate::utils::MediaKind;
use crate::utils::validate::validate_public_id;

/// 本地文件系统对象存储，对象路径为 `<root>/<kind>/<uuid>.<ext>`
pub struct LocalMediaStore {
    root: PathBuf,
    public_base_url: String,
}

impl LocalMediaStore {
    pub async fn new(root: impl AsRef<Path>, public_base_url: &str) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        for kind in [MediaKind::Video, MediaKind::Image] {
            fs::create_dir_all(root.join(kind.prefix()))
                .await
                .map_err(|e| {
                    CourseHubError::file_operation(format!(
                        "Failed to create media directory {}: {e}",
                        root.display()
                    ))
                })?;
        }

        Ok(Self {
            root,
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
        })
    }

    fn object_path(&self, public_id: &str) -> Result<PathBuf> {
        validate_public_id(public_id).map_err(CourseHubError::validation)?;
        Ok(self.root.join(public_id))
    }

    fn public_url(&self, public_id: &str) -> String {
        format!("{}/{}", self.public_base_url, public_id)
    }
}

/// 从文件名取扩展名（小写）
pub(crate) fn extension_of(file_name: &str) -> Option<String> {
    Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_lowercase)
        .filter(|ext| {
            !ext.is_empty() && ext.len() <= 8 && ext.chars().all(|c| c.is_ascii_alphanumeric())
        })
}

#[async_trait]
impl MediaStore for LocalMediaStore {
    async fn upload(
        &self,
        data: Vec<u8>,
        file_name: &str,
        kind: MediaKind,
    ) -> Result<StoredMedia> {
        let extension = extension_of(file_name).ok_or_else(|| {
            CourseHubError::validation(format!("File '{file_name}' has no usable extension"))
        })?;
        let public_id = format!("{}/{}.{}", kind.prefix(), Uuid::new_v4(), extension);
        let path = self.object_path(&public_id)?;

        fs::write(&path, &data).await.map_err(|e| {
            CourseHubError::upstream(format!("Failed to store media {public_id}: {e}"))
        })?;
        debug!("Stored media object {} ({} bytes)", public_id, data.len());

        Ok(StoredMedia {
            url: self.public_url(&public_id),
            public_id,
        })
    }

    async fn delete(&self, public_id: &str) -> Result<()> {
        let path = self.object_path(public_id)?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(CourseHubError::upstream(format!(
                "Failed to delete media {public_id}: {e}"
            ))),
        }
    }

    async fn read(&self, public_id: &str) -> Result<Vec<u8>> {
        let path = self.object_path(public_id)?;
        match fs::read(&path).await {
            Ok(data) => Ok(data),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(
                CourseHubError::not_found(format!("Media {public_id} not found")),
            ),
            Err(e) => Err(CourseHubError::file_operation(format!(
                "Failed to read media {public_id}: {e}"
            ))),
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) async fn temp_store() -> LocalMediaStore {
        let root = std::env::temp_dir().join(format!("coursehub-media-{}", Uuid::new_v4()));
        LocalMediaStore::new(&root, "http://localhost/media/")
            .await
            .unwrap()
    }

    #[test]
    fn test_extension_of() {
        assert_eq!(extension_of("Intro.MP4").as_deref(), Some("mp4"));
        assert_eq!(extension_of("archive.tar.gz").as_deref(), Some("gz"));
        assert_eq!(extension_of("noext"), None);
        assert_eq!(extension_of("weird.m p4"), None);
    }

    #[tokio::test]
    async fn test_upload_read_delete() {
        let store = temp_store().await;
        let stored = store
            .upload(b"GIF89a-data".to_vec(), "avatar.gif", MediaKind::Image)
            .await
            .unwrap();

        assert!(stored.public_id.starts_with("images/"));
        assert!(stored.public_id.ends_with(".gif"));
        assert_eq!(
            stored.url,
            format!("http://localhost/media/{}", stored.public_id)
        );
        assert_eq!(store.read(&stored.public_id).await.unwrap(), b"GIF89a-data");

        store.delete(&stored.public_id).await.unwrap();
        // 重复删除不报错
        store.delete(&stored.public_id).await.unwrap();
        assert!(matches!(
            store.read(&stored.public_id).await.unwrap_err(),
            CourseHubError::NotFound(_)
        ));
    }

    #[tokio::test]
    async fn test_rejects_path_traversal() {
        let store = temp_store().await;
        for bad in ["../etc/passwd", "videos/../../x.mp4", "videos/abc.mp4"] {
            assert!(matches!(
                store.read(bad).await.unwrap_err(),
                CourseHubError::Validation(_)
            ));
        }
    }
}
