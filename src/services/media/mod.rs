use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, http::header};
use std::sync::Arc;

use crate::errors::CourseHubError;
use crate::media::MediaStore;
use crate::models::ErrorCode;
use crate::utils::file_magic::content_type_for;

pub struct MediaService {
    media: Option<Arc<dyn MediaStore>>,
}

fn content_type_of(public_id: &str) -> &'static str {
    let extension = public_id.rsplit_once('.').map(|(_, ext)| ext).unwrap_or("");
    content_type_for(extension)
}

impl MediaService {
    pub fn new_lazy() -> Self {
        Self { media: None }
    }

    pub(crate) fn get_media(&self, request: &HttpRequest) -> Arc<dyn MediaStore> {
        match &self.media {
            Some(media) => media.clone(),
            None => super::app_media(request),
        }
    }

    /// 读取本地对象存储中的媒体文件
    pub async fn serve(&self, request: &HttpRequest, public_id: &str) -> ActixResult<HttpResponse> {
        match self.get_media(request).read(public_id).await {
            Ok(data) => Ok(HttpResponse::Ok()
                .insert_header((header::CONTENT_TYPE, content_type_of(public_id)))
                .insert_header((header::CACHE_CONTROL, "public, max-age=86400"))
                .body(data)),
            Err(e @ CourseHubError::NotFound(_)) => {
                Ok(super::error_response_with(&e, ErrorCode::FileNotFound))
            }
            Err(e) => Ok(super::error_response(&e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_type_of() {
        assert_eq!(content_type_of("videos/abc.mp4"), "video/mp4");
        assert_eq!(content_type_of("images/abc.JPG"), "image/jpeg");
        assert_eq!(content_type_of("images/abc"), "application/octet-stream");
    }
}
