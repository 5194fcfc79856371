use actix_multipart::Multipart;
use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::info;

use crate::errors::{CourseHubError, Result};
use crate::media::upload::MediaPolicy;
use crate::media::{MediaStore, UploadedFile, delete_quietly, read_media_form};
use crate::middlewares::RequireJWT;
use crate::models::users::entities::User;
use crate::models::users::responses::UserResponse;
use crate::models::{ApiResponse, ErrorCode};
use crate::storage::Storage;
use crate::utils::MediaKind;

use super::UserService;

/// 表单中的头像字段
const PHOTO_FIELD: &str = "photo";

/// 替换头像：先尽力删除旧对象，再上传新对象并写回用户
pub(crate) async fn replace_user_photo(
    storage: &dyn Storage,
    media: &dyn MediaStore,
    user_id: i64,
    file: UploadedFile,
) -> Result<User> {
    // 缓存中的用户不含 public id，以数据库为准
    let current = storage
        .get_user_by_id(user_id)
        .await?
        .ok_or_else(|| CourseHubError::not_found(format!("User {user_id} not found")))?;

    delete_quietly(media, current.photo_public_id.as_deref()).await;

    let stored = media
        .upload(file.data, &file.file_name, MediaKind::Image)
        .await?;

    match storage
        .update_user_photo(user_id, &stored.url, &stored.public_id)
        .await
    {
        Ok(Some(user)) => Ok(user),
        Ok(None) => {
            delete_quietly(media, Some(&stored.public_id)).await;
            Err(CourseHubError::not_found(format!("User {user_id} not found")))
        }
        Err(e) => {
            delete_quietly(media, Some(&stored.public_id)).await;
            Err(e)
        }
    }
}

pub async fn handle_upload_photo(
    service: &UserService,
    request: &HttpRequest,
    payload: Multipart,
) -> ActixResult<HttpResponse> {
    let user = match crate::services::current_user(request) {
        Ok(user) => user,
        Err(response) => return Ok(response),
    };

    let policy = MediaPolicy::for_kind(MediaKind::Image);
    let form = match read_media_form(payload, PHOTO_FIELD, &policy).await {
        Ok(form) => form,
        Err(e) => return Ok(crate::services::upload_error_response(&e)),
    };
    let Some(file) = form.file else {
        return Ok(HttpResponse::BadRequest().json(ApiResponse::error_empty(
            ErrorCode::FileNotFound,
            "No photo found in upload payload",
        )));
    };

    let storage = service.get_storage(request);
    let media = service.get_media(request);
    match replace_user_photo(storage.as_ref(), media.as_ref(), user.id, file).await {
        Ok(user) => {
            info!("User {} updated profile photo", user.id);
            RequireJWT::invalidate_cached_user(request).await;
            Ok(HttpResponse::Ok().json(ApiResponse::success(
                UserResponse { user },
                "Photo updated successfully",
            )))
        }
        Err(e) => Ok(crate::services::error_response_with(
            &e,
            ErrorCode::FileUploadFailed,
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::local::tests::temp_store;
    use crate::models::users::entities::UserRole;
    use crate::storage::sea_orm_storage::{SeaOrmStorage, fixtures};

    fn png(name: &str) -> UploadedFile {
        UploadedFile {
            file_name: name.to_string(),
            extension: "png".to_string(),
            data: vec![0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 1, 2, 3],
        }
    }

    #[tokio::test]
    async fn test_replacing_photo_deletes_previous_object() {
        let storage = SeaOrmStorage::new_in_memory().await;
        let media = temp_store().await;
        let user = fixtures::user(&storage, "p@example.com", UserRole::Student).await;

        let first = replace_user_photo(&storage, &media, user.id, png("a.png"))
            .await
            .unwrap();
        let first_id = storage
            .get_user_by_id(user.id)
            .await
            .unwrap()
            .unwrap()
            .photo_public_id
            .unwrap();
        assert!(first.photo_url.unwrap().ends_with(&first_id));

        replace_user_photo(&storage, &media, user.id, png("b.png"))
            .await
            .unwrap();
        let second_id = storage
            .get_user_by_id(user.id)
            .await
            .unwrap()
            .unwrap()
            .photo_public_id
            .unwrap();

        assert_ne!(first_id, second_id);
        assert!(matches!(
            media.read(&first_id).await.unwrap_err(),
            CourseHubError::NotFound(_)
        ));
        assert!(media.read(&second_id).await.is_ok());
    }
}
