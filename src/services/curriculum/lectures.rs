use actix_multipart::Multipart;
use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::info;

use crate::errors::{CourseHubError, Result};
use crate::media::upload::MediaPolicy;
use crate::media::{MediaForm, MediaStore, UploadedFile, delete_quietly, read_media_form};
use crate::models::curriculum::entities::Lecture;
use crate::models::curriculum::requests::{CreateLectureRequest, LecturePatch, LectureVideo};
use crate::models::users::entities::User;
use crate::models::{ApiResponse, ErrorCode};
use crate::storage::Storage;
use crate::utils::MediaKind;

use super::{
    CurriculumService, curriculum_error_response, load_managed_lecture, load_managed_section,
};

/// 视频字段名
const VIDEO_FIELD: &str = "video";

fn parse_bool(value: &str, field: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "on" | "yes" => Ok(true),
        "false" | "0" | "off" | "no" => Ok(false),
        other => Err(CourseHubError::validation(format!(
            "Invalid {field}: '{other}'"
        ))),
    }
}

/// 从 multipart 文本字段解析课时变更
pub(crate) fn lecture_patch_from_form(form: &MediaForm) -> Result<LecturePatch> {
    let duration_in_seconds = form
        .text("duration_in_seconds")
        .map(|raw| {
            raw.trim().parse::<i64>().map_err(|_| {
                CourseHubError::validation(format!("Invalid duration_in_seconds: '{raw}'"))
            })
        })
        .transpose()?;

    Ok(LecturePatch {
        title: form.text("title").map(str::to_string),
        duration_in_seconds,
        is_preview: form
            .text("is_preview")
            .map(|raw| parse_bool(raw, "is_preview"))
            .transpose()?,
    })
}

pub(crate) async fn create_lecture(
    storage: &dyn Storage,
    user: &User,
    section_id: i64,
    lecture_request: CreateLectureRequest,
) -> Result<Lecture> {
    load_managed_section(storage, user, section_id).await?;
    storage.create_lecture(section_id, lecture_request).await
}

/// 更新课时
///
/// 先校验变更，再上传新视频并与其余字段一起写入；写入成功后才尽力删除旧视频，
/// 写入失败时清理刚上传的对象，旧视频保持不变。
pub(crate) async fn update_lecture(
    storage: &dyn Storage,
    media: &dyn MediaStore,
    user: &User,
    lecture_id: i64,
    patch: LecturePatch,
    video: Option<UploadedFile>,
) -> Result<Lecture> {
    let (lecture, _) = load_managed_lecture(storage, user, lecture_id).await?;
    patch.validate()?;

    let Some(video) = video else {
        return storage.update_lecture(lecture_id, patch, None).await;
    };

    let stored = media
        .upload(video.data, &video.file_name, MediaKind::Video)
        .await?;

    let attached = LectureVideo {
        url: stored.url.clone(),
        public_id: stored.public_id.clone(),
    };
    match storage.update_lecture(lecture_id, patch, Some(attached)).await {
        Ok(updated) => {
            delete_quietly(media, lecture.video_public_id.as_deref()).await;
            Ok(updated)
        }
        Err(e) => {
            delete_quietly(media, Some(&stored.public_id)).await;
            Err(e)
        }
    }
}

/// 删除课时：先尽力删除视频，再扣减章节与课程统计
pub(crate) async fn delete_lecture(
    storage: &dyn Storage,
    media: &dyn MediaStore,
    user: &User,
    lecture_id: i64,
) -> Result<Lecture> {
    let (lecture, _) = load_managed_lecture(storage, user, lecture_id).await?;
    delete_quietly(media, lecture.video_public_id.as_deref()).await;
    storage.delete_lecture(lecture_id).await
}

pub async fn handle_create_lecture(
    service: &CurriculumService,
    request: &HttpRequest,
    section_id: i64,
    lecture_request: CreateLectureRequest,
) -> ActixResult<HttpResponse> {
    let user = match crate::services::current_user(request) {
        Ok(user) => user,
        Err(response) => return Ok(response),
    };
    let storage = service.get_storage(request);

    match create_lecture(storage.as_ref(), &user, section_id, lecture_request).await {
        Ok(lecture) => {
            info!("Lecture {} added to section {}", lecture.id, section_id);
            Ok(HttpResponse::Created().json(ApiResponse::success(
                lecture,
                "Lecture created successfully",
            )))
        }
        Err(e) => Ok(curriculum_error_response(&e, ErrorCode::SectionNotFound)),
    }
}

pub async fn handle_update_lecture(
    service: &CurriculumService,
    request: &HttpRequest,
    lecture_id: i64,
    payload: Multipart,
) -> ActixResult<HttpResponse> {
    let user = match crate::services::current_user(request) {
        Ok(user) => user,
        Err(response) => return Ok(response),
    };

    let policy = MediaPolicy::for_kind(MediaKind::Video);
    let form = match read_media_form(payload, VIDEO_FIELD, &policy).await {
        Ok(form) => form,
        Err(e) => return Ok(crate::services::upload_error_response(&e)),
    };
    let patch = match lecture_patch_from_form(&form) {
        Ok(patch) => patch,
        Err(e) => return Ok(crate::services::error_response(&e)),
    };

    let storage = service.get_storage(request);
    let media = service.get_media(request);
    match update_lecture(
        storage.as_ref(),
        media.as_ref(),
        &user,
        lecture_id,
        patch,
        form.file,
    )
    .await
    {
        Ok(lecture) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            lecture,
            "Lecture updated successfully",
        ))),
        Err(e) => Ok(curriculum_error_response(&e, ErrorCode::LectureNotFound)),
    }
}

pub async fn handle_delete_lecture(
    service: &CurriculumService,
    request: &HttpRequest,
    lecture_id: i64,
) -> ActixResult<HttpResponse> {
    let user = match crate::services::current_user(request) {
        Ok(user) => user,
        Err(response) => return Ok(response),
    };
    let storage = service.get_storage(request);
    let media = service.get_media(request);

    match delete_lecture(storage.as_ref(), media.as_ref(), &user, lecture_id).await {
        Ok(lecture) => {
            info!("Lecture {} deleted", lecture.id);
            Ok(HttpResponse::Ok().json(ApiResponse::success(
                lecture,
                "Lecture deleted successfully",
            )))
        }
        Err(e) => Ok(curriculum_error_response(&e, ErrorCode::LectureNotFound)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::local::tests::temp_store;
    use crate::models::users::entities::UserRole;
    use crate::storage::sea_orm_storage::{SeaOrmStorage, fixtures};

    fn mp4(name: &str) -> UploadedFile {
        UploadedFile {
            file_name: name.to_string(),
            extension: "mp4".to_string(),
            data: vec![0, 0, 0, 0x20, b'f', b't', b'y', b'p', b'i', b's', b'o', b'm'],
        }
    }

    fn form(fields: &[(&str, &str)]) -> MediaForm {
        MediaForm {
            fields: fields
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            file: None,
        }
    }

    #[test]
    fn test_lecture_patch_from_form() {
        let patch = lecture_patch_from_form(&form(&[
            ("title", "Borrowing"),
            ("duration_in_seconds", " 95 "),
            ("is_preview", "true"),
        ]))
        .unwrap();
        assert_eq!(patch.title.as_deref(), Some("Borrowing"));
        assert_eq!(patch.duration_in_seconds, Some(95));
        assert_eq!(patch.is_preview, Some(true));

        let empty = lecture_patch_from_form(&form(&[])).unwrap();
        assert!(empty.title.is_none() && empty.duration_in_seconds.is_none());

        assert!(lecture_patch_from_form(&form(&[("duration_in_seconds", "ten")])).is_err());
        assert!(lecture_patch_from_form(&form(&[("is_preview", "maybe")])).is_err());
    }

    #[tokio::test]
    async fn test_video_replacement_and_totals() {
        let storage = SeaOrmStorage::new_in_memory().await;
        let media = temp_store().await;
        let owner = fixtures::user(&storage, "o@example.com", UserRole::Instructor).await;
        let course = fixtures::draft_course(&storage, &owner, "Rust", "Development").await;
        let section = fixtures::section(&storage, course.id, "Intro").await;
        let lecture = create_lecture(
            &storage,
            &owner,
            section.id,
            CreateLectureRequest {
                title: "Welcome".into(),
                duration_in_seconds: 60,
                is_preview: false,
            },
        )
        .await
        .unwrap();

        update_lecture(
            &storage,
            &media,
            &owner,
            lecture.id,
            LecturePatch::default(),
            Some(mp4("v1.mp4")),
        )
        .await
        .unwrap();
        let first_id = storage
            .get_lecture_by_id(lecture.id)
            .await
            .unwrap()
            .unwrap()
            .video_public_id
            .unwrap();

        let updated = update_lecture(
            &storage,
            &media,
            &owner,
            lecture.id,
            LecturePatch {
                duration_in_seconds: Some(150),
                ..Default::default()
            },
            Some(mp4("v2.mp4")),
        )
        .await
        .unwrap();
        assert_eq!(updated.duration_in_seconds, 150);
        let second_id = storage
            .get_lecture_by_id(lecture.id)
            .await
            .unwrap()
            .unwrap()
            .video_public_id
            .unwrap();

        // 旧视频已删除，新视频可读
        assert!(media.read(&first_id).await.is_err());
        assert!(media.read(&second_id).await.is_ok());

        let course_now = storage.get_course_by_id(course.id).await.unwrap().unwrap();
        assert_eq!(course_now.total_duration_in_seconds, 150);
        assert_eq!(course_now.total_lectures, 1);

        delete_lecture(&storage, &media, &owner, lecture.id)
            .await
            .unwrap();
        assert!(media.read(&second_id).await.is_err());
        let course_now = storage.get_course_by_id(course.id).await.unwrap().unwrap();
        assert_eq!(course_now.total_lectures, 0);
        assert_eq!(course_now.total_duration_in_seconds, 0);
    }

    #[tokio::test]
    async fn test_invalid_update_keeps_existing_video() {
        let storage = SeaOrmStorage::new_in_memory().await;
        let media = temp_store().await;
        let owner = fixtures::user(&storage, "o@example.com", UserRole::Instructor).await;
        let course = fixtures::draft_course(&storage, &owner, "Rust", "Development").await;
        let section = fixtures::section(&storage, course.id, "Intro").await;
        let lecture = fixtures::lecture(&storage, section.id, "Welcome", 10).await;

        update_lecture(
            &storage,
            &media,
            &owner,
            lecture.id,
            LecturePatch::default(),
            Some(mp4("v1.mp4")),
        )
        .await
        .unwrap();
        let original_id = storage
            .get_lecture_by_id(lecture.id)
            .await
            .unwrap()
            .unwrap()
            .video_public_id
            .unwrap();

        for patch in [
            LecturePatch {
                duration_in_seconds: Some(-5),
                ..Default::default()
            },
            LecturePatch {
                title: Some("   ".into()),
                ..Default::default()
            },
        ] {
            let err = update_lecture(
                &storage,
                &media,
                &owner,
                lecture.id,
                patch,
                Some(mp4("bad.mp4")),
            )
            .await
            .unwrap_err();
            assert!(matches!(err, CourseHubError::Validation(_)));
        }

        let stored = storage.get_lecture_by_id(lecture.id).await.unwrap().unwrap();
        assert_eq!(stored.video_public_id.as_deref(), Some(original_id.as_str()));
        assert_eq!(stored.duration_in_seconds, 10);
        assert_eq!(stored.title, "Welcome");
        // 原视频仍然可读
        assert!(media.read(&original_id).await.is_ok());
    }
}
