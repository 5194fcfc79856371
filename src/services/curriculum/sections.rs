use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::info;

use crate::errors::Result;
use crate::media::{MediaStore, delete_quietly};
use crate::models::courses::responses::CourseTotals;
use crate::models::curriculum::entities::Section;
use crate::models::curriculum::requests::SectionRequest;
use crate::models::users::entities::User;
use crate::models::{ApiResponse, ErrorCode};
use crate::services::courses::load_managed_course;
use crate::storage::Storage;

use super::{CurriculumService, curriculum_error_response, load_managed_section};

pub(crate) async fn create_section(
    storage: &dyn Storage,
    user: &User,
    course_id: i64,
    title: &str,
) -> Result<Section> {
    load_managed_course(storage, user, course_id).await?;
    storage.create_section(course_id, title).await
}

/// 删除章节：先尽力删除各课时视频，再在一个事务内删除章节并扣减课程统计
pub(crate) async fn delete_section(
    storage: &dyn Storage,
    media: &dyn MediaStore,
    user: &User,
    section_id: i64,
) -> Result<CourseTotals> {
    load_managed_section(storage, user, section_id).await?;

    for lecture in storage.list_section_lectures(section_id).await? {
        delete_quietly(media, lecture.video_public_id.as_deref()).await;
    }

    storage.delete_section(section_id).await
}

pub async fn handle_create_section(
    service: &CurriculumService,
    request: &HttpRequest,
    course_id: i64,
    section_request: SectionRequest,
) -> ActixResult<HttpResponse> {
    let user = match crate::services::current_user(request) {
        Ok(user) => user,
        Err(response) => return Ok(response),
    };
    let storage = service.get_storage(request);

    match create_section(storage.as_ref(), &user, course_id, &section_request.title).await {
        Ok(section) => {
            info!("Section {} added to course {}", section.id, course_id);
            Ok(HttpResponse::Created().json(ApiResponse::success(
                section,
                "Section created successfully",
            )))
        }
        Err(e) => Ok(curriculum_error_response(&e, ErrorCode::CourseNotFound)),
    }
}

pub async fn handle_rename_section(
    service: &CurriculumService,
    request: &HttpRequest,
    section_id: i64,
    section_request: SectionRequest,
) -> ActixResult<HttpResponse> {
    let user = match crate::services::current_user(request) {
        Ok(user) => user,
        Err(response) => return Ok(response),
    };
    let storage = service.get_storage(request);

    if let Err(e) = load_managed_section(storage.as_ref(), &user, section_id).await {
        return Ok(curriculum_error_response(&e, ErrorCode::SectionNotFound));
    }

    match storage
        .rename_section(section_id, &section_request.title)
        .await
    {
        Ok(section) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            section,
            "Section updated successfully",
        ))),
        Err(e) => Ok(curriculum_error_response(&e, ErrorCode::SectionNotFound)),
    }
}

pub async fn handle_delete_section(
    service: &CurriculumService,
    request: &HttpRequest,
    section_id: i64,
) -> ActixResult<HttpResponse> {
    let user = match crate::services::current_user(request) {
        Ok(user) => user,
        Err(response) => return Ok(response),
    };
    let storage = service.get_storage(request);
    let media = service.get_media(request);

    match delete_section(storage.as_ref(), media.as_ref(), &user, section_id).await {
        Ok(totals) => {
            info!(
                "Section {} deleted, course {} now has {} lectures",
                section_id, totals.course_id, totals.total_lectures
            );
            Ok(HttpResponse::Ok().json(ApiResponse::success(
                totals,
                "Section deleted successfully",
            )))
        }
        Err(e) => Ok(curriculum_error_response(&e, ErrorCode::SectionNotFound)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::CourseHubError;
    use crate::media::local::tests::temp_store;
    use crate::models::users::entities::UserRole;
    use crate::storage::sea_orm_storage::{SeaOrmStorage, fixtures};
    use crate::utils::MediaKind;

    #[tokio::test]
    async fn test_delete_section_removes_videos_and_decrements_totals() {
        let storage = SeaOrmStorage::new_in_memory().await;
        let media = temp_store().await;
        let owner = fixtures::user(&storage, "o@example.com", UserRole::Instructor).await;
        let course = fixtures::draft_course(&storage, &owner, "Rust", "Development").await;

        let keep = create_section(&storage, &owner, course.id, "Basics").await.unwrap();
        fixtures::lecture(&storage, keep.id, "Kept", 100).await;

        let doomed = create_section(&storage, &owner, course.id, "Extras").await.unwrap();
        let lecture = fixtures::lecture(&storage, doomed.id, "Bonus", 40).await;
        let stored = media
            .upload(vec![0x1A, 0x45, 0xDF, 0xA3], "bonus.webm", MediaKind::Video)
            .await
            .unwrap();
        storage
            .update_lecture(
                lecture.id,
                Default::default(),
                Some(crate::models::curriculum::requests::LectureVideo {
                    url: stored.url.clone(),
                    public_id: stored.public_id.clone(),
                }),
            )
            .await
            .unwrap();

        let totals = delete_section(&storage, &media, &owner, doomed.id)
            .await
            .unwrap();
        assert_eq!(totals.total_lectures, 1);
        assert_eq!(totals.total_duration_in_seconds, 100);
        assert_eq!(
            storage.recompute_course_totals(course.id).await.unwrap(),
            totals
        );
        assert!(matches!(
            media.read(&stored.public_id).await.unwrap_err(),
            CourseHubError::NotFound(_)
        ));
    }

    #[tokio::test]
    async fn test_other_instructor_cannot_add_sections() {
        let storage = SeaOrmStorage::new_in_memory().await;
        let owner = fixtures::user(&storage, "o@example.com", UserRole::Instructor).await;
        let other = fixtures::user(&storage, "x@example.com", UserRole::Instructor).await;
        let course = fixtures::draft_course(&storage, &owner, "Rust", "Development").await;

        assert!(matches!(
            create_section(&storage, &other, course.id, "Hijack")
                .await
                .unwrap_err(),
            CourseHubError::Forbidden(_)
        ));
        assert!(matches!(
            create_section(&storage, &owner, course.id, "  ")
                .await
                .unwrap_err(),
            CourseHubError::Validation(_)
        ));
    }
}
