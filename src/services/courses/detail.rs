use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use crate::errors::{CourseHubError, Result};
use crate::middlewares::RequireJWT;
use crate::models::ApiResponse;
use crate::models::courses::responses::CourseDetail;
use crate::models::users::entities::User;
use crate::models::users::responses::PublicUser;
use crate::storage::Storage;

use super::{CourseService, can_manage};

/// 课程详情
///
/// 未发布课程只对创建者与管理员可见；未选课的访客只能看到试看课时的视频地址。
pub(crate) async fn course_detail(
    storage: &dyn Storage,
    course_id: i64,
    viewer: Option<&User>,
) -> Result<CourseDetail> {
    let course = storage
        .get_course_by_id(course_id)
        .await?
        .ok_or_else(|| CourseHubError::not_found(format!("Course {course_id} not found")))?;

    let manager = viewer.is_some_and(|user| can_manage(user, &course));
    if !course.is_published && !manager {
        return Err(CourseHubError::not_found(format!(
            "Course {course_id} not found"
        )));
    }

    let is_enrolled = match viewer {
        Some(user) => storage.is_enrolled(user.id, course_id).await?,
        None => false,
    };

    let mut sections = storage.get_curriculum(course_id).await?;
    if !is_enrolled && !manager {
        sections.iter_mut().for_each(|s| s.redact_videos());
    }

    let creator = storage
        .get_user_by_id(course.creator_id)
        .await?
        .map(|u| PublicUser::from(&u));
    let enrolled_students = storage.count_enrollments(course_id).await?;

    Ok(CourseDetail {
        course,
        creator,
        sections,
        enrolled_students,
        is_enrolled,
    })
}

pub async fn handle_get_course(
    service: &CourseService,
    request: &HttpRequest,
    course_id: i64,
) -> ActixResult<HttpResponse> {
    let viewer = RequireJWT::authenticate_optional(request).await;
    let storage = service.get_storage(request);

    match course_detail(storage.as_ref(), course_id, viewer.as_ref()).await {
        Ok(detail) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            detail,
            "Course retrieved successfully",
        ))),
        Err(e) => Ok(super::manage::course_error_response(&e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::curriculum::requests::{LecturePatch, LectureVideo};
    use crate::models::users::entities::UserRole;
    use crate::storage::sea_orm_storage::{SeaOrmStorage, fixtures};

    async fn course_with_videos(storage: &SeaOrmStorage, owner: &User) -> i64 {
        let course = fixtures::draft_course(storage, owner, "Rust", "Development").await;
        let section = fixtures::section(storage, course.id, "Intro").await;
        for (title, preview) in [("Trailer", true), ("Lesson", false)] {
            let lecture = fixtures::lecture(storage, section.id, title, 60).await;
            storage
                .update_lecture(
                    lecture.id,
                    LecturePatch {
                        is_preview: Some(preview),
                        ..Default::default()
                    },
                    Some(LectureVideo {
                        url: format!("http://localhost/media/videos/{title}.mp4"),
                        public_id: format!("videos/{title}"),
                    }),
                )
                .await
                .unwrap();
        }
        course.id
    }

    #[tokio::test]
    async fn test_visitors_only_see_preview_videos() {
        let storage = SeaOrmStorage::new_in_memory().await;
        let owner = fixtures::user(&storage, "o@example.com", UserRole::Instructor).await;
        let course_id = course_with_videos(&storage, &owner).await;

        // 草稿对访客不可见
        assert!(matches!(
            course_detail(&storage, course_id, None).await.unwrap_err(),
            CourseHubError::NotFound(_)
        ));

        let own = course_detail(&storage, course_id, Some(&owner)).await.unwrap();
        assert!(own.sections[0].lectures.iter().all(|l| l.video_url.is_some()));

        storage.set_course_published(course_id, true).await.unwrap();
        let anonymous = course_detail(&storage, course_id, None).await.unwrap();
        let lectures = &anonymous.sections[0].lectures;
        assert!(lectures[0].video_url.is_some());
        assert!(lectures[1].video_url.is_none());
        assert_eq!(anonymous.creator.unwrap().id, owner.id);
        assert!(!anonymous.is_enrolled);

        let student = fixtures::user(&storage, "s@example.com", UserRole::Student).await;
        let course = storage.get_course_by_id(course_id).await.unwrap().unwrap();
        fixtures::enroll(&storage, &student, &course).await;
        let enrolled = course_detail(&storage, course_id, Some(&student))
            .await
            .unwrap();
        assert!(enrolled.is_enrolled);
        assert_eq!(enrolled.enrolled_students, 1);
        assert!(
            enrolled.sections[0]
                .lectures
                .iter()
                .all(|l| l.video_url.is_some())
        );
    }
}
