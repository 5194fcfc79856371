use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::info;

use crate::errors::{CourseHubError, Result};
use crate::models::courses::entities::Course;
use crate::models::courses::requests::{CreateCourseRequest, UpdateCourseRequest};
use crate::models::courses::responses::CourseTotals;
use crate::models::users::entities::User;
use crate::models::{ApiResponse, ErrorCode};
use crate::storage::Storage;

use super::{CourseService, load_managed_course};

pub(crate) async fn update_course(
    storage: &dyn Storage,
    user: &User,
    course_id: i64,
    update: UpdateCourseRequest,
) -> Result<Course> {
    load_managed_course(storage, user, course_id).await?;
    storage
        .update_course(course_id, update)
        .await?
        .ok_or_else(|| CourseHubError::not_found(format!("Course {course_id} not found")))
}

pub(crate) async fn publish_course(
    storage: &dyn Storage,
    user: &User,
    course_id: i64,
    publish: bool,
) -> Result<Course> {
    load_managed_course(storage, user, course_id).await?;
    storage.set_course_published(course_id, publish).await
}

pub(crate) async fn recompute_totals(
    storage: &dyn Storage,
    user: &User,
    course_id: i64,
) -> Result<CourseTotals> {
    load_managed_course(storage, user, course_id).await?;
    storage.recompute_course_totals(course_id).await
}

pub async fn handle_create_course(
    service: &CourseService,
    request: &HttpRequest,
    create_request: CreateCourseRequest,
) -> ActixResult<HttpResponse> {
    let user = match crate::services::current_user(request) {
        Ok(user) => user,
        Err(response) => return Ok(response),
    };

    match service
        .get_storage(request)
        .create_course(user.id, create_request)
        .await
    {
        Ok(course) => {
            info!("Course {} created by user {}", course.id, user.id);
            Ok(HttpResponse::Created().json(ApiResponse::success(
                course,
                "Course created successfully",
            )))
        }
        Err(e) => Ok(crate::services::error_response_with(
            &e,
            ErrorCode::CourseCreationFailed,
        )),
    }
}

pub async fn handle_update_course(
    service: &CourseService,
    request: &HttpRequest,
    course_id: i64,
    update: UpdateCourseRequest,
) -> ActixResult<HttpResponse> {
    let user = match crate::services::current_user(request) {
        Ok(user) => user,
        Err(response) => return Ok(response),
    };
    let storage = service.get_storage(request);

    match update_course(storage.as_ref(), &user, course_id, update).await {
        Ok(course) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            course,
            "Course updated successfully",
        ))),
        Err(e) => Ok(course_error_response(&e)),
    }
}

pub async fn handle_publish_course(
    service: &CourseService,
    request: &HttpRequest,
    course_id: i64,
    publish: bool,
) -> ActixResult<HttpResponse> {
    let user = match crate::services::current_user(request) {
        Ok(user) => user,
        Err(response) => return Ok(response),
    };
    let storage = service.get_storage(request);

    match publish_course(storage.as_ref(), &user, course_id, publish).await {
        Ok(course) => {
            info!(
                "Course {} {} by user {}",
                course.id,
                if publish { "published" } else { "unpublished" },
                user.id
            );
            Ok(HttpResponse::Ok().json(ApiResponse::success(
                course,
                if publish {
                    "Course published successfully"
                } else {
                    "Course unpublished successfully"
                },
            )))
        }
        Err(e @ CourseHubError::Validation(_)) => Ok(crate::services::error_response_with(
            &e,
            ErrorCode::CourseNotPublishable,
        )),
        Err(e) => Ok(course_error_response(&e)),
    }
}

pub async fn handle_recompute_totals(
    service: &CourseService,
    request: &HttpRequest,
    course_id: i64,
) -> ActixResult<HttpResponse> {
    let user = match crate::services::current_user(request) {
        Ok(user) => user,
        Err(response) => return Ok(response),
    };
    let storage = service.get_storage(request);

    match recompute_totals(storage.as_ref(), &user, course_id).await {
        Ok(totals) => {
            info!(
                "Course {} totals recomputed: {} lectures, {}s",
                totals.course_id, totals.total_lectures, totals.total_duration_in_seconds
            );
            Ok(HttpResponse::Ok().json(ApiResponse::success(
                totals,
                "Course totals recomputed",
            )))
        }
        Err(e) => Ok(course_error_response(&e)),
    }
}

/// 课程相关错误使用领域错误码
pub(crate) fn course_error_response(err: &CourseHubError) -> HttpResponse {
    match err {
        CourseHubError::NotFound(_) => {
            crate::services::error_response_with(err, ErrorCode::CourseNotFound)
        }
        CourseHubError::Forbidden(_) => {
            crate::services::error_response_with(err, ErrorCode::CoursePermissionDenied)
        }
        _ => crate::services::error_response(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::users::entities::UserRole;
    use crate::storage::sea_orm_storage::{SeaOrmStorage, fixtures};

    #[tokio::test]
    async fn test_only_owner_or_admin_can_manage() {
        let storage = SeaOrmStorage::new_in_memory().await;
        let owner = fixtures::user(&storage, "o@example.com", UserRole::Instructor).await;
        let other = fixtures::user(&storage, "x@example.com", UserRole::Instructor).await;
        let admin = fixtures::user(&storage, "a@example.com", UserRole::Admin).await;
        let course = fixtures::draft_course(&storage, &owner, "Rust", "Development").await;

        let update = UpdateCourseRequest {
            subtitle: Some("Ownership in depth".into()),
            ..Default::default()
        };
        assert!(matches!(
            update_course(&storage, &other, course.id, update.clone())
                .await
                .unwrap_err(),
            CourseHubError::Forbidden(_)
        ));
        let updated = update_course(&storage, &admin, course.id, update)
            .await
            .unwrap();
        assert_eq!(updated.subtitle, "Ownership in depth");

        assert!(matches!(
            recompute_totals(&storage, &owner, 9999).await.unwrap_err(),
            CourseHubError::NotFound(_)
        ));
    }

    #[tokio::test]
    async fn test_publish_requires_a_lecture() {
        let storage = SeaOrmStorage::new_in_memory().await;
        let owner = fixtures::user(&storage, "o@example.com", UserRole::Instructor).await;
        let course = fixtures::draft_course(&storage, &owner, "Rust", "Development").await;

        assert!(matches!(
            publish_course(&storage, &owner, course.id, true)
                .await
                .unwrap_err(),
            CourseHubError::Validation(_)
        ));

        let section = fixtures::section(&storage, course.id, "Intro").await;
        fixtures::lecture(&storage, section.id, "Hello", 30).await;
        let published = publish_course(&storage, &owner, course.id, true)
            .await
            .unwrap();
        assert!(published.is_published);

        let unpublished = publish_course(&storage, &owner, course.id, false)
            .await
            .unwrap();
        assert!(!unpublished.is_published);
    }
}
