use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use crate::models::ApiResponse;
use crate::models::courses::requests::PublishedCourseQuery;

use super::CourseService;

pub async fn handle_list_published(
    service: &CourseService,
    request: &HttpRequest,
    query: PublishedCourseQuery,
) -> ActixResult<HttpResponse> {
    match service
        .get_storage(request)
        .list_published_courses(query)
        .await
    {
        Ok(response) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            response,
            "Courses retrieved successfully",
        ))),
        Err(e) => Ok(crate::services::error_response(&e)),
    }
}

/// 当前讲师创建的课程（含草稿）
pub async fn handle_list_mine(
    service: &CourseService,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let user = match crate::services::current_user(request) {
        Ok(user) => user,
        Err(response) => return Ok(response),
    };

    match service
        .get_storage(request)
        .list_courses_by_creator(user.id)
        .await
    {
        Ok(courses) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            courses,
            "Courses retrieved successfully",
        ))),
        Err(e) => Ok(crate::services::error_response(&e)),
    }
}
