use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use crate::models::ApiResponse;

use super::UserService;

/// 我已选的课程
pub async fn handle_list_my_courses(
    service: &UserService,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let user = match crate::services::current_user(request) {
        Ok(user) => user,
        Err(response) => return Ok(response),
    };

    match service
        .get_storage(request)
        .list_enrolled_courses(user.id)
        .await
    {
        Ok(courses) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            courses,
            "Enrolled courses retrieved successfully",
        ))),
        Err(e) => Ok(crate::services::error_response(&e)),
    }
}

/// 我的购买记录
pub async fn handle_list_my_purchases(
    service: &UserService,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let user = match crate::services::current_user(request) {
        Ok(user) => user,
        Err(response) => return Ok(response),
    };

    match service
        .get_storage(request)
        .list_purchases_by_user(user.id)
        .await
    {
        Ok(purchases) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            purchases,
            "Purchases retrieved successfully",
        ))),
        Err(e) => Ok(crate::services::error_response(&e)),
    }
}
