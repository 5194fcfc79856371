use actix_multipart::Multipart;
use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use once_cell::sync::Lazy;

use crate::middlewares::{self, RateLimit};
use crate::models::users::requests::UpdateProfileRequest;
use crate::services::UserService;

// 懒加载的全局 UserService 实例
static USER_SERVICE: Lazy<UserService> = Lazy::new(UserService::new_lazy);

pub async fn update_profile(
    req: HttpRequest,
    update_data: web::Json<UpdateProfileRequest>,
) -> ActixResult<HttpResponse> {
    USER_SERVICE
        .update_profile(&req, update_data.into_inner())
        .await
}

pub async fn upload_photo(req: HttpRequest, payload: Multipart) -> ActixResult<HttpResponse> {
    USER_SERVICE.upload_photo(&req, payload).await
}

pub async fn list_my_courses(req: HttpRequest) -> ActixResult<HttpResponse> {
    USER_SERVICE.list_my_courses(&req).await
}

pub async fn list_my_purchases(req: HttpRequest) -> ActixResult<HttpResponse> {
    USER_SERVICE.list_my_purchases(&req).await
}

// 配置路由
pub fn configure_user_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/users/me")
            .wrap(middlewares::RequireJWT)
            .route("", web::put().to(update_profile))
            .service(
                web::resource("/photo")
                    .wrap(RateLimit::file_upload())
                    .route(web::put().to(upload_photo)),
            )
            .route("/courses", web::get().to(list_my_courses))
            .route("/purchases", web::get().to(list_my_purchases)),
    );
}
