use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use once_cell::sync::Lazy;

use crate::middlewares;
use crate::models::reviews::requests::CreateReviewRequest;
use crate::services::ReviewService;
use crate::utils::SafeCourseIdI64;

static REVIEW_SERVICE: Lazy<ReviewService> = Lazy::new(ReviewService::new_lazy);

pub async fn list_reviews(req: HttpRequest, course_id: SafeCourseIdI64) -> ActixResult<HttpResponse> {
    REVIEW_SERVICE.list_reviews(&req, course_id.0).await
}

pub async fn create_review(
    req: HttpRequest,
    course_id: SafeCourseIdI64,
    body: web::Json<CreateReviewRequest>,
) -> ActixResult<HttpResponse> {
    REVIEW_SERVICE
        .create_review(&req, course_id.0, body.into_inner())
        .await
}

// 配置路由
pub fn configure_review_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/reviews").service(
            web::resource("/{course_id}")
                .route(web::get().to(list_reviews))
                // 发表评价 - 已选课用户，业务层校验选课关系
                .route(
                    web::post()
                        .to(create_review)
                        .wrap(middlewares::RequireJWT),
                ),
        ),
    );
}
