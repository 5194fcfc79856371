use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use once_cell::sync::Lazy;

use crate::middlewares;
use crate::models::courses::requests::{
    CreateCourseRequest, PublishQuery, PublishedCourseQuery, UpdateCourseRequest,
};
use crate::models::users::entities::UserRole;
use crate::services::CourseService;
use crate::utils::SafeCourseIdI64;

// 懒加载的全局 CourseService 实例
static COURSE_SERVICE: Lazy<CourseService> = Lazy::new(CourseService::new_lazy);

pub async fn create_course(
    req: HttpRequest,
    body: web::Json<CreateCourseRequest>,
) -> ActixResult<HttpResponse> {
    COURSE_SERVICE.create_course(&req, body.into_inner()).await
}

pub async fn list_published(
    req: HttpRequest,
    query: web::Query<PublishedCourseQuery>,
) -> ActixResult<HttpResponse> {
    COURSE_SERVICE.list_published(&req, query.into_inner()).await
}

pub async fn list_mine(req: HttpRequest) -> ActixResult<HttpResponse> {
    COURSE_SERVICE.list_mine(&req).await
}

// 获取课程详情（含大纲），登录可选
pub async fn get_course(req: HttpRequest, course_id: SafeCourseIdI64) -> ActixResult<HttpResponse> {
    COURSE_SERVICE.get_course(&req, course_id.0).await
}

pub async fn update_course(
    req: HttpRequest,
    course_id: SafeCourseIdI64,
    body: web::Json<UpdateCourseRequest>,
) -> ActixResult<HttpResponse> {
    COURSE_SERVICE
        .update_course(&req, course_id.0, body.into_inner())
        .await
}

pub async fn publish_course(
    req: HttpRequest,
    course_id: SafeCourseIdI64,
    query: web::Query<PublishQuery>,
) -> ActixResult<HttpResponse> {
    COURSE_SERVICE
        .publish_course(&req, course_id.0, query.into_inner())
        .await
}

// 修复课程统计
pub async fn recompute_totals(
    req: HttpRequest,
    course_id: SafeCourseIdI64,
) -> ActixResult<HttpResponse> {
    COURSE_SERVICE.recompute_totals(&req, course_id.0).await
}

// 配置路由
pub fn configure_course_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/courses")
            .service(
                web::resource("").route(
                    web::post()
                        .to(create_course)
                        // 创建课程 - 仅讲师和管理员
                        .wrap(middlewares::RequireRole::new_any(UserRole::instructor_roles()))
                        .wrap(middlewares::RequireJWT),
                ),
            )
            .service(web::resource("/published").route(web::get().to(list_published)))
            .service(web::resource("/search").route(web::get().to(super::search::search_courses)))
            // 推荐 - 登录可选，业务层自行解析令牌
            .service(
                web::resource("/recommendations")
                    .route(web::get().to(super::search::recommendations)),
            )
            .service(
                web::resource("/mine")
                    .route(web::get().to(list_mine))
                    .wrap(middlewares::RequireRole::new_any(UserRole::instructor_roles()))
                    .wrap(middlewares::RequireJWT),
            )
            .service(
                web::resource("/{course_id}")
                    .route(web::get().to(get_course))
                    // 更新课程 - 创建者或管理员，业务层校验归属
                    .route(
                        web::put()
                            .to(update_course)
                            .wrap(middlewares::RequireRole::new_any(UserRole::instructor_roles()))
                            .wrap(middlewares::RequireJWT),
                    ),
            )
            .service(
                web::resource("/{course_id}/publish")
                    .route(web::patch().to(publish_course))
                    .wrap(middlewares::RequireRole::new_any(UserRole::instructor_roles()))
                    .wrap(middlewares::RequireJWT),
            )
            .service(
                web::resource("/{course_id}/recompute")
                    .route(web::post().to(recompute_totals))
                    .wrap(middlewares::RequireRole::new_any(UserRole::instructor_roles()))
                    .wrap(middlewares::RequireJWT),
            )
            .service(
                web::resource("/{course_id}/sections")
                    .route(web::post().to(super::curriculum::create_section))
                    .wrap(middlewares::RequireRole::new_any(UserRole::instructor_roles()))
                    .wrap(middlewares::RequireJWT),
            ),
    );
}
