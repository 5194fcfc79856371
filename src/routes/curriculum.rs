use actix_multipart::Multipart;
use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use once_cell::sync::Lazy;

use crate::middlewares::{self, RateLimit};
use crate::models::curriculum::requests::{CreateLectureRequest, SectionRequest};
use crate::models::users::entities::UserRole;
use crate::services::CurriculumService;
use crate::utils::{SafeCourseIdI64, SafeLectureIdI64, SafeSectionIdI64};

// 懒加载的全局 CurriculumService 实例
static CURRICULUM_SERVICE: Lazy<CurriculumService> = Lazy::new(CurriculumService::new_lazy);

// 挂载在课程路由下：POST /courses/{course_id}/sections
pub async fn create_section(
    req: HttpRequest,
    course_id: SafeCourseIdI64,
    body: web::Json<SectionRequest>,
) -> ActixResult<HttpResponse> {
    CURRICULUM_SERVICE
        .create_section(&req, course_id.0, body.into_inner())
        .await
}

pub async fn rename_section(
    req: HttpRequest,
    section_id: SafeSectionIdI64,
    body: web::Json<SectionRequest>,
) -> ActixResult<HttpResponse> {
    CURRICULUM_SERVICE
        .rename_section(&req, section_id.0, body.into_inner())
        .await
}

pub async fn delete_section(
    req: HttpRequest,
    section_id: SafeSectionIdI64,
) -> ActixResult<HttpResponse> {
    CURRICULUM_SERVICE.delete_section(&req, section_id.0).await
}

pub async fn create_lecture(
    req: HttpRequest,
    section_id: SafeSectionIdI64,
    body: web::Json<CreateLectureRequest>,
) -> ActixResult<HttpResponse> {
    CURRICULUM_SERVICE
        .create_lecture(&req, section_id.0, body.into_inner())
        .await
}

// multipart：title、duration_in_seconds、is_preview、video
pub async fn update_lecture(
    req: HttpRequest,
    lecture_id: SafeLectureIdI64,
    payload: Multipart,
) -> ActixResult<HttpResponse> {
    CURRICULUM_SERVICE
        .update_lecture(&req, lecture_id.0, payload)
        .await
}

pub async fn delete_lecture(
    req: HttpRequest,
    lecture_id: SafeLectureIdI64,
) -> ActixResult<HttpResponse> {
    CURRICULUM_SERVICE.delete_lecture(&req, lecture_id.0).await
}

// 配置路由
pub fn configure_curriculum_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/sections")
            .wrap(middlewares::RequireRole::new_any(UserRole::instructor_roles()))
            .wrap(middlewares::RequireJWT)
            .service(
                web::resource("/{section_id}")
                    .route(web::put().to(rename_section))
                    .route(web::delete().to(delete_section)),
            )
            .service(web::resource("/{section_id}/lectures").route(web::post().to(create_lecture))),
    )
    .service(
        web::scope("/api/v1/lectures")
            .wrap(middlewares::RequireRole::new_any(UserRole::instructor_roles()))
            .wrap(middlewares::RequireJWT)
            .service(
                web::resource("/{lecture_id}")
                    .route(
                        web::put()
                            .to(update_lecture)
                            .wrap(RateLimit::file_upload()),
                    )
                    .route(web::delete().to(delete_lecture)),
            ),
    );
}
