use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use once_cell::sync::Lazy;

use crate::middlewares::RateLimit;
use crate::models::search::requests::{CourseSearchQuery, SuggestionQuery};
use crate::services::SearchService;

static SEARCH_SERVICE: Lazy<SearchService> = Lazy::new(SearchService::new_lazy);

// 挂载在课程路由下：GET /courses/search
pub async fn search_courses(
    req: HttpRequest,
    query: web::Query<CourseSearchQuery>,
) -> ActixResult<HttpResponse> {
    SEARCH_SERVICE.search_courses(&req, query.into_inner()).await
}

// 挂载在课程路由下：GET /courses/recommendations
pub async fn recommendations(req: HttpRequest) -> ActixResult<HttpResponse> {
    SEARCH_SERVICE.recommendations(&req).await
}

pub async fn suggestions(
    req: HttpRequest,
    query: web::Query<SuggestionQuery>,
) -> ActixResult<HttpResponse> {
    SEARCH_SERVICE.suggestions(&req, query.into_inner()).await
}

// 配置路由
pub fn configure_search_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/api/v1/search")
            .wrap(RateLimit::api())
            .route(web::get().to(suggestions)),
    );
}
