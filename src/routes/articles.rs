use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use once_cell::sync::Lazy;

use crate::middlewares;
use crate::models::articles::requests::CreateArticleRequest;
use crate::models::users::entities::UserRole;
use crate::services::ArticleService;
use crate::utils::SafeSlug;

static ARTICLE_SERVICE: Lazy<ArticleService> = Lazy::new(ArticleService::new_lazy);

pub async fn list_articles(req: HttpRequest) -> ActixResult<HttpResponse> {
    ARTICLE_SERVICE.list_articles(&req).await
}

pub async fn create_article(
    req: HttpRequest,
    body: web::Json<CreateArticleRequest>,
) -> ActixResult<HttpResponse> {
    ARTICLE_SERVICE.create_article(&req, body.into_inner()).await
}

pub async fn get_article(req: HttpRequest, slug: SafeSlug) -> ActixResult<HttpResponse> {
    ARTICLE_SERVICE.get_article(&req, &slug.0).await
}

// 配置路由
pub fn configure_article_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/articles")
            .service(
                web::resource("")
                    .route(web::get().to(list_articles))
                    // 发表文章 - 仅讲师和管理员
                    .route(
                        web::post()
                            .to(create_article)
                            .wrap(middlewares::RequireRole::new_any(UserRole::instructor_roles()))
                            .wrap(middlewares::RequireJWT),
                    ),
            )
            .service(web::resource("/{slug}").route(web::get().to(get_article))),
    );
}
