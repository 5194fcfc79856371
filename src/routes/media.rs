use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use once_cell::sync::Lazy;

use crate::services::MediaService;

static MEDIA_SERVICE: Lazy<MediaService> = Lazy::new(MediaService::new_lazy);

// 对象 id 形如 videos/<uuid>.mp4，需要尾部匹配
pub async fn serve_media(
    req: HttpRequest,
    public_id: web::Path<String>,
) -> ActixResult<HttpResponse> {
    MEDIA_SERVICE.serve(&req, &public_id.into_inner()).await
}

// 配置路由
pub fn configure_media_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/media/{public_id:.*}").route(web::get().to(serve_media)));
}
