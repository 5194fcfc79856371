//! 业务服务层
//!
//! 每个领域一个 `XxxService`，由路由层通过懒加载的全局实例调用。
//! 可独立测试的业务流程写成接收 `&dyn Storage` / `&dyn MediaStore` 的函数，
//! 处理函数只负责取参数、调用流程并生成响应。

pub mod articles;
pub mod auth;
pub mod categories;
pub mod courses;
pub mod curriculum;
pub mod media;
pub mod purchases;
pub mod reviews;
pub mod search;
pub mod users;

pub use articles::ArticleService;
pub use auth::AuthService;
pub use categories::CategoryService;
pub use courses::CourseService;
pub use curriculum::CurriculumService;
pub use media::MediaService;
pub use purchases::PurchaseService;
pub use reviews::ReviewService;
pub use search::SearchService;
pub use users::UserService;

use actix_web::{HttpRequest, HttpResponse, web};
use std::sync::Arc;
use tracing::{debug, error};

use crate::cache::ObjectCache;
use crate::errors::CourseHubError;
use crate::media::{MediaStore, UploadError};
use crate::middlewares::RequireJWT;
use crate::models::users::entities::User;
use crate::models::{ApiResponse, ErrorCode};
use crate::storage::Storage;

pub(crate) fn app_storage(request: &HttpRequest) -> Arc<dyn Storage> {
    request
        .app_data::<web::Data<Arc<dyn Storage>>>()
        .expect("Storage not found in app data")
        .get_ref()
        .clone()
}

pub(crate) fn app_media(request: &HttpRequest) -> Arc<dyn MediaStore> {
    request
        .app_data::<web::Data<Arc<dyn MediaStore>>>()
        .expect("Media store not found in app data")
        .get_ref()
        .clone()
}

pub(crate) fn app_cache(request: &HttpRequest) -> Option<Arc<dyn ObjectCache>> {
    request
        .app_data::<web::Data<Arc<dyn ObjectCache>>>()
        .map(|data| data.get_ref().clone())
}

/// 将业务错误转换为统一响应
pub(crate) fn error_response(err: &CourseHubError) -> HttpResponse {
    if err.is_internal() {
        error!("{}", err);
    } else {
        debug!("{}", err);
    }
    HttpResponse::build(err.status()).json(ApiResponse::error_empty(
        ErrorCode::from(err),
        err.message(),
    ))
}

/// 同上，但使用领域错误码
pub(crate) fn error_response_with(err: &CourseHubError, code: ErrorCode) -> HttpResponse {
    if err.is_internal() {
        return error_response(err);
    }
    debug!("{}", err);
    HttpResponse::build(err.status()).json(ApiResponse::error_empty(code, err.message()))
}

pub(crate) fn upload_error_response(err: &UploadError) -> HttpResponse {
    debug!("Upload rejected: {}", err);
    let body = ApiResponse::error_empty(err.error_code(), err.to_string());
    match err {
        UploadError::SizeExceeded(_) => HttpResponse::PayloadTooLarge().json(body),
        _ => HttpResponse::BadRequest().json(body),
    }
}

pub(crate) fn unauthorized_response() -> HttpResponse {
    HttpResponse::Unauthorized().json(ApiResponse::error_empty(
        ErrorCode::Unauthorized,
        "Unauthorized access, please login",
    ))
}

/// 需要登录的接口中取当前用户
pub(crate) fn current_user(request: &HttpRequest) -> Result<User, HttpResponse> {
    RequireJWT::extract_user_claims(request).ok_or_else(unauthorized_response)
}
