//! 业务数据模型
//!
//! 每个领域按 `entities`（业务实体）、`requests`（请求体）、`responses`（响应体）拆分。

pub mod articles;
pub mod auth;
pub mod categories;
pub mod common;
pub mod courses;
pub mod curriculum;
pub mod purchases;
pub mod reviews;
pub mod search;
pub mod users;

pub use common::{ApiResponse, PaginatedResponse, PaginationInfo, PaginationQuery};

use crate::errors::CourseHubError;

/// 程序启动时间
#[derive(Debug, Clone)]
pub struct AppStartTime {
    pub start_datetime: chrono::DateTime<chrono::Utc>,
}

/// 业务错误码
///
/// 0 表示成功，1xxx 为通用错误，其余按领域分段。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ErrorCode {
    Success = 0,

    // 通用
    BadRequest = 1000,
    Unauthorized = 1001,
    Forbidden = 1003,
    NotFound = 1004,
    Conflict = 1009,
    RateLimitExceeded = 1029,
    InternalServerError = 1500,
    UpstreamFailed = 1502,

    // 认证
    AuthFailed = 2000,
    RegisterFailed = 2001,

    // 用户
    UserNotFound = 3000,
    UserAlreadyExists = 3001,
    UserNameInvalid = 3002,
    UserEmailInvalid = 3003,
    UserPasswordInvalid = 3004,
    UserUpdateFailed = 3005,
    UserEmailAlreadyExists = 3006,

    // 媒体
    FileUploadFailed = 4000,
    FileNotFound = 4001,
    FileTypeNotAllowed = 4002,
    FileSizeExceeded = 4003,
    MultifileUploadNotAllowed = 4004,

    // 课程目录
    CourseNotFound = 5000,
    CourseCreationFailed = 5001,
    CoursePermissionDenied = 5002,
    CourseNotPublishable = 5003,
    SectionNotFound = 5100,
    LectureNotFound = 5200,
    CategoryNotFound = 5300,
    CategoryAlreadyExists = 5301,

    // 评价
    ReviewAlreadyExists = 6000,
    ReviewNotEnrolled = 6001,

    // 购买
    PurchaseNotFound = 7000,
    PurchaseAlreadyEnrolled = 7001,
    PaymentSignatureInvalid = 7002,
    PaymentAmountMismatch = 7003,
    PurchaseStateConflict = 7004,

    // 文章
    ArticleNotFound = 8000,
    ArticleSlugAlreadyExists = 8001,
}

impl From<&CourseHubError> for ErrorCode {
    fn from(err: &CourseHubError) -> Self {
        match err {
            CourseHubError::Validation(_) => ErrorCode::BadRequest,
            CourseHubError::NotFound(_) => ErrorCode::NotFound,
            CourseHubError::Forbidden(_) => ErrorCode::Forbidden,
            CourseHubError::Conflict(_) => ErrorCode::Conflict,
            CourseHubError::Authentication(_) => ErrorCode::Unauthorized,
            CourseHubError::Upstream(_) => ErrorCode::UpstreamFailed,
            _ => ErrorCode::InternalServerError,
        }
    }
}
