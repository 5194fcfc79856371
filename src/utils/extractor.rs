//! 路径参数安全提取器
//!
//! 解析失败时直接返回统一格式的 400 响应，处理函数无需重复校验。

use actix_web::dev::Payload;
use actix_web::error::InternalError;
use actix_web::{FromRequest, HttpRequest, HttpResponse};
use std::future::{Ready, ready};

use crate::models::{ApiResponse, ErrorCode};

fn bad_param(message: String) -> actix_web::Error {
    let response =
        HttpResponse::BadRequest().json(ApiResponse::error_empty(ErrorCode::BadRequest, &message));
    InternalError::from_response(message, response).into()
}

/// 读取正整数 id 路径参数
fn parse_positive_id(req: &HttpRequest, param: &str) -> Result<i64, actix_web::Error> {
    let raw = req
        .match_info()
        .get(param)
        .ok_or_else(|| bad_param(format!("Missing path parameter '{param}'")))?;
    match raw.parse::<i64>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(bad_param(format!("Invalid {param}: '{raw}'"))),
    }
}

macro_rules! define_safe_i64_extractor {
    ($name:ident, $param:literal) => {
        #[derive(Debug, Clone, Copy)]
        pub struct $name(pub i64);

        impl FromRequest for $name {
            type Error = actix_web::Error;
            type Future = Ready<Result<Self, Self::Error>>;

            fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
                ready(parse_positive_id(req, $param).map($name))
            }
        }
    };
}

define_safe_i64_extractor!(SafeCourseIdI64, "course_id");
define_safe_i64_extractor!(SafeSectionIdI64, "section_id");
define_safe_i64_extractor!(SafeLectureIdI64, "lecture_id");

/// 文章 slug 路径参数
#[derive(Debug, Clone)]
pub struct SafeSlug(pub String);

impl FromRequest for SafeSlug {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let slug = req.match_info().get("slug").unwrap_or_default();
        ready(match crate::utils::validate::validate_slug(slug) {
            Ok(()) => Ok(SafeSlug(slug.to_string())),
            Err(msg) => Err(bad_param(msg.to_string())),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    #[actix_web::test]
    async fn test_extracts_positive_id() {
        let req = TestRequest::default()
            .param("course_id", "15")
            .to_http_request();
        let id = SafeCourseIdI64::extract(&req).await.unwrap();
        assert_eq!(id.0, 15);
    }

    #[actix_web::test]
    async fn test_rejects_non_positive_or_garbage() {
        for raw in ["0", "-3", "abc"] {
            let req = TestRequest::default()
                .param("lecture_id", raw)
                .to_http_request();
            assert!(SafeLectureIdI64::extract(&req).await.is_err());
        }
    }

    #[actix_web::test]
    async fn test_slug_extractor() {
        let req = TestRequest::default()
            .param("slug", "getting-started")
            .to_http_request();
        assert_eq!(SafeSlug::extract(&req).await.unwrap().0, "getting-started");

        let req = TestRequest::default()
            .param("slug", "Not A Slug")
            .to_http_request();
        assert!(SafeSlug::extract(&req).await.is_err());
    }
}
