//! 搜索与推荐

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;
use tracing::debug;

use crate::middlewares::RequireJWT;
use crate::models::ApiResponse;
use crate::models::search::requests::{CourseSearchQuery, SuggestionQuery};
use crate::storage::Storage;

pub struct SearchService {
    storage: Option<Arc<dyn Storage>>,
}

impl SearchService {
    pub fn new_lazy() -> Self {
        Self { storage: None }
    }

    pub(crate) fn get_storage(&self, request: &HttpRequest) -> Arc<dyn Storage> {
        match &self.storage {
            Some(storage) => storage.clone(),
            None => super::app_storage(request),
        }
    }

    pub async fn search_courses(
        &self,
        request: &HttpRequest,
        query: CourseSearchQuery,
    ) -> ActixResult<HttpResponse> {
        match self.get_storage(request).search_courses(query).await {
            Ok(courses) => Ok(HttpResponse::Ok().json(ApiResponse::success(
                courses,
                "Courses retrieved successfully",
            ))),
            Err(e) => Ok(super::error_response(&e)),
        }
    }

    /// 联合搜索：课程与历史搜索词
    pub async fn suggestions(
        &self,
        request: &HttpRequest,
        query: SuggestionQuery,
    ) -> ActixResult<HttpResponse> {
        match self.get_storage(request).search_suggestions(&query.q).await {
            Ok(suggestions) => Ok(HttpResponse::Ok().json(ApiResponse::success(
                suggestions,
                "Search results retrieved successfully",
            ))),
            Err(e) => Ok(super::error_response(&e)),
        }
    }

    /// 推荐课程，登录可选
    pub async fn recommendations(&self, request: &HttpRequest) -> ActixResult<HttpResponse> {
        let user_id = RequireJWT::authenticate_optional(request)
            .await
            .map(|user| user.id);
        debug!("Recommending courses for {:?}", user_id);

        match self.get_storage(request).recommend_courses(user_id).await {
            Ok(courses) => Ok(HttpResponse::Ok().json(ApiResponse::success(
                courses,
                "Recommendations retrieved successfully",
            ))),
            Err(e) => Ok(super::error_response(&e)),
        }
    }
}
