use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;
use tracing::info;

use crate::errors::CourseHubError;
use crate::models::reviews::requests::CreateReviewRequest;
use crate::models::{ApiResponse, ErrorCode};
use crate::storage::Storage;

pub struct ReviewService {
    storage: Option<Arc<dyn Storage>>,
}

impl ReviewService {
    pub fn new_lazy() -> Self {
        Self { storage: None }
    }

    pub(crate) fn get_storage(&self, request: &HttpRequest) -> Arc<dyn Storage> {
        match &self.storage {
            Some(storage) => storage.clone(),
            None => super::app_storage(request),
        }
    }

    pub async fn list_reviews(
        &self,
        request: &HttpRequest,
        course_id: i64,
    ) -> ActixResult<HttpResponse> {
        match self.get_storage(request).list_reviews(course_id).await {
            Ok(reviews) => Ok(HttpResponse::Ok().json(ApiResponse::success(
                reviews,
                "Reviews retrieved successfully",
            ))),
            Err(e) => Ok(super::error_response(&e)),
        }
    }

    /// 发表评价，课程评分在同一事务内重算
    pub async fn create_review(
        &self,
        request: &HttpRequest,
        course_id: i64,
        review_request: CreateReviewRequest,
    ) -> ActixResult<HttpResponse> {
        let user = match super::current_user(request) {
            Ok(user) => user,
            Err(response) => return Ok(response),
        };

        match self
            .get_storage(request)
            .create_review(
                course_id,
                user.id,
                review_request.rating,
                &review_request.comment,
            )
            .await
        {
            Ok(created) => {
                info!(
                    "User {} reviewed course {}, rating now {} ({} reviews)",
                    user.id, course_id, created.ratings, created.num_of_reviews
                );
                Ok(HttpResponse::Created().json(ApiResponse::success(
                    created,
                    "Review created successfully",
                )))
            }
            Err(e) => {
                let code = match &e {
                    CourseHubError::Conflict(_) => ErrorCode::ReviewAlreadyExists,
                    CourseHubError::Forbidden(_) => ErrorCode::ReviewNotEnrolled,
                    CourseHubError::NotFound(_) => ErrorCode::CourseNotFound,
                    _ => return Ok(super::error_response(&e)),
                };
                Ok(super::error_response_with(&e, code))
            }
        }
    }
}
