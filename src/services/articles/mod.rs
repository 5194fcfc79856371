use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;
use tracing::info;

use crate::errors::{CourseHubError, Result};
use crate::models::articles::requests::CreateArticleRequest;
use crate::models::{ApiResponse, ErrorCode};
use crate::storage::Storage;
use crate::utils::validate::{slugify, validate_slug};

pub struct ArticleService {
    storage: Option<Arc<dyn Storage>>,
}

/// 使用显式 slug，缺省时由标题生成
pub(crate) fn article_slug(req: &CreateArticleRequest) -> Result<String> {
    let slug = match req.slug.as_deref().map(str::trim) {
        Some(slug) if !slug.is_empty() => slug.to_string(),
        _ => slugify(&req.title),
    };
    validate_slug(&slug).map_err(CourseHubError::validation)?;
    Ok(slug)
}

impl ArticleService {
    pub fn new_lazy() -> Self {
        Self { storage: None }
    }

    pub(crate) fn get_storage(&self, request: &HttpRequest) -> Arc<dyn Storage> {
        match &self.storage {
            Some(storage) => storage.clone(),
            None => super::app_storage(request),
        }
    }

    pub async fn create_article(
        &self,
        request: &HttpRequest,
        create_request: CreateArticleRequest,
    ) -> ActixResult<HttpResponse> {
        let user = match super::current_user(request) {
            Ok(user) => user,
            Err(response) => return Ok(response),
        };
        let slug = match article_slug(&create_request) {
            Ok(slug) => slug,
            Err(e) => return Ok(super::error_response(&e)),
        };

        match self
            .get_storage(request)
            .create_article(user.id, &slug, create_request)
            .await
        {
            Ok(article) => {
                info!("Article '{}' created by user {}", article.slug, user.id);
                Ok(HttpResponse::Created().json(ApiResponse::success(
                    article,
                    "Article created successfully",
                )))
            }
            Err(e @ CourseHubError::Conflict(_)) => Ok(super::error_response_with(
                &e,
                ErrorCode::ArticleSlugAlreadyExists,
            )),
            Err(e) => Ok(super::error_response(&e)),
        }
    }

    pub async fn list_articles(&self, request: &HttpRequest) -> ActixResult<HttpResponse> {
        match self.get_storage(request).list_published_articles().await {
            Ok(articles) => Ok(HttpResponse::Ok().json(ApiResponse::success(
                articles,
                "Articles retrieved successfully",
            ))),
            Err(e) => Ok(super::error_response(&e)),
        }
    }

    pub async fn get_article(&self, request: &HttpRequest, slug: &str) -> ActixResult<HttpResponse> {
        match self.get_storage(request).get_article_by_slug(slug).await {
            Ok(Some(article)) if article.is_published => Ok(HttpResponse::Ok().json(
                ApiResponse::success(article, "Article retrieved successfully"),
            )),
            Ok(_) => Ok(HttpResponse::NotFound().json(ApiResponse::error_empty(
                ErrorCode::ArticleNotFound,
                "Article not found",
            ))),
            Err(e) => Ok(super::error_response(&e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(title: &str, slug: Option<&str>) -> CreateArticleRequest {
        CreateArticleRequest {
            title: title.to_string(),
            slug: slug.map(str::to_string),
            summary: None,
            content: Vec::new(),
            is_published: true,
        }
    }

    #[test]
    fn test_article_slug() {
        assert_eq!(
            article_slug(&request("Why Rust?", None)).unwrap(),
            "why-rust"
        );
        assert_eq!(
            article_slug(&request("Why Rust?", Some(" custom-slug "))).unwrap(),
            "custom-slug"
        );
        assert_eq!(
            article_slug(&request("Why Rust?", Some(""))).unwrap(),
            "why-rust"
        );
        assert!(article_slug(&request("Why Rust?", Some("Not A Slug"))).is_err());
    }
}
