use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;
use tracing::info;

use crate::cache::{CacheResult, ObjectCacheExt};
use crate::errors::{CourseHubError, Result};
use crate::models::categories::entities::Category;
use crate::models::categories::requests::CreateCategoryRequest;
use crate::models::{ApiResponse, ErrorCode};
use crate::storage::Storage;
use crate::utils::validate::{slugify, validate_name, validate_slug};

const CATEGORIES_CACHE_KEY: &str = "categories:all";

pub struct CategoryService {
    storage: Option<Arc<dyn Storage>>,
}

/// 解析分类名称与 slug
pub(crate) fn normalize_category(req: &CreateCategoryRequest) -> Result<(String, String)> {
    let name = req.name.trim();
    validate_name(name).map_err(CourseHubError::validation)?;
    let slug = match &req.slug {
        Some(slug) => slug.trim().to_string(),
        None => slugify(name),
    };
    validate_slug(&slug).map_err(CourseHubError::validation)?;
    Ok((name.to_string(), slug))
}

impl CategoryService {
    pub fn new_lazy() -> Self {
        Self { storage: None }
    }

    pub(crate) fn get_storage(&self, request: &HttpRequest) -> Arc<dyn Storage> {
        match &self.storage {
            Some(storage) => storage.clone(),
            None => super::app_storage(request),
        }
    }

    pub async fn list_categories(&self, request: &HttpRequest) -> ActixResult<HttpResponse> {
        let cache = super::app_cache(request);
        if let Some(cache) = &cache
            && let CacheResult::Found(categories) =
                cache.get_json::<Vec<Category>>(CATEGORIES_CACHE_KEY).await
        {
            return Ok(HttpResponse::Ok().json(ApiResponse::success(
                categories,
                "Categories retrieved successfully",
            )));
        }

        match self.get_storage(request).list_categories().await {
            Ok(categories) => {
                if let Some(cache) = &cache {
                    cache
                        .insert_json(CATEGORIES_CACHE_KEY.to_string(), &categories, 0)
                        .await;
                }
                Ok(HttpResponse::Ok().json(ApiResponse::success(
                    categories,
                    "Categories retrieved successfully",
                )))
            }
            Err(e) => Ok(super::error_response(&e)),
        }
    }

    pub async fn create_category(
        &self,
        request: &HttpRequest,
        create_request: CreateCategoryRequest,
    ) -> ActixResult<HttpResponse> {
        let (name, slug) = match normalize_category(&create_request) {
            Ok(parsed) => parsed,
            Err(e) => return Ok(super::error_response(&e)),
        };

        match self.get_storage(request).create_category(&name, &slug).await {
            Ok(category) => {
                if let Some(cache) = super::app_cache(request) {
                    cache.remove(CATEGORIES_CACHE_KEY).await;
                }
                info!("Category '{}' created", category.name);
                Ok(HttpResponse::Created().json(ApiResponse::success(
                    category,
                    "Category created successfully",
                )))
            }
            Err(e @ CourseHubError::Conflict(_)) => Ok(super::error_response_with(
                &e,
                ErrorCode::CategoryAlreadyExists,
            )),
            Err(e) => Ok(super::error_response(&e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_category() {
        let req = CreateCategoryRequest {
            name: "  Web Development ".into(),
            slug: None,
        };
        assert_eq!(
            normalize_category(&req).unwrap(),
            ("Web Development".to_string(), "web-development".to_string())
        );

        let req = CreateCategoryRequest {
            name: "Design".into(),
            slug: Some("Bad Slug".into()),
        };
        assert!(normalize_category(&req).is_err());
    }
}
