pub mod learning;
pub mod photo;
pub mod profile;

use actix_multipart::Multipart;
use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;

use crate::media::MediaStore;
use crate::models::users::requests::UpdateProfileRequest;
use crate::storage::Storage;

pub struct UserService {
    storage: Option<Arc<dyn Storage>>,
}

impl UserService {
    pub fn new_lazy() -> Self {
        Self { storage: None }
    }

    pub(crate) fn get_storage(&self, request: &HttpRequest) -> Arc<dyn Storage> {
        match &self.storage {
            Some(storage) => storage.clone(),
            None => super::app_storage(request),
        }
    }

    pub(crate) fn get_media(&self, request: &HttpRequest) -> Arc<dyn MediaStore> {
        super::app_media(request)
    }

    pub async fn update_profile(
        &self,
        request: &HttpRequest,
        update: UpdateProfileRequest,
    ) -> ActixResult<HttpResponse> {
        profile::handle_update_profile(self, request, update).await
    }

    pub async fn upload_photo(
        &self,
        request: &HttpRequest,
        payload: Multipart,
    ) -> ActixResult<HttpResponse> {
        photo::handle_upload_photo(self, request, payload).await
    }

    pub async fn list_my_courses(&self, request: &HttpRequest) -> ActixResult<HttpResponse> {
        learning::handle_list_my_courses(self, request).await
    }

    pub async fn list_my_purchases(&self, request: &HttpRequest) -> ActixResult<HttpResponse> {
        learning::handle_list_my_purchases(self, request).await
    }
}
