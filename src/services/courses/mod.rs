pub mod detail;
pub mod list;
pub mod manage;

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;

use crate::errors::{CourseHubError, Result};
use crate::models::courses::entities::Course;
use crate::models::courses::requests::{
    CreateCourseRequest, PublishQuery, PublishedCourseQuery, UpdateCourseRequest,
};
use crate::models::users::entities::{User, UserRole};
use crate::storage::Storage;

pub struct CourseService {
    storage: Option<Arc<dyn Storage>>,
}

/// 课程创建者或管理员
pub(crate) fn can_manage(user: &User, course: &Course) -> bool {
    user.role == UserRole::Admin || course.creator_id == user.id
}

/// 读取课程并确认当前用户有管理权限
pub(crate) async fn load_managed_course(
    storage: &dyn Storage,
    user: &User,
    course_id: i64,
) -> Result<Course> {
    let course = storage
        .get_course_by_id(course_id)
        .await?
        .ok_or_else(|| CourseHubError::not_found(format!("Course {course_id} not found")))?;
    if !can_manage(user, &course) {
        return Err(CourseHubError::forbidden(
            "You do not have permission to modify this course",
        ));
    }
    Ok(course)
}

impl CourseService {
    pub fn new_lazy() -> Self {
        Self { storage: None }
    }

    pub(crate) fn get_storage(&self, request: &HttpRequest) -> Arc<dyn Storage> {
        match &self.storage {
            Some(storage) => storage.clone(),
            None => super::app_storage(request),
        }
    }

    pub async fn create_course(
        &self,
        request: &HttpRequest,
        create_request: CreateCourseRequest,
    ) -> ActixResult<HttpResponse> {
        manage::handle_create_course(self, request, create_request).await
    }

    pub async fn update_course(
        &self,
        request: &HttpRequest,
        course_id: i64,
        update: UpdateCourseRequest,
    ) -> ActixResult<HttpResponse> {
        manage::handle_update_course(self, request, course_id, update).await
    }

    pub async fn publish_course(
        &self,
        request: &HttpRequest,
        course_id: i64,
        query: PublishQuery,
    ) -> ActixResult<HttpResponse> {
        manage::handle_publish_course(self, request, course_id, query.publish).await
    }

    pub async fn recompute_totals(
        &self,
        request: &HttpRequest,
        course_id: i64,
    ) -> ActixResult<HttpResponse> {
        manage::handle_recompute_totals(self, request, course_id).await
    }

    pub async fn get_course(
        &self,
        request: &HttpRequest,
        course_id: i64,
    ) -> ActixResult<HttpResponse> {
        detail::handle_get_course(self, request, course_id).await
    }

    pub async fn list_published(
        &self,
        request: &HttpRequest,
        query: PublishedCourseQuery,
    ) -> ActixResult<HttpResponse> {
        list::handle_list_published(self, request, query).await
    }

    pub async fn list_mine(&self, request: &HttpRequest) -> ActixResult<HttpResponse> {
        list::handle_list_mine(self, request).await
    }
}
