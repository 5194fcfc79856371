//! 章节与课时管理
//!
//! 统计字段的维护全部在存储层事务内完成；这里负责权限、媒体对象的上传与清理。

pub mod lectures;
pub mod sections;

use actix_multipart::Multipart;
use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;

use crate::errors::{CourseHubError, Result};
use crate::media::MediaStore;
use crate::models::courses::entities::Course;
use crate::models::curriculum::entities::{Lecture, Section};
use crate::models::curriculum::requests::{CreateLectureRequest, SectionRequest};
use crate::models::users::entities::User;
use crate::models::ErrorCode;
use crate::services::courses::load_managed_course;
use crate::storage::Storage;

pub struct CurriculumService {
    storage: Option<Arc<dyn Storage>>,
}

pub(crate) async fn load_managed_section(
    storage: &dyn Storage,
    user: &User,
    section_id: i64,
) -> Result<(Section, Course)> {
    let section = storage
        .get_section_by_id(section_id)
        .await?
        .ok_or_else(|| CourseHubError::not_found(format!("Section {section_id} not found")))?;
    let course = load_managed_course(storage, user, section.course_id).await?;
    Ok((section, course))
}

pub(crate) async fn load_managed_lecture(
    storage: &dyn Storage,
    user: &User,
    lecture_id: i64,
) -> Result<(Lecture, Section)> {
    let lecture = storage
        .get_lecture_by_id(lecture_id)
        .await?
        .ok_or_else(|| CourseHubError::not_found(format!("Lecture {lecture_id} not found")))?;
    let (section, _) = load_managed_section(storage, user, lecture.section_id).await?;
    Ok((lecture, section))
}

/// 章节/课时错误码
fn curriculum_error_response(err: &CourseHubError, not_found: ErrorCode) -> HttpResponse {
    match err {
        CourseHubError::NotFound(_) => crate::services::error_response_with(err, not_found),
        CourseHubError::Forbidden(_) => {
            crate::services::error_response_with(err, ErrorCode::CoursePermissionDenied)
        }
        _ => crate::services::error_response(err),
    }
}

impl CurriculumService {
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

    pub async fn create_section(
        &self,
        request: &HttpRequest,
        course_id: i64,
        section_request: SectionRequest,
    ) -> ActixResult<HttpResponse> {
        sections::handle_create_section(self, request, course_id, section_request).await
    }

    pub async fn rename_section(
        &self,
        request: &HttpRequest,
        section_id: i64,
        section_request: SectionRequest,
    ) -> ActixResult<HttpResponse> {
        sections::handle_rename_section(self, request, section_id, section_request).await
    }

    pub async fn delete_section(
        &self,
        request: &HttpRequest,
        section_id: i64,
    ) -> ActixResult<HttpResponse> {
        sections::handle_delete_section(self, request, section_id).await
    }

    pub async fn create_lecture(
        &self,
        request: &HttpRequest,
        section_id: i64,
        lecture_request: CreateLectureRequest,
    ) -> ActixResult<HttpResponse> {
        lectures::handle_create_lecture(self, request, section_id, lecture_request).await
    }

    pub async fn update_lecture(
        &self,
        request: &HttpRequest,
        lecture_id: i64,
        payload: Multipart,
    ) -> ActixResult<HttpResponse> {
        lectures::handle_update_lecture(self, request, lecture_id, payload).await
    }

    pub async fn delete_lecture(
        &self,
        request: &HttpRequest,
        lecture_id: i64,
    ) -> ActixResult<HttpResponse> {
        lectures::handle_delete_lecture(self, request, lecture_id).await
    }
}
