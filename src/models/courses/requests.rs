use super::entities::{CourseLevel, CoursePrice};
use crate::models::common::PaginationQuery;
use serde::Deserialize;
use ts_rs::TS;

// 课程创建请求
#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export, export_to = "course.ts")]
pub struct CreateCourseRequest {
    pub title: String,
    #[serde(default)]
    pub subtitle: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_language")]
    pub language: String,
    pub category: String,
    #[serde(default = "default_level")]
    pub level: CourseLevel,
    pub price: CoursePrice,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
    #[serde(default)]
    pub learnings: Vec<String>,
    #[serde(default)]
    pub requirements: Vec<String>,
    #[serde(default)]
    pub includes: Vec<String>,
}

fn default_language() -> String {
    "English".to_string()
}

fn default_level() -> CourseLevel {
    CourseLevel::AllLevels
}

// 课程更新请求，统计字段不可通过此接口修改
#[derive(Debug, Clone, Default, Deserialize, TS)]
#[ts(export, export_to = "course.ts")]
pub struct UpdateCourseRequest {
    pub title: Option<String>,
    pub subtitle: Option<String>,
    pub description: Option<String>,
    pub language: Option<String>,
    pub category: Option<String>,
    pub level: Option<CourseLevel>,
    pub price: Option<CoursePrice>,
    pub thumbnail_url: Option<String>,
    pub is_bestseller: Option<bool>,
    pub learnings: Option<Vec<String>>,
    pub requirements: Option<Vec<String>>,
    pub includes: Option<Vec<String>>,
}

// 发布/下架查询参数
#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "course.ts")]
pub struct PublishQuery {
    #[serde(default = "default_publish")]
    pub publish: bool,
}

fn default_publish() -> bool {
    true
}

// 已发布课程列表查询
#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "course.ts")]
pub struct PublishedCourseQuery {
    #[serde(flatten)]
    #[ts(flatten)]
    pub pagination: PaginationQuery,
    pub category: Option<String>,
}
