use super::entities::Course;
use crate::models::common::PaginationInfo;
use crate::models::curriculum::responses::SectionWithLectures;
use crate::models::users::responses::PublicUser;
use serde::Serialize;
use ts_rs::TS;

// 课程详情（含课程大纲）
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "course.ts")]
pub struct CourseDetail {
    #[serde(flatten)]
    #[ts(flatten)]
    pub course: Course,
    pub creator: Option<PublicUser>,
    pub sections: Vec<SectionWithLectures>,
    pub enrolled_students: i64,
    /// 当前用户是否已选课
    pub is_enrolled: bool,
}

// 课程列表响应
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "course.ts")]
pub struct CourseListResponse {
    pub items: Vec<Course>,
    pub pagination: PaginationInfo,
}

// 课程统计重算结果
#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[ts(export, export_to = "course.ts")]
pub struct CourseTotals {
    pub course_id: i64,
    pub total_lectures: i64,
    pub total_duration_in_seconds: i64,
}
