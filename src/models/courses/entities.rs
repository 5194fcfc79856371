use serde::{Deserialize, Serialize};
use ts_rs::TS;

// 课程难度
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "course.ts")]
pub enum CourseLevel {
    Beginner,
    Intermediate,
    Expert,
    AllLevels,
}

impl std::fmt::Display for CourseLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CourseLevel::Beginner => write!(f, "beginner"),
            CourseLevel::Intermediate => write!(f, "intermediate"),
            CourseLevel::Expert => write!(f, "expert"),
            CourseLevel::AllLevels => write!(f, "all_levels"),
        }
    }
}

impl std::str::FromStr for CourseLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "beginner" => Ok(CourseLevel::Beginner),
            "intermediate" => Ok(CourseLevel::Intermediate),
            "expert" => Ok(CourseLevel::Expert),
            "all_levels" => Ok(CourseLevel::AllLevels),
            _ => Err(format!("Invalid course level: {s}")),
        }
    }
}

// 课程价格
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "course.ts")]
pub struct CoursePrice {
    pub original: f64,
    pub current: f64,
}

// 课程实体
//
// total_lectures / total_duration_in_seconds / ratings / num_of_reviews 为冗余统计字段，
// 只允许目录与评价相关的存储过程修改。
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "course.ts")]
pub struct Course {
    pub id: i64,
    pub creator_id: i64,
    pub title: String,
    pub subtitle: String,
    pub description: String,
    pub language: String,
    pub category: String,
    pub level: CourseLevel,
    pub price: CoursePrice,
    pub thumbnail_url: Option<String>,
    pub is_bestseller: bool,
    pub total_lectures: i64,
    pub total_duration_in_seconds: i64,
    pub learnings: Vec<String>,
    pub requirements: Vec<String>,
    pub includes: Vec<String>,
    pub is_published: bool,
    pub ratings: f64,
    pub num_of_reviews: i64,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}
