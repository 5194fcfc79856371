use serde::{Deserialize, Serialize};
use ts_rs::TS;

// 章节
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "curriculum.ts")]
pub struct Section {
    pub id: i64,
    pub course_id: i64,
    pub title: String,
    pub position: i32,
    pub total_duration_in_seconds: i64,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

// 课时
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "curriculum.ts")]
pub struct Lecture {
    pub id: i64,
    pub section_id: i64,
    pub title: String,
    pub video_url: Option<String>,
    #[serde(skip_serializing, default)]
    #[ts(skip)]
    pub video_public_id: Option<String>,
    pub duration_in_seconds: i64,
    pub is_preview: bool,
    pub position: i32,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}
