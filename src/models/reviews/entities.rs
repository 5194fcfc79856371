use serde::{Deserialize, Serialize};
use ts_rs::TS;

// 课程评价
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "review.ts")]
pub struct Review {
    pub id: i64,
    pub course_id: i64,
    pub user_id: i64,
    pub rating: i32,
    pub comment: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}
