use serde::{Deserialize, Serialize};
use ts_rs::TS;

// 课程分类
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "category.ts")]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}
