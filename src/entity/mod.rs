//! SeaORM 实体定义
//!
//! 这些实体用于数据库操作，与 models 模块中的业务实体分离。
//! Storage 层使用这些实体进行 CRUD 操作，然后转换为 models 中的业务实体。

pub mod prelude;

pub mod articles;
pub mod categories;
pub mod course_purchases;
pub mod courses;
pub mod enrollments;
pub mod lectures;
pub mod reviews;
pub mod search_suggestions;
pub mod sections;
pub mod users;

use chrono::{DateTime, Utc};

/// 将 unix 秒转换为 UTC 时间
pub(crate) fn to_datetime(ts: i64) -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp(ts, 0).unwrap_or_default()
}

/// 解析 JSON 文本列，损坏的数据按默认值处理
pub(crate) fn from_json_text<T: serde::de::DeserializeOwned + Default>(raw: &str) -> T {
    serde_json::from_str(raw).unwrap_or_default()
}
