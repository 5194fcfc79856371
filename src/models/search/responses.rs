use serde::Serialize;
use ts_rs::TS;

// 联合搜索中的课程条目
#[derive(Debug, Clone, Serialize, TS)]
#[ts(export, export_to = "search.ts")]
pub struct CourseSuggestion {
    pub id: i64,
    pub title: String,
    pub subtitle: String,
    pub category: String,
    pub thumbnail_url: Option<String>,
    pub creator_name: String,
}

#[derive(Debug, Clone, Serialize, TS)]
#[ts(export, export_to = "search.ts")]
pub struct SearchSuggestionsResponse {
    pub courses: Vec<CourseSuggestion>,
    pub suggestions: Vec<String>,
}
