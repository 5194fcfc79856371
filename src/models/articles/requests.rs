use super::entities::ContentBlock;
use serde::Deserialize;
use ts_rs::TS;

// 文章创建请求，slug 缺省时由标题生成
#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export, export_to = "article.ts")]
pub struct CreateArticleRequest {
    pub title: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    pub content: Vec<ContentBlock>,
    #[serde(default)]
    pub is_published: bool,
}
