use serde::Deserialize;
use ts_rs::TS;

// 分类创建请求，slug 缺省时由名称生成
#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "category.ts")]
pub struct CreateCategoryRequest {
    pub name: String,
    #[serde(default)]
    pub slug: Option<String>,
}
