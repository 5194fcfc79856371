use serde::Deserialize;
use ts_rs::TS;

// 价格排序方向
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export, export_to = "search.ts")]
pub enum PriceSort {
    Low,
    High,
}

// 课程搜索参数 ?query=&categories=a,b&sortByPrice=low
#[derive(Debug, Default, Deserialize, TS)]
#[ts(export, export_to = "search.ts")]
pub struct CourseSearchQuery {
    #[serde(default)]
    pub query: Option<String>,
    /// 逗号分隔的分类列表
    #[serde(default)]
    pub categories: Option<String>,
    #[serde(default, rename = "sortByPrice")]
    pub sort_by_price: Option<PriceSort>,
}

impl CourseSearchQuery {
    pub fn category_list(&self) -> Vec<String> {
        self.categories
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_string)
            .collect()
    }
}

// 联合搜索 ?q=
#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "search.ts")]
pub struct SuggestionQuery {
    #[serde(default)]
    pub q: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_list_trims_and_skips_empty() {
        let q = CourseSearchQuery {
            categories: Some(" Development, ,Design ".to_string()),
            ..Default::default()
        };
        assert_eq!(q.category_list(), vec!["Development", "Design"]);
    }

    #[test]
    fn test_sort_by_price_param_name() {
        let q: CourseSearchQuery =
            serde_json::from_str(r#"{"query":"rust","sortByPrice":"high"}"#).unwrap();
        assert_eq!(q.sort_by_price, Some(PriceSort::High));
    }
}
