use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::errors::{CourseHubError, Result};

/// 文章内容块
///
/// 以 `type` 字段区分的封闭变体集合，序列化为 JSON 数组存储。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(tag = "type", rename_all = "snake_case")]
#[ts(export, export_to = "article.ts")]
pub enum ContentBlock {
    Heading {
        text: String,
        level: u8,
    },
    Paragraph {
        text: String,
    },
    ListItem {
        text: String,
    },
    Image {
        url: String,
        alt: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        caption: Option<String>,
    },
}

impl ContentBlock {
    pub fn validate(&self) -> Result<()> {
        match self {
            ContentBlock::Heading { text, level } => {
                if !(1..=6).contains(level) {
                    return Err(CourseHubError::validation(format!(
                        "Heading level must be between 1 and 6, got {level}"
                    )));
                }
                non_empty(text, "Heading text")
            }
            ContentBlock::Paragraph { text } => non_empty(text, "Paragraph text"),
            ContentBlock::ListItem { text } => non_empty(text, "List item text"),
            ContentBlock::Image { url, .. } => non_empty(url, "Image url"),
        }
    }
}

fn non_empty(value: &str, field: &str) -> Result<()> {
    if value.trim().is_empty() {
        Err(CourseHubError::validation(format!("{field} cannot be empty")))
    } else {
        Ok(())
    }
}

// 文章
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "article.ts")]
pub struct Article {
    pub id: i64,
    pub author_id: i64,
    pub title: String,
    pub slug: String,
    pub summary: Option<String>,
    pub content: Vec<ContentBlock>,
    pub is_published: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_block_tagged_json() {
        let json = r#"[
            {"type":"heading","text":"Intro","level":2},
            {"type":"paragraph","text":"Hello"},
            {"type":"list_item","text":"one"},
            {"type":"image","url":"http://x/y.png","alt":"y"}
        ]"#;
        let blocks: Vec<ContentBlock> = serde_json::from_str(json).unwrap();
        assert_eq!(blocks.len(), 4);
        assert!(matches!(blocks[0], ContentBlock::Heading { level: 2, .. }));
        assert!(matches!(
            &blocks[3],
            ContentBlock::Image { caption: None, .. }
        ));
    }

    #[test]
    fn test_unknown_block_type_rejected() {
        let json = r#"{"type":"video","url":"x"}"#;
        assert!(serde_json::from_str::<ContentBlock>(json).is_err());
    }

    #[test]
    fn test_heading_level_validation() {
        let bad = ContentBlock::Heading {
            text: "T".into(),
            level: 7,
        };
        assert!(matches!(bad.validate(), Err(CourseHubError::Validation(_))));
        let ok = ContentBlock::Heading {
            text: "T".into(),
            level: 6,
        };
        assert!(ok.validate().is_ok());
    }
}
