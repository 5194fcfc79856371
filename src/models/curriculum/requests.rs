use serde::Deserialize;
use ts_rs::TS;

// 章节创建/重命名请求
#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "curriculum.ts")]
pub struct SectionRequest {
    pub title: String,
}

// 课时创建请求
#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "curriculum.ts")]
pub struct CreateLectureRequest {
    pub title: String,
    #[serde(default)]
    pub duration_in_seconds: i64,
    #[serde(default)]
    pub is_preview: bool,
}

/// 课时更新内容（由 multipart 表单解析得到）
#[derive(Debug, Default, Clone)]
pub struct LecturePatch {
    pub title: Option<String>,
    pub duration_in_seconds: Option<i64>,
    pub is_preview: Option<bool>,
}

impl LecturePatch {
    /// 校验携带的字段，未携带的字段不校验
    pub fn validate(&self) -> crate::errors::Result<()> {
        if let Some(title) = &self.title {
            crate::utils::validate::validate_required_text(title, "Lecture title")?;
        }
        if matches!(self.duration_in_seconds, Some(duration) if duration < 0) {
            return Err(crate::errors::CourseHubError::validation(
                "Duration in seconds cannot be negative",
            ));
        }
        Ok(())
    }
}

/// 新上传视频的存储信息
#[derive(Debug, Clone)]
pub struct LectureVideo {
    pub url: String,
    pub public_id: String,
}
