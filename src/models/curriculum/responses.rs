use super::entities::{Lecture, Section};
use serde::Serialize;
use ts_rs::TS;

// 带课时列表的章节
#[derive(Debug, Clone, Serialize, TS)]
#[ts(export, export_to = "curriculum.ts")]
pub struct SectionWithLectures {
    #[serde(flatten)]
    #[ts(flatten)]
    pub section: Section,
    pub lectures: Vec<Lecture>,
}

impl SectionWithLectures {
    /// 对无权观看的用户隐藏非试看课时的视频地址
    pub fn redact_videos(&mut self) {
        for lecture in self.lectures.iter_mut().filter(|l| !l.is_preview) {
            lecture.video_url = None;
        }
    }
}
