use super::entities::Review;
use crate::models::users::responses::PublicUser;
use serde::Serialize;
use ts_rs::TS;

// 评价列表项
#[derive(Debug, Clone, Serialize, TS)]
#[ts(export, export_to = "review.ts")]
pub struct ReviewWithUser {
    #[serde(flatten)]
    #[ts(flatten)]
    pub review: Review,
    pub user: Option<PublicUser>,
}

// 发表评价后的课程评分
#[derive(Debug, Clone, Serialize, TS)]
#[ts(export, export_to = "review.ts")]
pub struct CreateReviewResponse {
    pub review: Review,
    pub ratings: f64,
    pub num_of_reviews: i64,
}
