use serde::Deserialize;
use ts_rs::TS;

#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "review.ts")]
pub struct CreateReviewRequest {
    pub rating: i32,
    pub comment: String,
}
