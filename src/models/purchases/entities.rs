use serde::{Deserialize, Serialize};
use ts_rs::TS;

// 购买状态：pending -> completed | failed，后两者为终态
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "purchase.ts")]
pub enum PurchaseStatus {
    Pending,
    Completed,
    Failed,
}

impl std::fmt::Display for PurchaseStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PurchaseStatus::Pending => write!(f, "pending"),
            PurchaseStatus::Completed => write!(f, "completed"),
            PurchaseStatus::Failed => write!(f, "failed"),
        }
    }
}

impl std::str::FromStr for PurchaseStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(PurchaseStatus::Pending),
            "completed" => Ok(PurchaseStatus::Completed),
            "failed" => Ok(PurchaseStatus::Failed),
            _ => Err(format!("Invalid purchase status: {s}")),
        }
    }
}

// 课程购买记录
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "purchase.ts")]
pub struct CoursePurchase {
    pub id: i64,
    pub transaction_uuid: String,
    pub course_id: i64,
    pub user_id: i64,
    pub amount: f64,
    pub status: PurchaseStatus,
    pub payment_id: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}
