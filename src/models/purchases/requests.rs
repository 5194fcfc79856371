use serde::Deserialize;
use ts_rs::TS;

#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "purchase.ts")]
pub struct InitiatePurchaseRequest {
    pub course_id: i64,
}

// 网关成功回调 ?data=<base64>
#[derive(Debug, Deserialize)]
pub struct CompletePaymentQuery {
    pub data: String,
}

// 网关失败跳转，签名负载可选
#[derive(Debug, Deserialize)]
pub struct FailedPaymentQuery {
    pub data: Option<String>,
    pub transaction_uuid: Option<String>,
}

/// eSewa 回调载荷（base64 解码后的 JSON）
///
/// 签名按 `signed_field_names` 中的字段顺序，对原始 JSON 值计算，
/// 因此同时保留原始字段表。
#[derive(Debug, Clone)]
pub struct EsewaCallback {
    pub transaction_code: String,
    pub status: String,
    pub total_amount: Option<f64>,
    pub transaction_uuid: String,
    pub product_code: String,
    pub signed_field_names: String,
    pub signature: String,
    pub raw: serde_json::Map<String, serde_json::Value>,
}

impl EsewaCallback {
    /// 网关成功状态
    pub const STATUS_COMPLETE: &'static str = "COMPLETE";

    pub fn is_complete(&self) -> bool {
        self.status == Self::STATUS_COMPLETE
    }
}
