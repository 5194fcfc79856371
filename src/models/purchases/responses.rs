use super::entities::CoursePurchase;
use serde::Serialize;
use ts_rs::TS;

// 提交给 eSewa 的签名表单
#[derive(Debug, Clone, Serialize, TS)]
#[ts(export, export_to = "purchase.ts")]
pub struct EsewaPaymentForm {
    pub amount: String,
    pub tax_amount: String,
    pub total_amount: String,
    pub transaction_uuid: String,
    pub product_code: String,
    pub product_service_charge: String,
    pub product_delivery_charge: String,
    pub success_url: String,
    pub failure_url: String,
    pub signed_field_names: String,
    pub signature: String,
}

// 发起购买响应
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "purchase.ts")]
pub struct InitiatePurchaseResponse {
    pub purchase: CoursePurchase,
    pub payment_url: String,
    pub form: EsewaPaymentForm,
}
