//! eSewa v2 签名工具
//!
//! 签名为 HMAC-SHA256(secret, "k1=v1,k2=v2,...") 的 base64 编码，
//! 字段顺序由 `signed_field_names` 给出。

use base64::{Engine, engine::general_purpose::STANDARD};
use hmac::{Hmac, Mac};
use serde_json::{Map, Value};
use sha2::Sha256;
use tracing::warn;

use crate::config::EsewaConfig;
use crate::errors::{CourseHubError, Result};
use crate::models::purchases::requests::EsewaCallback;
use crate::models::purchases::responses::EsewaPaymentForm;

type HmacSha256 = Hmac<Sha256>;

/// 发起支付时参与签名的字段
pub const INITIATION_SIGNED_FIELDS: &str = "total_amount,transaction_uuid,product_code";

/// 回调中必须被签名覆盖的字段，否则无法信任状态与金额
const REQUIRED_CALLBACK_FIELDS: [&str; 4] =
    ["transaction_code", "status", "total_amount", "transaction_uuid"];

fn new_mac(secret: &str) -> Result<HmacSha256> {
    HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| CourseHubError::validation(format!("Invalid eSewa secret key: {e}")))
}

/// 计算签名
pub fn sign_message(secret: &str, message: &str) -> Result<String> {
    let mut mac = new_mac(secret)?;
    mac.update(message.as_bytes());
    Ok(STANDARD.encode(mac.finalize().into_bytes()))
}

/// 金额格式化，表单与签名必须使用同一字符串
pub fn format_amount(amount: f64) -> String {
    format!("{amount}")
}

/// 构造提交给网关的签名表单
pub fn build_payment_form(
    config: &EsewaConfig,
    amount: f64,
    transaction_uuid: &str,
) -> Result<EsewaPaymentForm> {
    let total_amount = format_amount(amount);
    let message = format!(
        "total_amount={total_amount},transaction_uuid={transaction_uuid},product_code={}",
        config.product_code
    );
    let signature = sign_message(&config.secret_key, &message)?;

    Ok(EsewaPaymentForm {
        amount: total_amount.clone(),
        tax_amount: "0".to_string(),
        total_amount,
        transaction_uuid: transaction_uuid.to_string(),
        product_code: config.product_code.clone(),
        product_service_charge: "0".to_string(),
        product_delivery_charge: "0".to_string(),
        success_url: config.success_url.clone(),
        failure_url: config.failure_url.clone(),
        signed_field_names: INITIATION_SIGNED_FIELDS.to_string(),
        signature,
    })
}

fn value_to_field(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn parse_amount(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.replace(',', "").trim().parse().ok(),
        _ => None,
    }
}

fn required_string(raw: &Map<String, Value>, key: &str) -> Result<String> {
    raw.get(key)
        .map(value_to_field)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| CourseHubError::validation(format!("Payment payload is missing '{key}'")))
}

/// 解码回调参数 `data`（base64 JSON）
pub fn decode_callback(encoded: &str) -> Result<EsewaCallback> {
    // 查询串中未转义的 '+' 会被解码成空格
    let normalized = encoded.trim().replace(' ', "+");
    let bytes = STANDARD
        .decode(normalized.as_bytes())
        .map_err(|e| CourseHubError::validation(format!("Payment payload is not base64: {e}")))?;
    let raw: Map<String, Value> = serde_json::from_slice(&bytes)
        .map_err(|e| CourseHubError::validation(format!("Payment payload is not JSON: {e}")))?;

    Ok(EsewaCallback {
        transaction_code: required_string(&raw, "transaction_code")?,
        status: required_string(&raw, "status")?,
        total_amount: raw.get("total_amount").and_then(parse_amount),
        transaction_uuid: required_string(&raw, "transaction_uuid")?,
        product_code: required_string(&raw, "product_code")?,
        signed_field_names: required_string(&raw, "signed_field_names")?,
        signature: required_string(&raw, "signature")?,
        raw,
    })
}

/// 按 `signed_field_names` 的顺序拼接待签名字符串
pub fn canonical_message(raw: &Map<String, Value>, signed_field_names: &str) -> Result<String> {
    signed_field_names
        .split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(|name| {
            raw.get(name)
                .map(|value| format!("{name}={}", value_to_field(value)))
                .ok_or_else(|| {
                    CourseHubError::validation(format!("Signed field '{name}' is missing"))
                })
        })
        .collect::<Result<Vec<_>>>()
        .map(|parts| parts.join(","))
}

/// 校验回调签名，使用常量时间比较
pub fn verify_callback(secret: &str, callback: &EsewaCallback) -> Result<()> {
    let signed: Vec<&str> = callback
        .signed_field_names
        .split(',')
        .map(str::trim)
        .collect();
    if let Some(missing) = REQUIRED_CALLBACK_FIELDS
        .iter()
        .find(|field| !signed.contains(field))
    {
        warn!(
            "Payment callback for {} does not sign '{}'",
            callback.transaction_uuid, missing
        );
        return Err(CourseHubError::authentication(
            "Payment signature does not cover required fields",
        ));
    }

    let message = canonical_message(&callback.raw, &callback.signed_field_names)?;
    let provided = STANDARD.decode(callback.signature.as_bytes()).map_err(|_| {
        warn!(
            "Payment callback for {} carries a malformed signature",
            callback.transaction_uuid
        );
        CourseHubError::authentication("Payment signature is malformed")
    })?;

    let mut mac = new_mac(secret)?;
    mac.update(message.as_bytes());
    mac.verify_slice(&provided).map_err(|_| {
        warn!(
            "Payment signature mismatch for transaction {}",
            callback.transaction_uuid
        );
        CourseHubError::authentication("Payment signature mismatch")
    })
}

/// 生成带签名的回调载荷
#[cfg(test)]
pub(crate) fn encode_signed_callback(secret: &str, fields: &[(&str, Value)]) -> String {
    let mut raw = Map::new();
    for (k, v) in fields {
        raw.insert((*k).to_string(), v.clone());
    }
    let names = fields
        .iter()
        .map(|(k, _)| *k)
        .collect::<Vec<_>>()
        .join(",");
    raw.insert("signed_field_names".into(), Value::String(names.clone()));
    let message = canonical_message(&raw, &names).unwrap();
    let signature = sign_message(secret, &message).unwrap();
    raw.insert("signature".into(), Value::String(signature));
    STANDARD.encode(serde_json::to_vec(&raw).unwrap())
}
