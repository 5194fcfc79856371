use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, http::header};
use tracing::{info, warn};

use crate::errors::{CourseHubError, Result};
use crate::models::purchases::entities::{CoursePurchase, PurchaseStatus};
use crate::models::purchases::requests::{CompletePaymentQuery, FailedPaymentQuery};
use crate::storage::Storage;
use crate::utils::esewa::{decode_callback, verify_callback};

use super::{PurchaseService, purchase_error_response};

/// 支付成功后前端落地页
const SUCCESS_PATH: &str = "/my-learning";
/// 支付失败后前端落地页
const FAILURE_PATH: &str = "/payment-failed";

/// 处理网关成功回调
///
/// 签名不符时不做任何修改；网关状态不是 COMPLETE 时标记失败；
/// 否则完成购买并写入选课（重放安全）。
pub(crate) async fn reconcile_payment(
    storage: &dyn Storage,
    secret: &str,
    encoded: &str,
) -> Result<CoursePurchase> {
    let callback = decode_callback(encoded)?;
    verify_callback(secret, &callback)?;

    if storage
        .get_purchase_by_uuid(&callback.transaction_uuid)
        .await?
        .is_none()
    {
        return Err(CourseHubError::not_found(format!(
            "Purchase {} not found",
            callback.transaction_uuid
        )));
    }

    if !callback.is_complete() {
        warn!(
            "Gateway reported status {} for purchase {}",
            callback.status, callback.transaction_uuid
        );
        return storage.fail_purchase(&callback.transaction_uuid).await;
    }

    storage
        .complete_purchase(
            &callback.transaction_uuid,
            &callback.transaction_code,
            callback.total_amount,
        )
        .await
}

fn redirect_to(frontend_url: &str, path: &str) -> HttpResponse {
    HttpResponse::Found()
        .insert_header((
            header::LOCATION,
            format!("{}{}", frontend_url.trim_end_matches('/'), path),
        ))
        .finish()
}

pub async fn handle_complete_payment(
    service: &PurchaseService,
    request: &HttpRequest,
    query: CompletePaymentQuery,
) -> ActixResult<HttpResponse> {
    let config = service.get_esewa_config();
    let storage = service.get_storage(request);

    match reconcile_payment(storage.as_ref(), &config.secret_key, &query.data).await {
        Ok(purchase) if purchase.status == PurchaseStatus::Completed => {
            info!(
                "Payment callback reconciled for purchase {}",
                purchase.transaction_uuid
            );
            Ok(redirect_to(&config.frontend_url, SUCCESS_PATH))
        }
        Ok(_) => Ok(redirect_to(&config.frontend_url, FAILURE_PATH)),
        Err(e) => Ok(purchase_error_response(&e)),
    }
}

/// 处理网关失败跳转
///
/// 浏览器跳转不携带身份，仅凭交易号不修改订单状态；
/// 只有附带签名负载时才按回调对账。
pub(crate) async fn acknowledge_failed_payment(
    storage: &dyn Storage,
    secret: &str,
    query: &FailedPaymentQuery,
) -> Result<Option<CoursePurchase>> {
    match &query.data {
        Some(encoded) => reconcile_payment(storage, secret, encoded).await.map(Some),
        None => {
            info!(
                "Payment failure redirect for purchase {:?}, status left unchanged",
                query.transaction_uuid
            );
            Ok(None)
        }
    }
}

pub async fn handle_payment_failed(
    service: &PurchaseService,
    request: &HttpRequest,
    query: FailedPaymentQuery,
) -> ActixResult<HttpResponse> {
    let config = service.get_esewa_config();
    let storage = service.get_storage(request);

    match acknowledge_failed_payment(storage.as_ref(), &config.secret_key, &query).await {
        Ok(Some(purchase)) if purchase.status == PurchaseStatus::Completed => {
            Ok(redirect_to(&config.frontend_url, SUCCESS_PATH))
        }
        Ok(_) => Ok(redirect_to(&config.frontend_url, FAILURE_PATH)),
        Err(e) => Ok(purchase_error_response(&e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EsewaConfig;
    use crate::models::users::entities::UserRole;
    use crate::services::purchases::initiate::initiate_purchase;
    use crate::storage::sea_orm_storage::{SeaOrmStorage, fixtures};
    use crate::utils::esewa::encode_signed_callback;
    use serde_json::json;

    const SECRET: &str = "8gBm/:&EnhH.1/q";

    fn config() -> EsewaConfig {
        EsewaConfig {
            product_code: "EPAYTEST".into(),
            secret_key: SECRET.into(),
            payment_url: "https://gateway/form".into(),
            success_url: "https://api/complete".into(),
            failure_url: "https://api/failed".into(),
            frontend_url: "https://app".into(),
        }
    }

    fn callback(secret: &str, uuid: &str, status: &str, amount: f64) -> String {
        encode_signed_callback(
            secret,
            &[
                ("transaction_code", json!("000AWEO")),
                ("status", json!(status)),
                ("total_amount", json!(amount.to_string())),
                ("transaction_uuid", json!(uuid)),
                ("product_code", json!("EPAYTEST")),
            ],
        )
    }

    async fn pending(storage: &SeaOrmStorage) -> (CoursePurchase, i64, i64) {
        let instructor = fixtures::user(storage, "t@example.com", UserRole::Instructor).await;
        let course = fixtures::published_course(storage, &instructor, "Rust", "Development").await;
        let student = fixtures::user(storage, "s@example.com", UserRole::Student).await;
        let initiated = initiate_purchase(storage, &config(), student.id, course.id)
            .await
            .unwrap();
        assert_eq!(initiated.payment_url, "https://gateway/form");
        assert_eq!(initiated.form.transaction_uuid, initiated.purchase.transaction_uuid);
        (initiated.purchase, student.id, course.id)
    }

    #[tokio::test]
    async fn test_verified_callback_replayed_enrolls_once() {
        let storage = SeaOrmStorage::new_in_memory().await;
        let (purchase, student_id, course_id) = pending(&storage).await;
        let encoded = callback(SECRET, &purchase.transaction_uuid, "COMPLETE", purchase.amount);

        for _ in 0..2 {
            let done = reconcile_payment(&storage, SECRET, &encoded).await.unwrap();
            assert_eq!(done.status, PurchaseStatus::Completed);
            assert_eq!(done.payment_id.as_deref(), Some("000AWEO"));
        }
        assert!(storage.is_enrolled(student_id, course_id).await.unwrap());
        assert_eq!(storage.count_enrollments(course_id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_invalid_signature_changes_nothing() {
        let storage = SeaOrmStorage::new_in_memory().await;
        let (purchase, student_id, course_id) = pending(&storage).await;
        let forged = callback("forged", &purchase.transaction_uuid, "COMPLETE", purchase.amount);

        let err = reconcile_payment(&storage, SECRET, &forged).await.unwrap_err();
        assert!(matches!(err, CourseHubError::Authentication(_)));

        let stored = storage
            .get_purchase_by_uuid(&purchase.transaction_uuid)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.status, PurchaseStatus::Pending);
        assert!(!storage.is_enrolled(student_id, course_id).await.unwrap());
    }

    #[tokio::test]
    async fn test_non_complete_status_marks_failed() {
        let storage = SeaOrmStorage::new_in_memory().await;
        let (purchase, student_id, course_id) = pending(&storage).await;
        let encoded = callback(SECRET, &purchase.transaction_uuid, "CANCELED", purchase.amount);

        let failed = reconcile_payment(&storage, SECRET, &encoded).await.unwrap();
        assert_eq!(failed.status, PurchaseStatus::Failed);
        assert!(failed.payment_id.is_none());
        assert!(!storage.is_enrolled(student_id, course_id).await.unwrap());
    }

    #[tokio::test]
    async fn test_unknown_purchase_and_amount_mismatch() {
        let storage = SeaOrmStorage::new_in_memory().await;
        let (purchase, _, _) = pending(&storage).await;

        let unknown = callback(SECRET, "no-such-uuid", "COMPLETE", purchase.amount);
        assert!(matches!(
            reconcile_payment(&storage, SECRET, &unknown).await.unwrap_err(),
            CourseHubError::NotFound(_)
        ));

        let cheap = callback(SECRET, &purchase.transaction_uuid, "COMPLETE", 1.0);
        assert!(matches!(
            reconcile_payment(&storage, SECRET, &cheap).await.unwrap_err(),
            CourseHubError::Validation(_)
        ));
    }

    #[tokio::test]
    async fn test_unsigned_failure_redirect_leaves_purchase_pending() {
        let storage = SeaOrmStorage::new_in_memory().await;
        let (purchase, student_id, course_id) = pending(&storage).await;

        let unsigned = FailedPaymentQuery {
            data: None,
            transaction_uuid: Some(purchase.transaction_uuid.clone()),
        };
        let outcome = acknowledge_failed_payment(&storage, SECRET, &unsigned)
            .await
            .unwrap();
        assert!(outcome.is_none());

        let forged = FailedPaymentQuery {
            data: Some(callback(
                "forged",
                &purchase.transaction_uuid,
                "CANCELED",
                purchase.amount,
            )),
            transaction_uuid: None,
        };
        let err = acknowledge_failed_payment(&storage, SECRET, &forged)
            .await
            .unwrap_err();
        assert!(matches!(err, CourseHubError::Authentication(_)));

        let stored = storage
            .get_purchase_by_uuid(&purchase.transaction_uuid)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.status, PurchaseStatus::Pending);

        // 之后到达的成功回调仍然可以完成购买
        let encoded = callback(SECRET, &purchase.transaction_uuid, "COMPLETE", purchase.amount);
        let done = reconcile_payment(&storage, SECRET, &encoded).await.unwrap();
        assert_eq!(done.status, PurchaseStatus::Completed);
        assert!(storage.is_enrolled(student_id, course_id).await.unwrap());
    }

    #[tokio::test]
    async fn test_signed_failure_payload_marks_failed() {
        let storage = SeaOrmStorage::new_in_memory().await;
        let (purchase, _, _) = pending(&storage).await;
        let signed = FailedPaymentQuery {
            data: Some(callback(
                SECRET,
                &purchase.transaction_uuid,
                "CANCELED",
                purchase.amount,
            )),
            transaction_uuid: None,
        };

        let failed = acknowledge_failed_payment(&storage, SECRET, &signed)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(failed.status, PurchaseStatus::Failed);
    }

    #[test]
    fn test_redirect_location() {
        let resp = redirect_to("https://app/", SUCCESS_PATH);
        assert_eq!(resp.status(), actix_web::http::StatusCode::FOUND);
        assert_eq!(
            resp.headers().get(header::LOCATION).unwrap(),
            "https://app/my-learning"
        );
    }
}
