use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::info;

use crate::config::EsewaConfig;
use crate::errors::{CourseHubError, Result};
use crate::models::purchases::requests::InitiatePurchaseRequest;
use crate::models::purchases::responses::InitiatePurchaseResponse;
use crate::models::{ApiResponse, ErrorCode};
use crate::storage::Storage;
use crate::utils::esewa::build_payment_form;

use super::{PurchaseService, purchase_error_response};

/// 创建待支付记录并生成签名表单
pub(crate) async fn initiate_purchase(
    storage: &dyn Storage,
    config: &EsewaConfig,
    user_id: i64,
    course_id: i64,
) -> Result<InitiatePurchaseResponse> {
    let purchase = storage.create_pending_purchase(user_id, course_id).await?;
    let form = build_payment_form(config, purchase.amount, &purchase.transaction_uuid)?;

    Ok(InitiatePurchaseResponse {
        purchase,
        payment_url: config.payment_url.clone(),
        form,
    })
}

pub async fn handle_initiate(
    service: &PurchaseService,
    request: &HttpRequest,
    initiate_request: InitiatePurchaseRequest,
) -> ActixResult<HttpResponse> {
    let user = match crate::services::current_user(request) {
        Ok(user) => user,
        Err(response) => return Ok(response),
    };
    let storage = service.get_storage(request);

    match initiate_purchase(
        storage.as_ref(),
        service.get_esewa_config(),
        user.id,
        initiate_request.course_id,
    )
    .await
    {
        Ok(response) => {
            info!(
                "Purchase {} initiated by user {} for course {}",
                response.purchase.transaction_uuid, user.id, initiate_request.course_id
            );
            Ok(HttpResponse::Created().json(ApiResponse::success(
                response,
                "Purchase initiated",
            )))
        }
        Err(e @ CourseHubError::Conflict(_)) => Ok(crate::services::error_response_with(
            &e,
            ErrorCode::PurchaseAlreadyEnrolled,
        )),
        Err(e @ CourseHubError::NotFound(_)) => Ok(crate::services::error_response_with(
            &e,
            ErrorCode::CourseNotFound,
        )),
        Err(e) => Ok(purchase_error_response(&e)),
    }
}
