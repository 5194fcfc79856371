//! 购买与选课对账
//!
//! 发起购买时生成待支付记录与签名表单；网关回调经签名校验后推进状态机，
//! 成功时在同一事务内写入选课记录。

pub mod callback;
pub mod initiate;

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;

use crate::config::{AppConfig, EsewaConfig};
use crate::errors::CourseHubError;
use crate::models::ErrorCode;
use crate::models::purchases::requests::{
    CompletePaymentQuery, FailedPaymentQuery, InitiatePurchaseRequest,
};
use crate::storage::Storage;

pub struct PurchaseService {
    storage: Option<Arc<dyn Storage>>,
}

fn purchase_error_response(err: &CourseHubError) -> HttpResponse {
    let code = match err {
        CourseHubError::NotFound(_) => ErrorCode::PurchaseNotFound,
        CourseHubError::Authentication(_) => ErrorCode::PaymentSignatureInvalid,
        CourseHubError::Validation(msg) if msg.contains("does not match") => {
            ErrorCode::PaymentAmountMismatch
        }
        CourseHubError::Conflict(_) => ErrorCode::PurchaseStateConflict,
        _ => return super::error_response(err),
    };
    super::error_response_with(err, code)
}

impl PurchaseService {
    pub fn new_lazy() -> Self {
        Self { storage: None }
    }

    pub(crate) fn get_storage(&self, request: &HttpRequest) -> Arc<dyn Storage> {
        match &self.storage {
            Some(storage) => storage.clone(),
            None => super::app_storage(request),
        }
    }

    pub(crate) fn get_esewa_config(&self) -> &EsewaConfig {
        &AppConfig::get().payment.esewa
    }

    pub async fn initiate(
        &self,
        request: &HttpRequest,
        initiate_request: InitiatePurchaseRequest,
    ) -> ActixResult<HttpResponse> {
        initiate::handle_initiate(self, request, initiate_request).await
    }

    pub async fn complete_payment(
        &self,
        request: &HttpRequest,
        query: CompletePaymentQuery,
    ) -> ActixResult<HttpResponse> {
        callback::handle_complete_payment(self, request, query).await
    }

    pub async fn payment_failed(
        &self,
        request: &HttpRequest,
        query: FailedPaymentQuery,
    ) -> ActixResult<HttpResponse> {
        callback::handle_payment_failed(self, request, query).await
    }
}
