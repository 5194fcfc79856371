use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use once_cell::sync::Lazy;

use crate::middlewares::{self, RateLimit};
use crate::models::purchases::requests::{
    CompletePaymentQuery, FailedPaymentQuery, InitiatePurchaseRequest,
};
use crate::services::PurchaseService;

// 懒加载的全局 PurchaseService 实例
static PURCHASE_SERVICE: Lazy<PurchaseService> = Lazy::new(PurchaseService::new_lazy);

pub async fn initiate(
    req: HttpRequest,
    body: web::Json<InitiatePurchaseRequest>,
) -> ActixResult<HttpResponse> {
    PURCHASE_SERVICE.initiate(&req, body.into_inner()).await
}

// 网关成功回调，签名在业务层校验
pub async fn complete_payment(
    req: HttpRequest,
    query: web::Query<CompletePaymentQuery>,
) -> ActixResult<HttpResponse> {
    PURCHASE_SERVICE
        .complete_payment(&req, query.into_inner())
        .await
}

pub async fn payment_failed(
    req: HttpRequest,
    query: web::Query<FailedPaymentQuery>,
) -> ActixResult<HttpResponse> {
    PURCHASE_SERVICE.payment_failed(&req, query.into_inner()).await
}

// 配置路由
pub fn configure_purchase_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/purchase")
            .service(
                web::resource("/esewa")
                    .route(web::post().to(initiate))
                    // 限流按用户计数，需在认证之后执行
                    .wrap(RateLimit::payment())
                    .wrap(middlewares::RequireJWT),
            )
            .route("/complete-payment", web::get().to(complete_payment))
            .route("/failed", web::get().to(payment_failed)),
    );
}
