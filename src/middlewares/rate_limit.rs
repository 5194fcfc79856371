/*!
 * 速率限制中间件
 *
 * 固定窗口计数：每个限制键在窗口开始时清零，超过上限返回 429。
 *
 * ```rust,ignore
 * web::resource("/login")
 *     .wrap(RateLimit::login())
 *     .route(web::post().to(login))
 * ```
 *
 * 已认证请求按用户 ID 计数，匿名请求按客户端 IP 计数。
 */

use actix_service::{Service, Transform};
use actix_web::{
    Error, HttpMessage, HttpResponse,
    body::EitherBody,
    dev::{ServiceRequest, ServiceResponse},
    http::StatusCode,
    http::header::{CONTENT_TYPE, HeaderName, HeaderValue},
};
use futures_util::future::{LocalBoxFuture, Ready, ready};
use moka::future::Cache;
use once_cell::sync::Lazy;
use std::net::IpAddr;
use std::rc::Rc;
use std::time::{Duration, Instant};
use tracing::warn;

use crate::models::{ApiResponse, ErrorCode, users::entities::User};

/// 单个限制键的窗口状态
#[derive(Debug, Clone, Copy)]
struct Window {
    started: Instant,
    count: u32,
}

// 最长窗口之后条目自然过期
static RATE_LIMIT_CACHE: Lazy<Cache<String, Window>> = Lazy::new(|| {
    Cache::builder()
        .time_to_idle(Duration::from_secs(3600))
        .max_capacity(100_000)
        .build()
});

#[derive(Debug, PartialEq)]
enum Decision {
    Allow { remaining: u32 },
    Reject { retry_after: u64 },
}

/// 推进窗口并判断本次请求是否放行
fn advance(prev: Option<Window>, now: Instant, max: u32, window: Duration) -> (Window, Decision) {
    let current = match prev {
        Some(w) if now.duration_since(w.started) < window => w,
        _ => Window {
            started: now,
            count: 0,
        },
    };

    if current.count >= max {
        let elapsed = now.duration_since(current.started);
        let retry_after = window.saturating_sub(elapsed).as_secs().max(1);
        return (current, Decision::Reject { retry_after });
    }

    let next = Window {
        count: current.count + 1,
        ..current
    };
    (
        next,
        Decision::Allow {
            remaining: max - next.count,
        },
    )
}

#[derive(Clone)]
pub struct RateLimit {
    max_requests: u32,
    window_secs: u64,
    key_prefix: String,
}

impl RateLimit {
    pub fn new(max_requests: u32, window_secs: u64) -> Self {
        Self {
            max_requests,
            window_secs,
            key_prefix: String::new(),
        }
    }

    pub fn with_prefix(mut self, prefix: &str) -> Self {
        self.key_prefix = prefix.to_string();
        self
    }

    /// 登录：5次/分钟
    pub fn login() -> Self {
        Self::new(5, 60).with_prefix("login")
    }

    /// 注册：3次/分钟
    pub fn register() -> Self {
        Self::new(3, 60).with_prefix("register")
    }

    /// 刷新令牌：10次/分钟
    pub fn refresh_token() -> Self {
        Self::new(10, 60).with_prefix("refresh")
    }

    /// 发起支付：10次/分钟
    pub fn payment() -> Self {
        Self::new(10, 60).with_prefix("payment")
    }

    /// 媒体上传：10次/分钟
    pub fn file_upload() -> Self {
        Self::new(10, 60).with_prefix("upload")
    }

    /// 搜索建议等高频只读接口：100次/分钟
    pub fn api() -> Self {
        Self::new(100, 60).with_prefix("api")
    }
}

fn extract_client_ip(req: &ServiceRequest) -> String {
    let connection_ip = req
        .connection_info()
        .realip_remote_addr()
        .map(|s| s.to_string());

    if let Some(ref ip) = connection_ip
        && ip.parse::<IpAddr>().is_ok()
    {
        return ip.clone();
    }

    // 反向代理场景只取第一个转发地址
    for header in ["X-Forwarded-For", "X-Real-IP"] {
        if let Some(value) = req.headers().get(header).and_then(|v| v.to_str().ok())
            && let Some(ip) = value.split(',').next().map(str::trim)
            && ip.parse::<IpAddr>().is_ok()
        {
            return ip.to_string();
        }
    }

    connection_ip.unwrap_or_else(|| "unknown".to_string())
}

fn create_rate_limit_response(retry_after: u64) -> HttpResponse {
    HttpResponse::build(StatusCode::TOO_MANY_REQUESTS)
        .insert_header((CONTENT_TYPE, "application/json; charset=utf-8"))
        .insert_header(("Retry-After", retry_after.to_string()))
        .insert_header(("X-RateLimit-Remaining", "0"))
        .json(ApiResponse::<()>::error_empty(
            ErrorCode::RateLimitExceeded,
            "Too many requests, please try again later",
        ))
}

impl<S, B> Transform<S, ServiceRequest> for RateLimit
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = RateLimitMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RateLimitMiddleware {
            service: Rc::new(service),
            config: self.clone(),
        }))
    }
}

pub struct RateLimitMiddleware<S> {
    service: Rc<S>,
    config: RateLimit,
}

impl<S, B> Service<ServiceRequest> for RateLimitMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(
        &self,
        ctx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.service.poll_ready(ctx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let srv = self.service.clone();
        let config = self.config.clone();

        Box::pin(async move {
            let user_id = req.extensions().get::<User>().map(|u| u.id);
            let identifier = match user_id {
                Some(id) => format!("user:{id}"),
                None => format!("ip:{}", extract_client_ip(&req)),
            };
            let cache_key = if config.key_prefix.is_empty() {
                identifier
            } else {
                format!("{}:{}", config.key_prefix, identifier)
            };

            let prev = RATE_LIMIT_CACHE.get(&cache_key).await;
            let (window, decision) = advance(
                prev,
                Instant::now(),
                config.max_requests,
                Duration::from_secs(config.window_secs),
            );
            RATE_LIMIT_CACHE.insert(cache_key.clone(), window).await;

            match decision {
                Decision::Reject { retry_after } => {
                    warn!(
                        "Rate limit exceeded for key: {} (limit: {}/{}s)",
                        cache_key, config.max_requests, config.window_secs
                    );
                    Ok(req.into_response(
                        create_rate_limit_response(retry_after).map_into_right_body(),
                    ))
                }
                Decision::Allow { remaining } => {
                    let mut res = srv.call(req).await?;
                    res.headers_mut().insert(
                        HeaderName::from_static("x-ratelimit-remaining"),
                        HeaderValue::from(remaining),
                    );
                    Ok(res.map_into_left_body())
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limit_presets() {
        let login = RateLimit::login();
        assert_eq!(login.max_requests, 5);
        assert_eq!(login.window_secs, 60);
        assert_eq!(login.key_prefix, "login");

        assert_eq!(RateLimit::register().max_requests, 3);
        assert_eq!(RateLimit::payment().key_prefix, "payment");
        assert_eq!(RateLimit::file_upload().max_requests, 10);
    }

    #[test]
    fn test_window_counts_then_rejects() {
        let start = Instant::now();
        let window = Duration::from_secs(60);
        let mut state = None;
        for expected in (0..3).rev() {
            let (w, d) = advance(state, start, 3, window);
            assert_eq!(d, Decision::Allow { remaining: expected });
            state = Some(w);
        }
        let (_, d) = advance(state, start + Duration::from_secs(10), 3, window);
        assert_eq!(d, Decision::Reject { retry_after: 50 });
    }

    #[test]
    fn test_window_resets_after_expiry() {
        let start = Instant::now();
        let window = Duration::from_secs(60);
        let full = Window {
            started: start,
            count: 3,
        };
        let (w, d) = advance(Some(full), start + Duration::from_secs(61), 3, window);
        assert_eq!(d, Decision::Allow { remaining: 2 });
        assert_eq!(w.count, 1);
    }
}
