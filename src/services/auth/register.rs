use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::info;

use crate::errors::{CourseHubError, Result};
use crate::models::auth::requests::RegisterRequest;
use crate::models::users::entities::UserRole;
use crate::models::users::requests::NewUser;
use crate::models::{ApiResponse, ErrorCode};
use crate::utils::password::hash_password;
use crate::utils::validate::{validate_email, validate_name, validate_password_simple};

use super::AuthService;

/// 校验注册请求，返回最终角色；管理员只能由系统初始化
pub(crate) fn validate_registration(req: &RegisterRequest) -> Result<UserRole> {
    validate_name(&req.name).map_err(CourseHubError::validation)?;
    validate_email(req.email.trim()).map_err(CourseHubError::validation)?;
    validate_password_simple(&req.password).map_err(CourseHubError::validation)?;

    match req.role.clone().unwrap_or(UserRole::Student) {
        UserRole::Admin => Err(CourseHubError::forbidden(
            "Administrator accounts cannot be registered",
        )),
        role => Ok(role),
    }
}

pub async fn handle_register(
    service: &AuthService,
    register_request: RegisterRequest,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request);

    let role = match validate_registration(&register_request) {
        Ok(role) => role,
        Err(e) => {
            return Ok(crate::services::error_response_with(
                &e,
                ErrorCode::RegisterFailed,
            ));
        }
    };

    let password_hash = match hash_password(&register_request.password) {
        Ok(hash) => hash,
        Err(e) => {
            return Ok(
                HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                    ErrorCode::RegisterFailed,
                    format!("Password hashing failed: {e}"),
                )),
            );
        }
    };

    let new_user = NewUser {
        name: register_request.name.trim().to_string(),
        email: register_request.email,
        password_hash: Some(password_hash),
        role,
    };

    match storage.create_user(new_user).await {
        Ok(user) => {
            info!("User {} registered as {}", user.email, user.role);
            Ok(HttpResponse::Created().json(ApiResponse::success(user, "Registration successful")))
        }
        Err(e @ CourseHubError::Conflict(_)) => Ok(crate::services::error_response_with(
            &e,
            ErrorCode::UserEmailAlreadyExists,
        )),
        Err(e) => Ok(crate::services::error_response(&e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(role: Option<UserRole>, password: &str) -> RegisterRequest {
        RegisterRequest {
            name: "Ada".into(),
            email: "ada@example.com".into(),
            password: password.into(),
            role,
        }
    }

    #[test]
    fn test_registration_roles() {
        assert_eq!(
            validate_registration(&request(None, "Str0ngPass")).unwrap(),
            UserRole::Student
        );
        assert_eq!(
            validate_registration(&request(Some(UserRole::Instructor), "Str0ngPass")).unwrap(),
            UserRole::Instructor
        );
        assert!(matches!(
            validate_registration(&request(Some(UserRole::Admin), "Str0ngPass")),
            Err(CourseHubError::Forbidden(_))
        ));
    }

    #[test]
    fn test_registration_rejects_weak_password_and_bad_email() {
        assert!(matches!(
            validate_registration(&request(None, "short")),
            Err(CourseHubError::Validation(_))
        ));
        let mut req = request(None, "Str0ngPass");
        req.email = "not-an-email".into();
        assert!(matches!(
            validate_registration(&req),
            Err(CourseHubError::Validation(_))
        ));
    }
}
