use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use crate::errors::{CourseHubError, Result};
use crate::middlewares::RequireJWT;
use crate::models::users::requests::UpdateProfileRequest;
use crate::models::users::responses::UserResponse;
use crate::models::{ApiResponse, ErrorCode};
use crate::utils::validate::validate_name;

use super::UserService;

fn validate_profile_update(update: &UpdateProfileRequest) -> Result<()> {
    if let Some(name) = &update.name {
        validate_name(name).map_err(CourseHubError::validation)?;
    }
    if let Some(headline) = &update.headline
        && headline.chars().count() > 120
    {
        return Err(CourseHubError::validation(
            "Headline must be at most 120 characters",
        ));
    }
    Ok(())
}

pub async fn handle_update_profile(
    service: &UserService,
    request: &HttpRequest,
    update: UpdateProfileRequest,
) -> ActixResult<HttpResponse> {
    let user = match crate::services::current_user(request) {
        Ok(user) => user,
        Err(response) => return Ok(response),
    };

    if let Err(e) = validate_profile_update(&update) {
        return Ok(crate::services::error_response_with(
            &e,
            ErrorCode::UserUpdateFailed,
        ));
    }

    match service
        .get_storage(request)
        .update_profile(user.id, update)
        .await
    {
        Ok(Some(user)) => {
            RequireJWT::invalidate_cached_user(request).await;
            Ok(HttpResponse::Ok().json(ApiResponse::success(
                UserResponse { user },
                "Profile updated successfully",
            )))
        }
        Ok(None) => Ok(HttpResponse::NotFound().json(ApiResponse::error_empty(
            ErrorCode::UserNotFound,
            "User not found",
        ))),
        Err(e) => Ok(crate::services::error_response(&e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_update_validation() {
        assert!(validate_profile_update(&UpdateProfileRequest::default()).is_ok());

        let blank_name = UpdateProfileRequest {
            name: Some("  ".into()),
            ..Default::default()
        };
        assert!(validate_profile_update(&blank_name).is_err());

        let long_headline = UpdateProfileRequest {
            headline: Some("h".repeat(121)),
            ..Default::default()
        };
        assert!(validate_profile_update(&long_headline).is_err());
    }
}
