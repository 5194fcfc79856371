use super::{SeaOrmStorage, map_unique_violation};
use crate::entity::users::{ActiveModel, Column, Entity as Users};
use crate::errors::{CourseHubError, Result};
use crate::models::users::{
    entities::{User, UserRole, UserStatus},
    requests::{NewUser, UpdateProfileRequest},
};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, Set};

impl SeaOrmStorage {
    /// 创建用户
    pub async fn create_user_impl(&self, req: NewUser) -> Result<User> {
        let now = chrono::Utc::now().timestamp();

        let model = ActiveModel {
            name: Set(req.name.trim().to_string()),
            email: Set(req.email.trim().to_lowercase()),
            password_hash: Set(req.password_hash),
            role: Set(req.role.to_string()),
            status: Set(UserStatus::Active.to_string()),
            social_links: Set("{}".to_string()),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        let result = model
            .insert(&self.db)
            .await
            .map_err(|e| map_unique_violation(e, "Email is already registered"))?;

        Ok(result.into_user())
    }

    pub async fn get_user_by_id_impl(&self, id: i64) -> Result<Option<User>> {
        let result = Users::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(|e| CourseHubError::database_operation(format!("Failed to query user: {e}")))?;

        Ok(result.map(|m| m.into_user()))
    }

    /// 邮箱不区分大小写
    pub async fn get_user_by_email_impl(&self, email: &str) -> Result<Option<User>> {
        let result = Users::find()
            .filter(Column::Email.eq(email.trim().to_lowercase()))
            .one(&self.db)
            .await
            .map_err(|e| CourseHubError::database_operation(format!("Failed to query user: {e}")))?;

        Ok(result.map(|m| m.into_user()))
    }

    pub async fn update_profile_impl(
        &self,
        id: i64,
        update: UpdateProfileRequest,
    ) -> Result<Option<User>> {
        let Some(existing) = Users::find_by_id(id).one(&self.db).await? else {
            return Ok(None);
        };

        let mut model: ActiveModel = existing.into();
        if let Some(name) = update.name {
            model.name = Set(name.trim().to_string());
        }
        if let Some(headline) = update.headline {
            model.headline = Set(Some(headline));
        }
        if let Some(description) = update.description {
            model.description = Set(Some(description));
        }
        if let Some(links) = update.social_links {
            model.social_links = Set(serde_json::to_string(&links)?);
        }
        model.updated_at = Set(chrono::Utc::now().timestamp());

        let updated = model.update(&self.db).await.map_err(|e| {
            CourseHubError::database_operation(format!("Failed to update profile: {e}"))
        })?;
        Ok(Some(updated.into_user()))
    }

    pub async fn update_user_photo_impl(
        &self,
        id: i64,
        photo_url: &str,
        photo_public_id: &str,
    ) -> Result<Option<User>> {
        let Some(existing) = Users::find_by_id(id).one(&self.db).await? else {
            return Ok(None);
        };

        let mut model: ActiveModel = existing.into();
        model.photo_url = Set(Some(photo_url.to_string()));
        model.photo_public_id = Set(Some(photo_public_id.to_string()));
        model.updated_at = Set(chrono::Utc::now().timestamp());

        let updated = model.update(&self.db).await?;
        Ok(Some(updated.into_user()))
    }

    pub async fn update_last_login_impl(&self, id: i64) -> Result<bool> {
        let now = chrono::Utc::now().timestamp();
        let result = Users::update_many()
            .col_expr(Column::LastLogin, sea_orm::sea_query::Expr::value(now))
            .filter(Column::Id.eq(id))
            .exec(&self.db)
            .await
            .map_err(|e| {
                CourseHubError::database_operation(format!("Failed to update last login: {e}"))
            })?;

        Ok(result.rows_affected > 0)
    }

    pub async fn count_users_by_role_impl(&self, role: UserRole) -> Result<u64> {
        let count = Users::find()
            .filter(Column::Role.eq(role.to_string()))
            .count(&self.db)
            .await?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::users::entities::SocialLinks;
    use crate::storage::Storage;
    use crate::storage::sea_orm_storage::fixtures;

    #[tokio::test]
    async fn test_duplicate_email_is_conflict() {
        let storage = SeaOrmStorage::new_in_memory().await;
        fixtures::user(&storage, "ada@example.com", UserRole::Student).await;

        let err = storage
            .create_user(NewUser {
                name: "Other".into(),
                email: "ADA@example.com".into(),
                password_hash: None,
                role: UserRole::Student,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, CourseHubError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_update_profile_and_lookup() {
        let storage = SeaOrmStorage::new_in_memory().await;
        let user = fixtures::user(&storage, "grace@example.com", UserRole::Instructor).await;

        let updated = storage
            .update_profile(
                user.id,
                UpdateProfileRequest {
                    headline: Some("Compiler engineer".into()),
                    social_links: Some(SocialLinks {
                        website: Some("https://grace.dev".into()),
                        ..Default::default()
                    }),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.headline.as_deref(), Some("Compiler engineer"));
        assert_eq!(
            updated.social_links.website.as_deref(),
            Some("https://grace.dev")
        );

        let found = storage
            .get_user_by_email("Grace@Example.com")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.id, user.id);
        assert_eq!(
            storage
                .count_users_by_role(UserRole::Instructor)
                .await
                .unwrap(),
            1
        );
    }
}
