use super::{SeaOrmStorage, map_unique_violation};
use crate::entity::articles::{ActiveModel, Column, Entity as Articles};
use crate::errors::{CourseHubError, Result};
use crate::models::articles::{entities::Article, requests::CreateArticleRequest};
use crate::utils::validate::validate_required_text;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};

impl SeaOrmStorage {
    pub async fn create_article_impl(
        &self,
        author_id: i64,
        slug: &str,
        req: CreateArticleRequest,
    ) -> Result<Article> {
        validate_required_text(&req.title, "Title")?;
        if req.content.is_empty() {
            return Err(CourseHubError::validation(
                "Article needs at least one content block",
            ));
        }
        for block in &req.content {
            block.validate()?;
        }

        let now = chrono::Utc::now().timestamp();
        let model = ActiveModel {
            author_id: Set(author_id),
            title: Set(req.title.trim().to_string()),
            slug: Set(slug.to_string()),
            summary: Set(req.summary),
            content: Set(serde_json::to_string(&req.content)?),
            is_published: Set(req.is_published),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        let created = model
            .insert(&self.db)
            .await
            .map_err(|e| map_unique_violation(e, "Article slug already exists"))?;
        Ok(created.into_article())
    }

    pub async fn list_published_articles_impl(&self) -> Result<Vec<Article>> {
        let rows = Articles::find()
            .filter(Column::IsPublished.eq(true))
            .order_by_desc(Column::CreatedAt)
            .order_by_desc(Column::Id)
            .all(&self.db)
            .await?;
        Ok(rows.into_iter().map(|m| m.into_article()).collect())
    }

    pub async fn get_article_by_slug_impl(&self, slug: &str) -> Result<Option<Article>> {
        let result = Articles::find()
            .filter(Column::Slug.eq(slug))
            .one(&self.db)
            .await?;
        Ok(result.map(|m| m.into_article()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::articles::entities::ContentBlock;
    use crate::models::users::entities::UserRole;
    use crate::storage::Storage;
    use crate::storage::sea_orm_storage::fixtures;

    fn request(title: &str, published: bool) -> CreateArticleRequest {
        CreateArticleRequest {
            title: title.to_string(),
            slug: None,
            summary: Some("Short".into()),
            content: vec![
                ContentBlock::Heading {
                    text: "Why Rust".into(),
                    level: 2,
                },
                ContentBlock::Image {
                    url: "http://localhost/media/images/x.png".into(),
                    alt: "diagram".into(),
                    caption: None,
                },
            ],
            is_published: published,
        }
    }

    #[tokio::test]
    async fn test_article_blocks_roundtrip_through_storage() {
        let storage = SeaOrmStorage::new_in_memory().await;
        let author = fixtures::user(&storage, "w@example.com", UserRole::Instructor).await;

        let created = storage
            .create_article(author.id, "why-rust", request("Why Rust", true))
            .await
            .unwrap();
        storage
            .create_article(author.id, "draft", request("Draft", false))
            .await
            .unwrap();

        let fetched = storage
            .get_article_by_slug("why-rust")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(fetched.content, created.content);

        let listed = storage.list_published_articles().await.unwrap();
        assert_eq!(listed.len(), 1);

        let err = storage
            .create_article(author.id, "why-rust", request("Again", true))
            .await
            .unwrap_err();
        assert!(matches!(err, CourseHubError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_article_rejects_invalid_heading() {
        let storage = SeaOrmStorage::new_in_memory().await;
        let author = fixtures::user(&storage, "w@example.com", UserRole::Instructor).await;

        let mut req = request("Bad", true);
        req.content = vec![ContentBlock::Heading {
            text: "Too deep".into(),
            level: 7,
        }];
        let err = storage
            .create_article(author.id, "bad", req)
            .await
            .unwrap_err();
        assert!(matches!(err, CourseHubError::Validation(_)));
    }
}
