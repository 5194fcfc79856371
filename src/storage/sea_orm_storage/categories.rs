use super::{SeaOrmStorage, map_unique_violation};
use crate::entity::categories::{ActiveModel, Column, Entity as Categories};
use crate::errors::Result;
use crate::models::categories::entities::Category;
use sea_orm::{ActiveModelTrait, EntityTrait, QueryOrder, Set};

impl SeaOrmStorage {
    pub async fn list_categories_impl(&self) -> Result<Vec<Category>> {
        let rows = Categories::find()
            .order_by_asc(Column::Name)
            .all(&self.db)
            .await?;
        Ok(rows.into_iter().map(|m| m.into_category()).collect())
    }

    pub async fn create_category_impl(&self, name: &str, slug: &str) -> Result<Category> {
        let model = ActiveModel {
            name: Set(name.trim().to_string()),
            slug: Set(slug.to_string()),
            created_at: Set(chrono::Utc::now().timestamp()),
            ..Default::default()
        };

        let created = model
            .insert(&self.db)
            .await
            .map_err(|e| map_unique_violation(e, "Category name or slug already exists"))?;
        Ok(created.into_category())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::CourseHubError;
    use crate::storage::Storage;

    #[tokio::test]
    async fn test_categories_sorted_and_unique() {
        let storage = SeaOrmStorage::new_in_memory().await;
        storage.create_category("Design", "design").await.unwrap();
        storage
            .create_category("Development", "development")
            .await
            .unwrap();

        let err = storage
            .create_category("Design", "design-2")
            .await
            .unwrap_err();
        assert!(matches!(err, CourseHubError::Conflict(_)));

        let names: Vec<_> = storage
            .list_categories()
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, vec!["Design", "Development"]);
    }
}
