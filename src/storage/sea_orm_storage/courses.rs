use super::SeaOrmStorage;
use crate::entity::courses::{ActiveModel, Column, Entity as Courses};
use crate::entity::{enrollments, lectures, sections};
use crate::errors::{CourseHubError, Result};
use crate::models::{
    PaginationInfo,
    courses::{
        entities::Course,
        requests::{CreateCourseRequest, PublishedCourseQuery, UpdateCourseRequest},
        responses::CourseListResponse,
    },
};
use crate::utils::validate::validate_required_text;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, JoinType, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, RelationTrait, Set,
};

fn validate_price(original: f64, current: f64) -> Result<()> {
    if !(original.is_finite() && current.is_finite()) || original < 0.0 || current < 0.0 {
        return Err(CourseHubError::validation("Price must be a non-negative number"));
    }
    Ok(())
}

impl SeaOrmStorage {
    pub async fn create_course_impl(
        &self,
        creator_id: i64,
        req: CreateCourseRequest,
    ) -> Result<Course> {
        validate_required_text(&req.title, "Title")?;
        validate_required_text(&req.category, "Category")?;
        validate_price(req.price.original, req.price.current)?;

        let now = chrono::Utc::now().timestamp();
        let model = ActiveModel {
            creator_id: Set(creator_id),
            title: Set(req.title.trim().to_string()),
            subtitle: Set(req.subtitle),
            description: Set(req.description),
            language: Set(req.language),
            category: Set(req.category.trim().to_string()),
            level: Set(req.level.to_string()),
            price_original: Set(req.price.original),
            price_current: Set(req.price.current),
            thumbnail_url: Set(req.thumbnail_url),
            is_bestseller: Set(false),
            total_lectures: Set(0),
            total_duration_in_seconds: Set(0),
            learnings: Set(serde_json::to_string(&req.learnings)?),
            requirements: Set(serde_json::to_string(&req.requirements)?),
            includes: Set(serde_json::to_string(&req.includes)?),
            is_published: Set(false),
            ratings: Set(0.0),
            num_of_reviews: Set(0),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        let created = model.insert(&self.db).await.map_err(|e| {
            CourseHubError::database_operation(format!("Failed to create course: {e}"))
        })?;
        Ok(created.into_course())
    }

    pub async fn get_course_by_id_impl(&self, id: i64) -> Result<Option<Course>> {
        let result = Courses::find_by_id(id).one(&self.db).await.map_err(|e| {
            CourseHubError::database_operation(format!("Failed to query course: {e}"))
        })?;
        Ok(result.map(|m| m.into_course()))
    }

    pub async fn update_course_impl(
        &self,
        id: i64,
        update: UpdateCourseRequest,
    ) -> Result<Option<Course>> {
        let Some(existing) = Courses::find_by_id(id).one(&self.db).await? else {
            return Ok(None);
        };

        let mut model: ActiveModel = existing.into();
        if let Some(title) = update.title {
            validate_required_text(&title, "Title")?;
            model.title = Set(title.trim().to_string());
        }
        if let Some(subtitle) = update.subtitle {
            model.subtitle = Set(subtitle);
        }
        if let Some(description) = update.description {
            model.description = Set(description);
        }
        if let Some(language) = update.language {
            model.language = Set(language);
        }
        if let Some(category) = update.category {
            validate_required_text(&category, "Category")?;
            model.category = Set(category.trim().to_string());
        }
        if let Some(level) = update.level {
            model.level = Set(level.to_string());
        }
        if let Some(price) = update.price {
            validate_price(price.original, price.current)?;
            model.price_original = Set(price.original);
            model.price_current = Set(price.current);
        }
        if let Some(thumbnail_url) = update.thumbnail_url {
            model.thumbnail_url = Set(Some(thumbnail_url));
        }
        if let Some(is_bestseller) = update.is_bestseller {
            model.is_bestseller = Set(is_bestseller);
        }
        if let Some(learnings) = update.learnings {
            model.learnings = Set(serde_json::to_string(&learnings)?);
        }
        if let Some(requirements) = update.requirements {
            model.requirements = Set(serde_json::to_string(&requirements)?);
        }
        if let Some(includes) = update.includes {
            model.includes = Set(serde_json::to_string(&includes)?);
        }
        model.updated_at = Set(chrono::Utc::now().timestamp());

        let updated = model.update(&self.db).await.map_err(|e| {
            CourseHubError::database_operation(format!("Failed to update course: {e}"))
        })?;
        Ok(Some(updated.into_course()))
    }

    pub async fn set_course_published_impl(&self, id: i64, publish: bool) -> Result<Course> {
        let existing = Courses::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or_else(|| CourseHubError::not_found(format!("Course {id} not found")))?;

        if publish {
            let lecture_count = lectures::Entity::find()
                .join(JoinType::InnerJoin, lectures::Relation::Section.def())
                .filter(sections::Column::CourseId.eq(id))
                .count(&self.db)
                .await?;
            if lecture_count == 0 {
                return Err(CourseHubError::validation(
                    "A course needs at least one lecture before it can be published",
                ));
            }
        }

        let mut model: ActiveModel = existing.into();
        model.is_published = Set(publish);
        model.updated_at = Set(chrono::Utc::now().timestamp());
        Ok(model.update(&self.db).await?.into_course())
    }

    /// 已发布课程分页列表，按创建时间倒序
    pub async fn list_published_courses_impl(
        &self,
        query: PublishedCourseQuery,
    ) -> Result<CourseListResponse> {
        let (page, size) = query.pagination.normalized();

        let mut select = Courses::find().filter(Column::IsPublished.eq(true));
        if let Some(category) = query.category.as_deref().filter(|c| !c.trim().is_empty()) {
            select = select.filter(Column::Category.eq(category.trim()));
        }

        let paginator = select
            .order_by_desc(Column::CreatedAt)
            .order_by_desc(Column::Id)
            .paginate(&self.db, size);

        let total = paginator.num_items().await.map_err(|e| {
            CourseHubError::database_operation(format!("Failed to count courses: {e}"))
        })?;
        let items = paginator.fetch_page(page - 1).await.map_err(|e| {
            CourseHubError::database_operation(format!("Failed to list courses: {e}"))
        })?;

        Ok(CourseListResponse {
            items: items.into_iter().map(|m| m.into_course()).collect(),
            pagination: PaginationInfo::new(page, size, total),
        })
    }

    pub async fn list_courses_by_creator_impl(&self, creator_id: i64) -> Result<Vec<Course>> {
        let rows = Courses::find()
            .filter(Column::CreatorId.eq(creator_id))
            .order_by_desc(Column::CreatedAt)
            .order_by_desc(Column::Id)
            .all(&self.db)
            .await?;
        Ok(rows.into_iter().map(|m| m.into_course()).collect())
    }

    /// 用户已选课程，最近选课在前
    pub async fn list_enrolled_courses_impl(&self, user_id: i64) -> Result<Vec<Course>> {
        let rows = Courses::find()
            .join(
                JoinType::InnerJoin,
                crate::entity::courses::Relation::Enrollments.def(),
            )
            .filter(enrollments::Column::UserId.eq(user_id))
            .order_by_desc(enrollments::Column::EnrolledAt)
            .order_by_desc(enrollments::Column::Id)
            .all(&self.db)
            .await?;
        Ok(rows.into_iter().map(|m| m.into_course()).collect())
    }

    pub async fn is_enrolled_impl(&self, user_id: i64, course_id: i64) -> Result<bool> {
        let count = enrollments::Entity::find()
            .filter(enrollments::Column::UserId.eq(user_id))
            .filter(enrollments::Column::CourseId.eq(course_id))
            .count(&self.db)
            .await?;
        Ok(count > 0)
    }

    pub async fn count_enrollments_impl(&self, course_id: i64) -> Result<i64> {
        let count = enrollments::Entity::find()
            .filter(enrollments::Column::CourseId.eq(course_id))
            .count(&self.db)
            .await?;
        Ok(count as i64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::common::PaginationQuery;
    use crate::models::users::entities::UserRole;
    use crate::storage::Storage;
    use crate::storage::sea_orm_storage::fixtures;

    #[tokio::test]
    async fn test_publish_requires_a_lecture() {
        let storage = SeaOrmStorage::new_in_memory().await;
        let instructor = fixtures::user(&storage, "t@example.com", UserRole::Instructor).await;
        let course = fixtures::draft_course(&storage, &instructor, "Rust 101", "Development").await;

        let err = storage
            .set_course_published(course.id, true)
            .await
            .unwrap_err();
        assert!(matches!(err, CourseHubError::Validation(_)));

        let section = fixtures::section(&storage, course.id, "Basics").await;
        fixtures::lecture(&storage, section.id, "Ownership", 300).await;
        let published = storage.set_course_published(course.id, true).await.unwrap();
        assert!(published.is_published);

        let unpublished = storage
            .set_course_published(course.id, false)
            .await
            .unwrap();
        assert!(!unpublished.is_published);
    }

    #[tokio::test]
    async fn test_published_listing_filters_drafts_and_category() {
        let storage = SeaOrmStorage::new_in_memory().await;
        let instructor = fixtures::user(&storage, "t@example.com", UserRole::Instructor).await;
        fixtures::published_course(&storage, &instructor, "Rust", "Development").await;
        fixtures::published_course(&storage, &instructor, "Figma", "Design").await;
        fixtures::draft_course(&storage, &instructor, "Draft", "Development").await;

        let all = storage
            .list_published_courses(PublishedCourseQuery {
                pagination: PaginationQuery::default(),
                category: None,
            })
            .await
            .unwrap();
        assert_eq!(all.pagination.total, 2);

        let design = storage
            .list_published_courses(PublishedCourseQuery {
                pagination: PaginationQuery::default(),
                category: Some("Design".into()),
            })
            .await
            .unwrap();
        assert_eq!(design.items.len(), 1);
        assert_eq!(design.items[0].title, "Figma");
    }

    #[tokio::test]
    async fn test_update_course_rejects_negative_price() {
        let storage = SeaOrmStorage::new_in_memory().await;
        let instructor = fixtures::user(&storage, "t@example.com", UserRole::Instructor).await;
        let course = fixtures::draft_course(&storage, &instructor, "Rust", "Development").await;

        let err = storage
            .update_course(
                course.id,
                UpdateCourseRequest {
                    price: Some(crate::models::courses::entities::CoursePrice {
                        original: 10.0,
                        current: -1.0,
                    }),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, CourseHubError::Validation(_)));

        let updated = storage
            .update_course(
                course.id,
                UpdateCourseRequest {
                    learnings: Some(vec!["Borrowing".into()]),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.learnings, vec!["Borrowing".to_string()]);
    }
}
