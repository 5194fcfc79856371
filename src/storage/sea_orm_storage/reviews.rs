use super::{SeaOrmStorage, map_unique_violation};
use crate::entity::{courses, enrollments, reviews, users};
use crate::errors::{CourseHubError, Result};
use crate::models::{
    reviews::responses::{CreateReviewResponse, ReviewWithUser},
    users::responses::PublicUser,
};
use crate::utils::validate::validate_required_text;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, TransactionTrait,
};

/// 平均分保留一位小数；没有评价时为 0
pub(crate) fn aggregate_ratings(ratings: &[i32]) -> (f64, i64) {
    if ratings.is_empty() {
        return (0.0, 0);
    }
    let count = ratings.len() as i64;
    let mean = ratings.iter().map(|&r| f64::from(r)).sum::<f64>() / count as f64;
    ((mean * 10.0).round() / 10.0, count)
}

impl SeaOrmStorage {
    /// 发表评价并重新计算课程评分
    pub async fn create_review_impl(
        &self,
        course_id: i64,
        user_id: i64,
        rating: i32,
        comment: &str,
    ) -> Result<CreateReviewResponse> {
        if !(1..=5).contains(&rating) {
            return Err(CourseHubError::validation(
                "Rating must be an integer between 1 and 5",
            ));
        }
        validate_required_text(comment, "Comment")?;

        let txn = self.db.begin().await?;

        courses::Entity::find_by_id(course_id)
            .one(&txn)
            .await?
            .ok_or_else(|| CourseHubError::not_found(format!("Course {course_id} not found")))?;

        let enrolled = enrollments::Entity::find()
            .filter(enrollments::Column::UserId.eq(user_id))
            .filter(enrollments::Column::CourseId.eq(course_id))
            .count(&txn)
            .await?;
        if enrolled == 0 {
            return Err(CourseHubError::forbidden(
                "Only enrolled students can review this course",
            ));
        }

        let already = reviews::Entity::find()
            .filter(reviews::Column::CourseId.eq(course_id))
            .filter(reviews::Column::UserId.eq(user_id))
            .count(&txn)
            .await?;
        if already > 0 {
            return Err(CourseHubError::conflict(
                "You have already reviewed this course",
            ));
        }

        let review = reviews::ActiveModel {
            course_id: Set(course_id),
            user_id: Set(user_id),
            rating: Set(rating),
            comment: Set(comment.trim().to_string()),
            created_at: Set(chrono::Utc::now().timestamp()),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .map_err(|e| map_unique_violation(e, "You have already reviewed this course"))?;

        let all_ratings: Vec<i32> = reviews::Entity::find()
            .select_only()
            .column(reviews::Column::Rating)
            .filter(reviews::Column::CourseId.eq(course_id))
            .into_tuple()
            .all(&txn)
            .await?;
        let (ratings, num_of_reviews) = aggregate_ratings(&all_ratings);

        courses::Entity::update_many()
            .col_expr(courses::Column::Ratings, Expr::value(ratings))
            .col_expr(courses::Column::NumOfReviews, Expr::value(num_of_reviews))
            .filter(courses::Column::Id.eq(course_id))
            .exec(&txn)
            .await?;

        txn.commit().await?;

        Ok(CreateReviewResponse {
            review: review.into_review(),
            ratings,
            num_of_reviews,
        })
    }

    /// 课程评价列表，最新在前
    pub async fn list_reviews_impl(&self, course_id: i64) -> Result<Vec<ReviewWithUser>> {
        let rows = reviews::Entity::find()
            .filter(reviews::Column::CourseId.eq(course_id))
            .order_by_desc(reviews::Column::CreatedAt)
            .order_by_desc(reviews::Column::Id)
            .find_also_related(users::Entity)
            .all(&self.db)
            .await?;

        Ok(rows
            .into_iter()
            .map(|(review, user)| ReviewWithUser {
                review: review.into_review(),
                user: user.map(|u| PublicUser::from(&u.into_user())),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::users::entities::UserRole;
    use crate::storage::Storage;
    use crate::storage::sea_orm_storage::fixtures;

    #[test]
    fn test_aggregate_ratings_rounds_to_one_decimal() {
        assert_eq!(aggregate_ratings(&[5, 5, 4]), (4.7, 3));
        assert_eq!(aggregate_ratings(&[1, 2]), (1.5, 2));
        assert_eq!(aggregate_ratings(&[]), (0.0, 0));
    }

    #[tokio::test]
    async fn test_reviews_update_course_rating() {
        let storage = SeaOrmStorage::new_in_memory().await;
        let instructor = fixtures::user(&storage, "t@example.com", UserRole::Instructor).await;
        let course = fixtures::published_course(&storage, &instructor, "Rust", "Development").await;

        for (email, rating) in [("a@x.io", 5), ("b@x.io", 5), ("c@x.io", 4)] {
            let student = fixtures::user(&storage, email, UserRole::Student).await;
            fixtures::enroll(&storage, &student, &course).await;
            storage
                .create_review(course.id, student.id, rating, "Great course")
                .await
                .unwrap();
        }

        let course = storage.get_course_by_id(course.id).await.unwrap().unwrap();
        assert_eq!(course.ratings, 4.7);
        assert_eq!(course.num_of_reviews, 3);

        let listed = storage.list_reviews(course.id).await.unwrap();
        assert_eq!(listed.len(), 3);
        assert!(listed.iter().all(|r| r.user.is_some()));
    }

    #[tokio::test]
    async fn test_duplicate_review_is_conflict_and_count_unchanged() {
        let storage = SeaOrmStorage::new_in_memory().await;
        let instructor = fixtures::user(&storage, "t@example.com", UserRole::Instructor).await;
        let course = fixtures::published_course(&storage, &instructor, "Rust", "Development").await;
        let student = fixtures::user(&storage, "s@example.com", UserRole::Student).await;
        fixtures::enroll(&storage, &student, &course).await;

        storage
            .create_review(course.id, student.id, 4, "Nice")
            .await
            .unwrap();
        let err = storage
            .create_review(course.id, student.id, 1, "Changed my mind")
            .await
            .unwrap_err();
        assert!(matches!(err, CourseHubError::Conflict(_)));

        let course = storage.get_course_by_id(course.id).await.unwrap().unwrap();
        assert_eq!(course.num_of_reviews, 1);
        assert_eq!(course.ratings, 4.0);
    }

    #[tokio::test]
    async fn test_review_preconditions() {
        let storage = SeaOrmStorage::new_in_memory().await;
        let instructor = fixtures::user(&storage, "t@example.com", UserRole::Instructor).await;
        let course = fixtures::published_course(&storage, &instructor, "Rust", "Development").await;
        let outsider = fixtures::user(&storage, "o@example.com", UserRole::Student).await;

        assert!(matches!(
            storage
                .create_review(course.id, outsider.id, 5, "Sneaky")
                .await
                .unwrap_err(),
            CourseHubError::Forbidden(_)
        ));
        assert!(matches!(
            storage
                .create_review(course.id, outsider.id, 6, "Too high")
                .await
                .unwrap_err(),
            CourseHubError::Validation(_)
        ));
        assert!(matches!(
            storage
                .create_review(course.id, outsider.id, 3, "   ")
                .await
                .unwrap_err(),
            CourseHubError::Validation(_)
        ));
        assert!(matches!(
            storage
                .create_review(777, outsider.id, 3, "Missing")
                .await
                .unwrap_err(),
            CourseHubError::NotFound(_)
        ));
    }
}
