//! 购买记录状态机：pending -> completed | failed
//!
//! 选课记录只在这里写入。

use super::SeaOrmStorage;
use crate::entity::{course_purchases, courses, enrollments};
use crate::errors::{CourseHubError, Result};
use crate::models::purchases::entities::{CoursePurchase, PurchaseStatus};
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use tracing::{info, warn};

/// 金额比较容差（两位小数货币）
const AMOUNT_TOLERANCE: f64 = 0.005;

async fn find_by_uuid<C: ConnectionTrait>(
    conn: &C,
    transaction_uuid: &str,
) -> Result<course_purchases::Model> {
    course_purchases::Entity::find()
        .filter(course_purchases::Column::TransactionUuid.eq(transaction_uuid))
        .one(conn)
        .await?
        .ok_or_else(|| {
            CourseHubError::not_found(format!("Purchase {transaction_uuid} not found"))
        })
}

/// 已存在则跳过，保证 (user, course) 只有一条选课记录
///
/// 依赖 (user_id, course_id) 唯一索引，冲突时不插入也不报错，并发回调同样安全。
async fn enroll_if_absent<C: ConnectionTrait>(conn: &C, user_id: i64, course_id: i64) -> Result<bool> {
    let inserted = enrollments::Entity::insert(enrollments::ActiveModel {
        user_id: Set(user_id),
        course_id: Set(course_id),
        enrolled_at: Set(chrono::Utc::now().timestamp()),
        ..Default::default()
    })
    .on_conflict(
        OnConflict::columns([enrollments::Column::UserId, enrollments::Column::CourseId])
            .do_nothing()
            .to_owned(),
    )
    .exec_without_returning(conn)
    .await?;
    Ok(inserted > 0)
}

impl SeaOrmStorage {
    /// 为已发布课程创建待支付记录，金额取课程现价
    pub async fn create_pending_purchase_impl(
        &self,
        user_id: i64,
        course_id: i64,
    ) -> Result<CoursePurchase> {
        let course = courses::Entity::find_by_id(course_id)
            .one(&self.db)
            .await?
            .filter(|c| c.is_published)
            .ok_or_else(|| CourseHubError::not_found(format!("Course {course_id} not found")))?;

        if self.is_enrolled_impl(user_id, course_id).await? {
            return Err(CourseHubError::conflict(
                "You are already enrolled in this course",
            ));
        }

        let now = chrono::Utc::now().timestamp();
        let created = course_purchases::ActiveModel {
            transaction_uuid: Set(uuid::Uuid::new_v4().to_string()),
            course_id: Set(course.id),
            user_id: Set(user_id),
            amount: Set(course.price_current),
            status: Set(PurchaseStatus::Pending.to_string()),
            payment_id: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&self.db)
        .await
        .map_err(|e| {
            CourseHubError::database_operation(format!("Failed to create purchase: {e}"))
        })?;

        Ok(created.into_purchase())
    }

    pub async fn get_purchase_by_uuid_impl(
        &self,
        transaction_uuid: &str,
    ) -> Result<Option<CoursePurchase>> {
        let result = course_purchases::Entity::find()
            .filter(course_purchases::Column::TransactionUuid.eq(transaction_uuid))
            .one(&self.db)
            .await?;
        Ok(result.map(|m| m.into_purchase()))
    }

    /// 网关确认支付成功（签名已由调用方校验）
    ///
    /// 重放已完成的回调不会改变状态，也不会产生重复选课。
    pub async fn complete_purchase_impl(
        &self,
        transaction_uuid: &str,
        payment_id: &str,
        total_amount: Option<f64>,
    ) -> Result<CoursePurchase> {
        let txn = self.db.begin().await?;
        let purchase = find_by_uuid(&txn, transaction_uuid).await?;

        let status = purchase
            .status
            .parse::<PurchaseStatus>()
            .map_err(CourseHubError::database_operation)?;

        match status {
            PurchaseStatus::Completed => {
                enroll_if_absent(&txn, purchase.user_id, purchase.course_id).await?;
                txn.commit().await?;
                info!("Replayed callback for completed purchase {}", transaction_uuid);
                return Ok(purchase.into_purchase());
            }
            PurchaseStatus::Failed => {
                return Err(CourseHubError::conflict(format!(
                    "Purchase {transaction_uuid} has already failed"
                )));
            }
            PurchaseStatus::Pending => {}
        }

        if let Some(amount) = total_amount
            && (amount - purchase.amount).abs() > AMOUNT_TOLERANCE
        {
            warn!(
                "Amount mismatch for purchase {}: expected {}, got {}",
                transaction_uuid, purchase.amount, amount
            );
            return Err(CourseHubError::validation(format!(
                "Paid amount {amount} does not match purchase amount {}",
                purchase.amount
            )));
        }

        let (user_id, course_id) = (purchase.user_id, purchase.course_id);
        let mut model: course_purchases::ActiveModel = purchase.into();
        model.status = Set(PurchaseStatus::Completed.to_string());
        model.payment_id = Set(Some(payment_id.to_string()));
        model.updated_at = Set(chrono::Utc::now().timestamp());
        let updated = model.update(&txn).await?;

        enroll_if_absent(&txn, user_id, course_id).await?;
        txn.commit().await?;

        info!(
            "Purchase {} completed, user {} enrolled in course {}",
            transaction_uuid, user_id, course_id
        );
        Ok(updated.into_purchase())
    }

    /// 网关失败回调；重复调用为空操作
    pub async fn fail_purchase_impl(&self, transaction_uuid: &str) -> Result<CoursePurchase> {
        let txn = self.db.begin().await?;
        let purchase = find_by_uuid(&txn, transaction_uuid).await?;

        match purchase.status.parse::<PurchaseStatus>() {
            Ok(PurchaseStatus::Failed) => return Ok(purchase.into_purchase()),
            Ok(PurchaseStatus::Completed) => {
                return Err(CourseHubError::conflict(format!(
                    "Purchase {transaction_uuid} is already completed"
                )));
            }
            Ok(PurchaseStatus::Pending) => {}
            Err(e) => return Err(CourseHubError::database_operation(e)),
        }

        let mut model: course_purchases::ActiveModel = purchase.into();
        model.status = Set(PurchaseStatus::Failed.to_string());
        model.updated_at = Set(chrono::Utc::now().timestamp());
        let updated = model.update(&txn).await?;
        txn.commit().await?;

        info!("Purchase {} marked as failed", transaction_uuid);
        Ok(updated.into_purchase())
    }

    pub async fn list_purchases_by_user_impl(&self, user_id: i64) -> Result<Vec<CoursePurchase>> {
        let rows = course_purchases::Entity::find()
            .filter(course_purchases::Column::UserId.eq(user_id))
            .order_by_desc(course_purchases::Column::CreatedAt)
            .order_by_desc(course_purchases::Column::Id)
            .all(&self.db)
            .await?;
        Ok(rows.into_iter().map(|m| m.into_purchase()).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::users::entities::UserRole;
    use crate::storage::Storage;
    use crate::storage::sea_orm_storage::fixtures;
    use sea_orm::PaginatorTrait;

    async fn enrollment_rows(storage: &SeaOrmStorage, course_id: i64) -> u64 {
        enrollments::Entity::find()
            .filter(enrollments::Column::CourseId.eq(course_id))
            .count(&storage.db)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_replayed_completion_enrolls_once() {
        let storage = SeaOrmStorage::new_in_memory().await;
        let instructor = fixtures::user(&storage, "t@example.com", UserRole::Instructor).await;
        let course = fixtures::published_course(&storage, &instructor, "Rust", "Development").await;
        let student = fixtures::user(&storage, "s@example.com", UserRole::Student).await;

        let pending = storage
            .create_pending_purchase(student.id, course.id)
            .await
            .unwrap();
        assert_eq!(pending.status, PurchaseStatus::Pending);
        assert_eq!(pending.amount, course.price.current);

        for _ in 0..2 {
            let done = storage
                .complete_purchase(&pending.transaction_uuid, "TXN-1", Some(100.0))
                .await
                .unwrap();
            assert_eq!(done.status, PurchaseStatus::Completed);
            assert_eq!(done.payment_id.as_deref(), Some("TXN-1"));
        }

        assert_eq!(enrollment_rows(&storage, course.id).await, 1);
        assert!(storage.is_enrolled(student.id, course.id).await.unwrap());
        assert_eq!(storage.count_enrollments(course.id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_enroll_if_absent_tolerates_existing_row() {
        let storage = SeaOrmStorage::new_in_memory().await;
        let instructor = fixtures::user(&storage, "t@example.com", UserRole::Instructor).await;
        let course = fixtures::published_course(&storage, &instructor, "Rust", "Development").await;
        let student = fixtures::user(&storage, "s@example.com", UserRole::Student).await;

        let pending = storage
            .create_pending_purchase(student.id, course.id)
            .await
            .unwrap();

        // 另一条回调抢先写入选课记录
        assert!(enroll_if_absent(&storage.db, student.id, course.id).await.unwrap());
        assert!(!enroll_if_absent(&storage.db, student.id, course.id).await.unwrap());

        let done = storage
            .complete_purchase(&pending.transaction_uuid, "TXN-3", None)
            .await
            .unwrap();
        assert_eq!(done.status, PurchaseStatus::Completed);
        assert_eq!(enrollment_rows(&storage, course.id).await, 1);
    }

    #[tokio::test]
    async fn test_amount_mismatch_leaves_purchase_pending() {
        let storage = SeaOrmStorage::new_in_memory().await;
        let instructor = fixtures::user(&storage, "t@example.com", UserRole::Instructor).await;
        let course = fixtures::published_course(&storage, &instructor, "Rust", "Development").await;
        let student = fixtures::user(&storage, "s@example.com", UserRole::Student).await;
        let pending = storage
            .create_pending_purchase(student.id, course.id)
            .await
            .unwrap();

        let err = storage
            .complete_purchase(&pending.transaction_uuid, "TXN-2", Some(1.0))
            .await
            .unwrap_err();
        assert!(matches!(err, CourseHubError::Validation(_)));

        let stored = storage
            .get_purchase_by_uuid(&pending.transaction_uuid)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.status, PurchaseStatus::Pending);
        assert_eq!(enrollment_rows(&storage, course.id).await, 0);
    }

    #[tokio::test]
    async fn test_failure_transitions() {
        let storage = SeaOrmStorage::new_in_memory().await;
        let instructor = fixtures::user(&storage, "t@example.com", UserRole::Instructor).await;
        let course = fixtures::published_course(&storage, &instructor, "Rust", "Development").await;
        let student = fixtures::user(&storage, "s@example.com", UserRole::Student).await;

        let first = storage
            .create_pending_purchase(student.id, course.id)
            .await
            .unwrap();
        let failed = storage
            .fail_purchase(&first.transaction_uuid)
            .await
            .unwrap();
        assert_eq!(failed.status, PurchaseStatus::Failed);
        // 失败是终态
        assert_eq!(
            storage
                .fail_purchase(&first.transaction_uuid)
                .await
                .unwrap()
                .status,
            PurchaseStatus::Failed
        );
        assert!(matches!(
            storage
                .complete_purchase(&first.transaction_uuid, "TXN", None)
                .await
                .unwrap_err(),
            CourseHubError::Conflict(_)
        ));

        let second = storage
            .create_pending_purchase(student.id, course.id)
            .await
            .unwrap();
        storage
            .complete_purchase(&second.transaction_uuid, "TXN-OK", None)
            .await
            .unwrap();
        assert!(matches!(
            storage
                .fail_purchase(&second.transaction_uuid)
                .await
                .unwrap_err(),
            CourseHubError::Conflict(_)
        ));
        assert!(matches!(
            storage
                .create_pending_purchase(student.id, course.id)
                .await
                .unwrap_err(),
            CourseHubError::Conflict(_)
        ));
        assert!(matches!(
            storage.complete_purchase("missing", "X", None).await.unwrap_err(),
            CourseHubError::NotFound(_)
        ));

        assert_eq!(
            storage
                .list_purchases_by_user(student.id)
                .await
                .unwrap()
                .len(),
            2
        );
    }

    #[tokio::test]
    async fn test_draft_course_cannot_be_purchased() {
        let storage = SeaOrmStorage::new_in_memory().await;
        let instructor = fixtures::user(&storage, "t@example.com", UserRole::Instructor).await;
        let draft = fixtures::draft_course(&storage, &instructor, "Draft", "Development").await;
        let student = fixtures::user(&storage, "s@example.com", UserRole::Student).await;

        assert!(matches!(
            storage
                .create_pending_purchase(student.id, draft.id)
                .await
                .unwrap_err(),
            CourseHubError::NotFound(_)
        ));
    }
}
