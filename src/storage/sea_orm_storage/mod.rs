//! SeaORM 存储实现
//!
//! 统一的数据库存储层，支持 SQLite、PostgreSQL 和 MySQL。
//! 涉及多行写入的操作（课程统计、评分、支付对账）都在单个事务中完成。

mod articles;
mod catalog;
mod categories;
mod courses;
mod purchases;
mod reviews;
mod search;
mod users;

#[cfg(test)]
pub(crate) mod fixtures;

use crate::config::AppConfig;
use crate::errors::{CourseHubError, Result};
use migration::{Migrator, MigratorTrait};
use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr, SqlErr};
use std::time::Duration;
use tracing::info;

/// SeaORM 存储实现
#[derive(Clone)]
pub struct SeaOrmStorage {
    pub(crate) db: DatabaseConnection,
}

impl SeaOrmStorage {
    /// 创建新的 SeaORM 存储实例
    pub async fn new_async() -> Result<Self> {
        let config = AppConfig::get();
        let db_url = Self::build_database_url(&config.database.url)?;

        let db = if db_url.starts_with("sqlite:") {
            Self::connect_sqlite(&db_url, config.database.pool_size, config.database.timeout)
                .await?
        } else {
            Self::connect_generic(&db_url, config).await?
        };

        Migrator::up(&db, None)
            .await
            .map_err(|e| CourseHubError::database_operation(format!("Migration failed: {e}")))?;

        info!("SeaORM storage initialized, database: {}", db_url);

        Ok(Self { db })
    }

    /// SQLite 专用连接（WAL + pragma 优化）
    async fn connect_sqlite(url: &str, pool_size: u32, timeout: u64) -> Result<DatabaseConnection> {
        use sea_orm::SqlxSqliteConnector;
        use sea_orm::sqlx::sqlite::{
            SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous,
        };
        use std::str::FromStr;

        let opt = SqliteConnectOptions::from_str(url)
            .map_err(|e| CourseHubError::database_config(format!("Invalid SQLite URL: {e}")))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(Duration::from_secs(5))
            .foreign_keys(true)
            .pragma("cache_size", "-64000")
            .pragma("temp_store", "memory");

        let pool = SqlitePoolOptions::new()
            .max_connections(pool_size)
            .min_connections(1)
            .test_before_acquire(true)
            .acquire_timeout(Duration::from_secs(timeout))
            .idle_timeout(Duration::from_secs(300))
            .connect_with(opt)
            .await
            .map_err(|e| {
                CourseHubError::database_connection(format!("SQLite connection failed: {e}"))
            })?;

        Ok(SqlxSqliteConnector::from_sqlx_sqlite_pool(pool))
    }

    /// 通用连接（PostgreSQL、MySQL 等）
    async fn connect_generic(url: &str, config: &AppConfig) -> Result<DatabaseConnection> {
        let mut opt = ConnectOptions::new(url);
        opt.max_connections(config.database.pool_size)
            .min_connections(2)
            .connect_timeout(Duration::from_secs(config.database.timeout))
            .acquire_timeout(Duration::from_secs(config.database.timeout))
            .idle_timeout(Duration::from_secs(600))
            .max_lifetime(Duration::from_secs(1800))
            .sqlx_logging(false)
            .sqlx_logging_level(tracing::log::LevelFilter::Debug);

        Database::connect(opt).await.map_err(|e| {
            CourseHubError::database_connection(format!("Failed to connect to database: {e}"))
        })
    }

    /// 从 URL 推断数据库类型并构建连接 URL
    fn build_database_url(url: &str) -> Result<String> {
        if url.starts_with("sqlite:") {
            Ok(url.to_string())
        } else if url.ends_with(".db") || url.ends_with(".sqlite") {
            Ok(format!("sqlite://{url}?mode=rwc"))
        } else if url.starts_with("postgres://")
            || url.starts_with("postgresql://")
            || url.starts_with("mysql://")
            || url.starts_with("mariadb://")
        {
            Ok(url.to_string())
        } else {
            Err(CourseHubError::database_config(format!(
                "Cannot infer database type from URL: {url}. Supported: sqlite://, postgres://, mysql://, or a .db/.sqlite path"
            )))
        }
    }

    /// 测试用内存数据库，单连接保证所有查询看到同一个库
    #[cfg(test)]
    pub(crate) async fn new_in_memory() -> Self {
        let db = Self::connect_sqlite("sqlite::memory:", 1, 5)
            .await
            .expect("in-memory sqlite");
        Migrator::up(&db, None).await.expect("migrations");
        Self { db }
    }
}

/// 唯一约束冲突转换为 Conflict，其余数据库错误按操作失败处理
pub(crate) fn map_unique_violation(err: DbErr, conflict_message: &str) -> CourseHubError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => CourseHubError::conflict(conflict_message),
        _ => CourseHubError::database_operation(err.to_string()),
    }
}

// Storage trait 实现
use crate::models::{
    articles::{entities::Article, requests::CreateArticleRequest},
    categories::entities::Category,
    courses::{
        entities::Course,
        requests::{CreateCourseRequest, PublishedCourseQuery, UpdateCourseRequest},
        responses::{CourseListResponse, CourseTotals},
    },
    curriculum::{
        entities::{Lecture, Section},
        requests::{CreateLectureRequest, LecturePatch, LectureVideo},
        responses::SectionWithLectures,
    },
    purchases::entities::CoursePurchase,
    reviews::responses::{CreateReviewResponse, ReviewWithUser},
    search::{requests::CourseSearchQuery, responses::SearchSuggestionsResponse},
    users::{
        entities::{User, UserRole},
        requests::{NewUser, UpdateProfileRequest},
    },
};
use crate::storage::Storage;
use async_trait::async_trait;

#[async_trait]
impl Storage for SeaOrmStorage {
    // 用户模块
    async fn create_user(&self, user: NewUser) -> Result<User> {
        self.create_user_impl(user).await
    }

    async fn get_user_by_id(&self, id: i64) -> Result<Option<User>> {
        self.get_user_by_id_impl(id).await
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        self.get_user_by_email_impl(email).await
    }

    async fn update_profile(&self, id: i64, update: UpdateProfileRequest) -> Result<Option<User>> {
        self.update_profile_impl(id, update).await
    }

    async fn update_user_photo(
        &self,
        id: i64,
        photo_url: &str,
        photo_public_id: &str,
    ) -> Result<Option<User>> {
        self.update_user_photo_impl(id, photo_url, photo_public_id)
            .await
    }

    async fn update_last_login(&self, id: i64) -> Result<bool> {
        self.update_last_login_impl(id).await
    }

    async fn count_users_by_role(&self, role: UserRole) -> Result<u64> {
        self.count_users_by_role_impl(role).await
    }

    // 分类模块
    async fn list_categories(&self) -> Result<Vec<Category>> {
        self.list_categories_impl().await
    }

    async fn create_category(&self, name: &str, slug: &str) -> Result<Category> {
        self.create_category_impl(name, slug).await
    }

    // 课程模块
    async fn create_course(&self, creator_id: i64, req: CreateCourseRequest) -> Result<Course> {
        self.create_course_impl(creator_id, req).await
    }

    async fn get_course_by_id(&self, id: i64) -> Result<Option<Course>> {
        self.get_course_by_id_impl(id).await
    }

    async fn update_course(&self, id: i64, update: UpdateCourseRequest) -> Result<Option<Course>> {
        self.update_course_impl(id, update).await
    }

    async fn set_course_published(&self, id: i64, publish: bool) -> Result<Course> {
        self.set_course_published_impl(id, publish).await
    }

    async fn list_published_courses(
        &self,
        query: PublishedCourseQuery,
    ) -> Result<CourseListResponse> {
        self.list_published_courses_impl(query).await
    }

    async fn list_courses_by_creator(&self, creator_id: i64) -> Result<Vec<Course>> {
        self.list_courses_by_creator_impl(creator_id).await
    }

    async fn list_enrolled_courses(&self, user_id: i64) -> Result<Vec<Course>> {
        self.list_enrolled_courses_impl(user_id).await
    }

    async fn is_enrolled(&self, user_id: i64, course_id: i64) -> Result<bool> {
        self.is_enrolled_impl(user_id, course_id).await
    }

    async fn count_enrollments(&self, course_id: i64) -> Result<i64> {
        self.count_enrollments_impl(course_id).await
    }

    // 课程目录模块
    async fn get_curriculum(&self, course_id: i64) -> Result<Vec<SectionWithLectures>> {
        self.get_curriculum_impl(course_id).await
    }

    async fn create_section(&self, course_id: i64, title: &str) -> Result<Section> {
        self.create_section_impl(course_id, title).await
    }

    async fn get_section_by_id(&self, id: i64) -> Result<Option<Section>> {
        self.get_section_by_id_impl(id).await
    }

    async fn rename_section(&self, id: i64, title: &str) -> Result<Section> {
        self.rename_section_impl(id, title).await
    }

    async fn list_section_lectures(&self, section_id: i64) -> Result<Vec<Lecture>> {
        self.list_section_lectures_impl(section_id).await
    }

    async fn delete_section(&self, id: i64) -> Result<CourseTotals> {
        self.delete_section_impl(id).await
    }

    async fn create_lecture(&self, section_id: i64, req: CreateLectureRequest) -> Result<Lecture> {
        self.create_lecture_impl(section_id, req).await
    }

    async fn get_lecture_by_id(&self, id: i64) -> Result<Option<Lecture>> {
        self.get_lecture_by_id_impl(id).await
    }

    async fn update_lecture(
        &self,
        id: i64,
        patch: LecturePatch,
        video: Option<LectureVideo>,
    ) -> Result<Lecture> {
        self.update_lecture_impl(id, patch, video).await
    }

    async fn delete_lecture(&self, id: i64) -> Result<Lecture> {
        self.delete_lecture_impl(id).await
    }

    async fn recompute_course_totals(&self, course_id: i64) -> Result<CourseTotals> {
        self.recompute_course_totals_impl(course_id).await
    }

    // 评价模块
    async fn create_review(
        &self,
        course_id: i64,
        user_id: i64,
        rating: i32,
        comment: &str,
    ) -> Result<CreateReviewResponse> {
        self.create_review_impl(course_id, user_id, rating, comment)
            .await
    }

    async fn list_reviews(&self, course_id: i64) -> Result<Vec<ReviewWithUser>> {
        self.list_reviews_impl(course_id).await
    }

    // 购买模块
    async fn create_pending_purchase(
        &self,
        user_id: i64,
        course_id: i64,
    ) -> Result<CoursePurchase> {
        self.create_pending_purchase_impl(user_id, course_id).await
    }

    async fn get_purchase_by_uuid(&self, transaction_uuid: &str) -> Result<Option<CoursePurchase>> {
        self.get_purchase_by_uuid_impl(transaction_uuid).await
    }

    async fn complete_purchase(
        &self,
        transaction_uuid: &str,
        payment_id: &str,
        total_amount: Option<f64>,
    ) -> Result<CoursePurchase> {
        self.complete_purchase_impl(transaction_uuid, payment_id, total_amount)
            .await
    }

    async fn fail_purchase(&self, transaction_uuid: &str) -> Result<CoursePurchase> {
        self.fail_purchase_impl(transaction_uuid).await
    }

    async fn list_purchases_by_user(&self, user_id: i64) -> Result<Vec<CoursePurchase>> {
        self.list_purchases_by_user_impl(user_id).await
    }

    // 搜索模块
    async fn search_courses(&self, query: CourseSearchQuery) -> Result<Vec<Course>> {
        self.search_courses_impl(query).await
    }

    async fn search_suggestions(&self, q: &str) -> Result<SearchSuggestionsResponse> {
        self.search_suggestions_impl(q).await
    }

    async fn recommend_courses(&self, user_id: Option<i64>) -> Result<Vec<Course>> {
        self.recommend_courses_impl(user_id).await
    }

    // 文章模块
    async fn create_article(
        &self,
        author_id: i64,
        slug: &str,
        req: CreateArticleRequest,
    ) -> Result<Article> {
        self.create_article_impl(author_id, slug, req).await
    }

    async fn list_published_articles(&self) -> Result<Vec<Article>> {
        self.list_published_articles_impl().await
    }

    async fn get_article_by_slug(&self, slug: &str) -> Result<Option<Article>> {
        self.get_article_by_slug_impl(slug).await
    }
}
