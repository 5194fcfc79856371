use std::sync::Arc;

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

use crate::errors::Result;

pub mod sea_orm_storage;

#[async_trait::async_trait]
pub trait Storage: Send + Sync {
    /// 用户
    // 创建用户，邮箱重复返回 Conflict
    async fn create_user(&self, user: NewUser) -> Result<User>;
    async fn get_user_by_id(&self, id: i64) -> Result<Option<User>>;
    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>>;
    async fn update_profile(&self, id: i64, update: UpdateProfileRequest) -> Result<Option<User>>;
    // 替换头像（url 与对象 id 一起写入）
    async fn update_user_photo(
        &self,
        id: i64,
        photo_url: &str,
        photo_public_id: &str,
    ) -> Result<Option<User>>;
    async fn update_last_login(&self, id: i64) -> Result<bool>;
    async fn count_users_by_role(&self, role: UserRole) -> Result<u64>;

    /// 分类
    async fn list_categories(&self) -> Result<Vec<Category>>;
    async fn create_category(&self, name: &str, slug: &str) -> Result<Category>;

    /// 课程
    async fn create_course(&self, creator_id: i64, req: CreateCourseRequest) -> Result<Course>;
    async fn get_course_by_id(&self, id: i64) -> Result<Option<Course>>;
    async fn update_course(&self, id: i64, update: UpdateCourseRequest) -> Result<Option<Course>>;
    // 发布时要求至少一个课时
    async fn set_course_published(&self, id: i64, publish: bool) -> Result<Course>;
    async fn list_published_courses(&self, query: PublishedCourseQuery)
    -> Result<CourseListResponse>;
    async fn list_courses_by_creator(&self, creator_id: i64) -> Result<Vec<Course>>;
    async fn list_enrolled_courses(&self, user_id: i64) -> Result<Vec<Course>>;
    async fn is_enrolled(&self, user_id: i64, course_id: i64) -> Result<bool>;
    async fn count_enrollments(&self, course_id: i64) -> Result<i64>;

    /// 课程目录（章节与课时）
    async fn get_curriculum(&self, course_id: i64) -> Result<Vec<SectionWithLectures>>;
    async fn create_section(&self, course_id: i64, title: &str) -> Result<Section>;
    async fn get_section_by_id(&self, id: i64) -> Result<Option<Section>>;
    async fn rename_section(&self, id: i64, title: &str) -> Result<Section>;
    async fn list_section_lectures(&self, section_id: i64) -> Result<Vec<Lecture>>;
    // 删除章节及其课时，并从课程统计中扣除
    async fn delete_section(&self, id: i64) -> Result<CourseTotals>;
    async fn create_lecture(&self, section_id: i64, req: CreateLectureRequest) -> Result<Lecture>;
    async fn get_lecture_by_id(&self, id: i64) -> Result<Option<Lecture>>;
    async fn update_lecture(
        &self,
        id: i64,
        patch: LecturePatch,
        video: Option<LectureVideo>,
    ) -> Result<Lecture>;
    async fn delete_lecture(&self, id: i64) -> Result<Lecture>;
    async fn recompute_course_totals(&self, course_id: i64) -> Result<CourseTotals>;

    /// 评价
    async fn create_review(
        &self,
        course_id: i64,
        user_id: i64,
        rating: i32,
        comment: &str,
    ) -> Result<CreateReviewResponse>;
    async fn list_reviews(&self, course_id: i64) -> Result<Vec<ReviewWithUser>>;

    /// 购买与选课
    async fn create_pending_purchase(&self, user_id: i64, course_id: i64)
    -> Result<CoursePurchase>;
    async fn get_purchase_by_uuid(&self, transaction_uuid: &str) -> Result<Option<CoursePurchase>>;
    // 校验通过的回调：置为 completed 并写入选课（幂等）
    async fn complete_purchase(
        &self,
        transaction_uuid: &str,
        payment_id: &str,
        total_amount: Option<f64>,
    ) -> Result<CoursePurchase>;
    async fn fail_purchase(&self, transaction_uuid: &str) -> Result<CoursePurchase>;
    async fn list_purchases_by_user(&self, user_id: i64) -> Result<Vec<CoursePurchase>>;

    /// 搜索与推荐
    async fn search_courses(&self, query: CourseSearchQuery) -> Result<Vec<Course>>;
    async fn search_suggestions(&self, q: &str) -> Result<SearchSuggestionsResponse>;
    async fn recommend_courses(&self, user_id: Option<i64>) -> Result<Vec<Course>>;

    /// 文章
    async fn create_article(
        &self,
        author_id: i64,
        slug: &str,
        req: CreateArticleRequest,
    ) -> Result<Article>;
    async fn list_published_articles(&self) -> Result<Vec<Article>>;
    async fn get_article_by_slug(&self, slug: &str) -> Result<Option<Article>>;
}

pub async fn create_storage() -> Result<Arc<dyn Storage>> {
    let storage = sea_orm_storage::SeaOrmStorage::new_async().await?;
    Ok(Arc::new(storage))
}
