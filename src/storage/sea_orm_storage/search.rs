//! 课程搜索、联合搜索建议与推荐
//!
//! 匹配统一在 Rust 中以 Unicode 小写比较，不依赖各数据库的 LIKE 大小写规则。

use std::collections::{HashMap, HashSet};

use super::SeaOrmStorage;
use crate::entity::{courses, enrollments, search_suggestions, users};
use crate::errors::Result;
use crate::models::{
    courses::entities::Course,
    search::{
        requests::{CourseSearchQuery, PriceSort},
        responses::{CourseSuggestion, SearchSuggestionsResponse},
    },
};
use crate::utils::sql::{LIKE_ESCAPE, escape_like_pattern};
use sea_orm::sea_query::{Expr, ExprTrait, LikeExpr, OnConflict};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set};
use tracing::debug;

/// 推荐课程数量
pub const RECOMMENDATION_LIMIT: usize = 8;
/// 联合搜索中课程与搜索词各自的上限
pub const SUGGESTION_LIMIT: usize = 5;

fn contains_folded(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(needle)
}

fn matches_course(course: &Course, needle: &str) -> bool {
    contains_folded(&course.title, needle)
        || contains_folded(&course.subtitle, needle)
        || contains_folded(&course.category, needle)
}

/// 推荐排序
///
/// - 未登录或没有选课：按选课人数取前 `limit` 门
/// - 否则优先推荐已选分类中未选的课程
/// - 已选分类中没有可推荐的课程时，退回到所有未选课程
///
/// 人数相同按课程 id 升序。
pub fn rank_recommendations(
    mut published: Vec<(Course, i64)>,
    enrolled_ids: &HashSet<i64>,
    enrolled_categories: &HashSet<String>,
    limit: usize,
) -> Vec<Course> {
    published.sort_by(|(a, a_count), (b, b_count)| b_count.cmp(a_count).then(a.id.cmp(&b.id)));

    if enrolled_ids.is_empty() {
        return published.into_iter().take(limit).map(|(c, _)| c).collect();
    }

    let candidates: Vec<Course> = published
        .into_iter()
        .filter(|(c, _)| !enrolled_ids.contains(&c.id))
        .map(|(c, _)| c)
        .collect();

    let same_category: Vec<&Course> = candidates
        .iter()
        .filter(|c| enrolled_categories.contains(&c.category))
        .take(limit)
        .collect();
    if !same_category.is_empty() {
        return same_category.into_iter().cloned().collect();
    }

    candidates.into_iter().take(limit).collect()
}

impl SeaOrmStorage {
    /// 已发布课程搜索，结果不分页
    pub async fn search_courses_impl(&self, query: CourseSearchQuery) -> Result<Vec<Course>> {
        let categories = query.category_list();
        let mut select = courses::Entity::find().filter(courses::Column::IsPublished.eq(true));
        if !categories.is_empty() {
            select = select.filter(courses::Column::Category.is_in(categories));
        }

        let needle = query
            .query
            .as_deref()
            .map(|q| q.trim().to_lowercase())
            .filter(|q| !q.is_empty());

        let mut found: Vec<Course> = select
            .all(&self.db)
            .await?
            .into_iter()
            .map(|m| m.into_course())
            .filter(|c| needle.as_deref().is_none_or(|n| matches_course(c, n)))
            .collect();

        match query.sort_by_price {
            Some(PriceSort::Low) => found.sort_by(|a, b| {
                a.price
                    .current
                    .total_cmp(&b.price.current)
                    .then(a.id.cmp(&b.id))
            }),
            Some(PriceSort::High) => found.sort_by(|a, b| {
                b.price
                    .current
                    .total_cmp(&a.price.current)
                    .then(a.id.cmp(&b.id))
            }),
            None => found.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id))),
        }

        Ok(found)
    }

    /// 联合搜索：匹配的课程（含讲师名）加上历史搜索词，并记录本次搜索词
    pub async fn search_suggestions_impl(&self, q: &str) -> Result<SearchSuggestionsResponse> {
        let term = q.trim().to_lowercase();
        if term.is_empty() {
            return Ok(SearchSuggestionsResponse {
                courses: Vec::new(),
                suggestions: Vec::new(),
            });
        }

        let rows = courses::Entity::find()
            .filter(courses::Column::IsPublished.eq(true))
            .order_by_desc(courses::Column::CreatedAt)
            .order_by_desc(courses::Column::Id)
            .find_also_related(users::Entity)
            .all(&self.db)
            .await?;

        let courses: Vec<CourseSuggestion> = rows
            .into_iter()
            .filter_map(|(course, creator)| {
                let creator_name = creator.map(|u| u.name).unwrap_or_default();
                let course = course.into_course();
                (matches_course(&course, &term) || contains_folded(&creator_name, &term)).then(
                    || CourseSuggestion {
                        id: course.id,
                        title: course.title,
                        subtitle: course.subtitle,
                        category: course.category,
                        thumbnail_url: course.thumbnail_url,
                        creator_name,
                    },
                )
            })
            .take(SUGGESTION_LIMIT)
            .collect();

        let pattern = format!("{}%", escape_like_pattern(&term));
        let suggestions: Vec<String> = search_suggestions::Entity::find()
            .filter(
                Expr::col(search_suggestions::Column::Term)
                    .like(LikeExpr::new(pattern).escape(LIKE_ESCAPE)),
            )
            .order_by_desc(search_suggestions::Column::Hits)
            .order_by_asc(search_suggestions::Column::Term)
            .limit(SUGGESTION_LIMIT as u64)
            .all(&self.db)
            .await?
            .into_iter()
            .map(|s| s.term)
            .collect();

        self.record_search_term(&term).await?;

        Ok(SearchSuggestionsResponse {
            courses,
            suggestions,
        })
    }

    /// 记录搜索词命中次数，依赖 term 唯一索引做原子 upsert
    async fn record_search_term(&self, term: &str) -> Result<()> {
        let now = chrono::Utc::now().timestamp();
        search_suggestions::Entity::insert(search_suggestions::ActiveModel {
            term: Set(term.to_string()),
            hits: Set(1),
            updated_at: Set(now),
            ..Default::default()
        })
        .on_conflict(
            OnConflict::column(search_suggestions::Column::Term)
                .value(
                    search_suggestions::Column::Hits,
                    Expr::col(search_suggestions::Column::Hits).add(1),
                )
                .value(search_suggestions::Column::UpdatedAt, Expr::value(now))
                .to_owned(),
        )
        .exec_without_returning(&self.db)
        .await?;
        debug!("Recorded search term '{}'", term);
        Ok(())
    }

    pub async fn recommend_courses_impl(&self, user_id: Option<i64>) -> Result<Vec<Course>> {
        let counts: HashMap<i64, i64> = enrollments::Entity::find()
            .select_only()
            .column(enrollments::Column::CourseId)
            .column_as(enrollments::Column::Id.count(), "count")
            .group_by(enrollments::Column::CourseId)
            .into_tuple::<(i64, i64)>()
            .all(&self.db)
            .await?
            .into_iter()
            .collect();

        let published: Vec<(Course, i64)> = courses::Entity::find()
            .filter(courses::Column::IsPublished.eq(true))
            .all(&self.db)
            .await?
            .into_iter()
            .map(|m| {
                let count = counts.get(&m.id).copied().unwrap_or(0);
                (m.into_course(), count)
            })
            .collect();

        let (enrolled_ids, enrolled_categories) = match user_id {
            Some(user_id) => {
                let enrolled = self.list_enrolled_courses_impl(user_id).await?;
                (
                    enrolled.iter().map(|c| c.id).collect(),
                    enrolled.into_iter().map(|c| c.category).collect(),
                )
            }
            None => (HashSet::new(), HashSet::new()),
        };

        Ok(rank_recommendations(
            published,
            &enrolled_ids,
            &enrolled_categories,
            RECOMMENDATION_LIMIT,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::users::entities::UserRole;
    use crate::storage::Storage;
    use crate::storage::sea_orm_storage::fixtures;
    use sea_orm::ConnectionTrait;

    fn ids(courses: &[Course]) -> Vec<i64> {
        courses.iter().map(|c| c.id).collect()
    }

    #[tokio::test]
    async fn test_search_is_case_insensitive() {
        let storage = SeaOrmStorage::new_in_memory().await;
        let instructor = fixtures::user(&storage, "t@example.com", UserRole::Instructor).await;
        fixtures::published_course(&storage, &instructor, "Python for Data", "Data Science").await;
        fixtures::published_course(&storage, &instructor, "Intro to Rust", "Development").await;
        fixtures::draft_course(&storage, &instructor, "Python Draft", "Development").await;

        let upper = storage
            .search_courses(CourseSearchQuery {
                query: Some("PYTHON".into()),
                ..Default::default()
            })
            .await
            .unwrap();
        let lower = storage
            .search_courses(CourseSearchQuery {
                query: Some("python".into()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(ids(&upper), ids(&lower));
        assert_eq!(upper.len(), 1);

        // 分类也参与匹配
        let by_category = storage
            .search_courses(CourseSearchQuery {
                query: Some("development".into()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(by_category.len(), 1);
        assert_eq!(by_category[0].title, "Intro to Rust");
    }

    #[tokio::test]
    async fn test_search_category_filter_and_price_sort() {
        let storage = SeaOrmStorage::new_in_memory().await;
        let instructor = fixtures::user(&storage, "t@example.com", UserRole::Instructor).await;
        let cheap = fixtures::published_course(&storage, &instructor, "Cheap", "Design").await;
        let pricey = fixtures::published_course(&storage, &instructor, "Pricey", "Design").await;
        fixtures::published_course(&storage, &instructor, "Other", "Music").await;

        for (id, price) in [(cheap.id, 10.0), (pricey.id, 90.0)] {
            storage
                .update_course(
                    id,
                    crate::models::courses::requests::UpdateCourseRequest {
                        price: Some(crate::models::courses::entities::CoursePrice {
                            original: price,
                            current: price,
                        }),
                        ..Default::default()
                    },
                )
                .await
                .unwrap();
        }

        let high = storage
            .search_courses(CourseSearchQuery {
                categories: Some("Design".into()),
                sort_by_price: Some(PriceSort::High),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(ids(&high), vec![pricey.id, cheap.id]);

        let low = storage
            .search_courses(CourseSearchQuery {
                categories: Some("Design".into()),
                sort_by_price: Some(PriceSort::Low),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(ids(&low), vec![cheap.id, pricey.id]);
    }

    #[tokio::test]
    async fn test_suggestions_match_creator_and_record_terms() {
        let storage = SeaOrmStorage::new_in_memory().await;
        let instructor = fixtures::user(&storage, "linus@example.com", UserRole::Instructor).await;
        fixtures::published_course(&storage, &instructor, "Kernel Hacking", "Systems").await;

        let first = storage.search_suggestions("Linus").await.unwrap();
        assert_eq!(first.courses.len(), 1);
        assert_eq!(first.courses[0].creator_name, "linus");
        assert!(first.suggestions.is_empty());

        storage.search_suggestions("linux").await.unwrap();
        let again = storage.search_suggestions("lin").await.unwrap();
        assert_eq!(again.suggestions.len(), 2);
        assert!(again.suggestions.contains(&"linus".to_string()));

        let empty = storage.search_suggestions("   ").await.unwrap();
        assert!(empty.courses.is_empty() && empty.suggestions.is_empty());
    }

    #[tokio::test]
    async fn test_record_search_term_counts_hits_and_reports_errors() {
        let storage = SeaOrmStorage::new_in_memory().await;

        storage.record_search_term("rust").await.unwrap();
        storage.record_search_term("rust").await.unwrap();
        let row = search_suggestions::Entity::find()
            .filter(search_suggestions::Column::Term.eq("rust"))
            .one(&storage.db)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(row.hits, 2);

        // 存储故障不能被吞掉
        storage
            .db
            .execute_unprepared("DROP TABLE search_suggestions")
            .await
            .unwrap();
        assert!(storage.record_search_term("rust").await.is_err());
    }

    #[tokio::test]
    async fn test_recommendations_fall_back_to_popular() {
        let storage = SeaOrmStorage::new_in_memory().await;
        let instructor = fixtures::user(&storage, "t@example.com", UserRole::Instructor).await;
        let rust = fixtures::published_course(&storage, &instructor, "Rust", "Development").await;
        let figma = fixtures::published_course(&storage, &instructor, "Figma", "Design").await;
        let piano = fixtures::published_course(&storage, &instructor, "Piano", "Music").await;

        let fan = fixtures::user(&storage, "fan@example.com", UserRole::Student).await;
        fixtures::enroll(&storage, &fan, &piano).await;
        let other = fixtures::user(&storage, "o@example.com", UserRole::Student).await;
        fixtures::enroll(&storage, &other, &piano).await;
        fixtures::enroll(&storage, &other, &figma).await;

        // 匿名：按人数排序，人数相同按 id
        let anonymous = storage.recommend_courses(None).await.unwrap();
        assert_eq!(ids(&anonymous), vec![piano.id, figma.id, rust.id]);

        // Development 分类只有 Rust 一门课，选完后退回到其他热门课程
        let learner = fixtures::user(&storage, "l@example.com", UserRole::Student).await;
        fixtures::enroll(&storage, &learner, &rust).await;
        let fallback = storage.recommend_courses(Some(learner.id)).await.unwrap();
        assert_eq!(ids(&fallback), vec![piano.id, figma.id]);
    }

    #[test]
    fn test_rank_prefers_enrolled_categories() {
        let now = chrono::Utc::now();
        let course = |id: i64, category: &str| Course {
            id,
            creator_id: 1,
            title: format!("c{id}"),
            subtitle: String::new(),
            description: String::new(),
            language: "English".into(),
            category: category.into(),
            level: crate::models::courses::entities::CourseLevel::AllLevels,
            price: crate::models::courses::entities::CoursePrice {
                original: 1.0,
                current: 1.0,
            },
            thumbnail_url: None,
            is_bestseller: false,
            total_lectures: 1,
            total_duration_in_seconds: 1,
            learnings: vec![],
            requirements: vec![],
            includes: vec![],
            is_published: true,
            ratings: 0.0,
            num_of_reviews: 0,
            created_at: now,
            updated_at: now,
        };

        let published = vec![
            (course(1, "Dev"), 1),
            (course(2, "Dev"), 5),
            (course(3, "Art"), 50),
            (course(4, "Dev"), 5),
        ];
        let enrolled: HashSet<i64> = [1].into();
        let categories: HashSet<String> = ["Dev".to_string()].into();

        let ranked = rank_recommendations(published, &enrolled, &categories, 8);
        assert_eq!(ids(&ranked), vec![2, 4]);
    }
}
