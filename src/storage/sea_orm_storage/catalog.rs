//! 课程目录一致性
//!
//! 课时的增删改会同步调整所属章节的时长以及课程的课时数、总时长。
//! 计数器一律用相对更新（`col = col + delta`），每个操作在一个事务内完成。

use std::collections::HashMap;

use super::SeaOrmStorage;
use crate::entity::{courses, lectures, sections};
use crate::errors::{CourseHubError, Result};
use crate::models::{
    courses::responses::CourseTotals,
    curriculum::{
        entities::{Lecture, Section},
        requests::{CreateLectureRequest, LecturePatch, LectureVideo},
        responses::SectionWithLectures,
    },
};
use crate::utils::validate::validate_required_text;
use sea_orm::sea_query::{Expr, ExprTrait};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};

fn validate_duration(duration: i64) -> Result<()> {
    if duration < 0 {
        return Err(CourseHubError::validation(
            "Duration in seconds cannot be negative",
        ));
    }
    Ok(())
}

/// 相对调整章节时长与课程统计
async fn shift_totals<C: ConnectionTrait>(
    conn: &C,
    section_id: i64,
    course_id: i64,
    lecture_delta: i64,
    duration_delta: i64,
) -> Result<()> {
    let now = chrono::Utc::now().timestamp();

    if duration_delta != 0 {
        sections::Entity::update_many()
            .col_expr(
                sections::Column::TotalDurationInSeconds,
                Expr::col(sections::Column::TotalDurationInSeconds).add(duration_delta),
            )
            .col_expr(sections::Column::UpdatedAt, Expr::value(now))
            .filter(sections::Column::Id.eq(section_id))
            .exec(conn)
            .await?;
    }

    if lecture_delta != 0 || duration_delta != 0 {
        courses::Entity::update_many()
            .col_expr(
                courses::Column::TotalLectures,
                Expr::col(courses::Column::TotalLectures).add(lecture_delta),
            )
            .col_expr(
                courses::Column::TotalDurationInSeconds,
                Expr::col(courses::Column::TotalDurationInSeconds).add(duration_delta),
            )
            .col_expr(courses::Column::UpdatedAt, Expr::value(now))
            .filter(courses::Column::Id.eq(course_id))
            .exec(conn)
            .await?;
    }

    Ok(())
}

async fn load_totals<C: ConnectionTrait>(conn: &C, course_id: i64) -> Result<CourseTotals> {
    let course = courses::Entity::find_by_id(course_id)
        .one(conn)
        .await?
        .ok_or_else(|| CourseHubError::not_found(format!("Course {course_id} not found")))?;
    Ok(CourseTotals {
        course_id,
        total_lectures: course.total_lectures,
        total_duration_in_seconds: course.total_duration_in_seconds,
    })
}

async fn find_section<C: ConnectionTrait>(conn: &C, id: i64) -> Result<sections::Model> {
    sections::Entity::find_by_id(id)
        .one(conn)
        .await?
        .ok_or_else(|| CourseHubError::not_found(format!("Section {id} not found")))
}

async fn find_lecture<C: ConnectionTrait>(conn: &C, id: i64) -> Result<lectures::Model> {
    lectures::Entity::find_by_id(id)
        .one(conn)
        .await?
        .ok_or_else(|| CourseHubError::not_found(format!("Lecture {id} not found")))
}

impl SeaOrmStorage {
    /// 课程目录：章节与课时均按 (position, id) 排序
    pub async fn get_curriculum_impl(&self, course_id: i64) -> Result<Vec<SectionWithLectures>> {
        let section_rows = sections::Entity::find()
            .filter(sections::Column::CourseId.eq(course_id))
            .order_by_asc(sections::Column::Position)
            .order_by_asc(sections::Column::Id)
            .all(&self.db)
            .await?;
        if section_rows.is_empty() {
            return Ok(Vec::new());
        }

        let section_ids: Vec<i64> = section_rows.iter().map(|s| s.id).collect();
        let lecture_rows = lectures::Entity::find()
            .filter(lectures::Column::SectionId.is_in(section_ids))
            .order_by_asc(lectures::Column::Position)
            .order_by_asc(lectures::Column::Id)
            .all(&self.db)
            .await?;

        let mut grouped: HashMap<i64, Vec<Lecture>> = HashMap::new();
        for lecture in lecture_rows {
            grouped
                .entry(lecture.section_id)
                .or_default()
                .push(lecture.into_lecture());
        }

        Ok(section_rows
            .into_iter()
            .map(|s| {
                let lectures = grouped.remove(&s.id).unwrap_or_default();
                SectionWithLectures {
                    section: s.into_section(),
                    lectures,
                }
            })
            .collect())
    }

    /// 新章节追加到课程末尾
    pub async fn create_section_impl(&self, course_id: i64, title: &str) -> Result<Section> {
        validate_required_text(title, "Section title")?;

        let txn = self.db.begin().await?;

        courses::Entity::find_by_id(course_id)
            .one(&txn)
            .await?
            .ok_or_else(|| CourseHubError::not_found(format!("Course {course_id} not found")))?;

        let last = sections::Entity::find()
            .filter(sections::Column::CourseId.eq(course_id))
            .order_by_desc(sections::Column::Position)
            .one(&txn)
            .await?;

        let now = chrono::Utc::now().timestamp();
        let created = sections::ActiveModel {
            course_id: Set(course_id),
            title: Set(title.trim().to_string()),
            position: Set(last.map_or(0, |s| s.position + 1)),
            total_duration_in_seconds: Set(0),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        txn.commit().await?;
        Ok(created.into_section())
    }

    pub async fn get_section_by_id_impl(&self, id: i64) -> Result<Option<Section>> {
        let result = sections::Entity::find_by_id(id).one(&self.db).await?;
        Ok(result.map(|m| m.into_section()))
    }

    pub async fn rename_section_impl(&self, id: i64, title: &str) -> Result<Section> {
        validate_required_text(title, "Section title")?;

        let existing = find_section(&self.db, id).await?;
        let mut model: sections::ActiveModel = existing.into();
        model.title = Set(title.trim().to_string());
        model.updated_at = Set(chrono::Utc::now().timestamp());
        Ok(model.update(&self.db).await?.into_section())
    }

    pub async fn list_section_lectures_impl(&self, section_id: i64) -> Result<Vec<Lecture>> {
        let rows = lectures::Entity::find()
            .filter(lectures::Column::SectionId.eq(section_id))
            .order_by_asc(lectures::Column::Position)
            .order_by_asc(lectures::Column::Id)
            .all(&self.db)
            .await?;
        Ok(rows.into_iter().map(|m| m.into_lecture()).collect())
    }

    /// 删除章节及其全部课时，课程统计扣除相应的课时数与时长
    pub async fn delete_section_impl(&self, id: i64) -> Result<CourseTotals> {
        let txn = self.db.begin().await?;

        let section = find_section(&txn, id).await?;
        let lecture_rows = lectures::Entity::find()
            .filter(lectures::Column::SectionId.eq(id))
            .all(&txn)
            .await?;
        let removed_lectures = lecture_rows.len() as i64;
        let removed_duration: i64 = lecture_rows.iter().map(|l| l.duration_in_seconds).sum();

        lectures::Entity::delete_many()
            .filter(lectures::Column::SectionId.eq(id))
            .exec(&txn)
            .await?;
        sections::Entity::delete_by_id(id).exec(&txn).await?;

        // 章节已删除，只需调整课程
        courses::Entity::update_many()
            .col_expr(
                courses::Column::TotalLectures,
                Expr::col(courses::Column::TotalLectures).sub(removed_lectures),
            )
            .col_expr(
                courses::Column::TotalDurationInSeconds,
                Expr::col(courses::Column::TotalDurationInSeconds).sub(removed_duration),
            )
            .col_expr(
                courses::Column::UpdatedAt,
                Expr::value(chrono::Utc::now().timestamp()),
            )
            .filter(courses::Column::Id.eq(section.course_id))
            .exec(&txn)
            .await?;

        let totals = load_totals(&txn, section.course_id).await?;
        txn.commit().await?;
        Ok(totals)
    }

    /// 新课时追加到章节末尾
    pub async fn create_lecture_impl(
        &self,
        section_id: i64,
        req: CreateLectureRequest,
    ) -> Result<Lecture> {
        validate_required_text(&req.title, "Lecture title")?;
        validate_duration(req.duration_in_seconds)?;

        let txn = self.db.begin().await?;

        let section = find_section(&txn, section_id).await?;
        let last = lectures::Entity::find()
            .filter(lectures::Column::SectionId.eq(section_id))
            .order_by_desc(lectures::Column::Position)
            .one(&txn)
            .await?;

        let now = chrono::Utc::now().timestamp();
        let created = lectures::ActiveModel {
            section_id: Set(section_id),
            title: Set(req.title.trim().to_string()),
            video_url: Set(None),
            video_public_id: Set(None),
            duration_in_seconds: Set(req.duration_in_seconds),
            is_preview: Set(req.is_preview),
            position: Set(last.map_or(0, |l| l.position + 1)),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        shift_totals(
            &txn,
            section_id,
            section.course_id,
            1,
            req.duration_in_seconds,
        )
        .await?;

        txn.commit().await?;
        Ok(created.into_lecture())
    }

    pub async fn get_lecture_by_id_impl(&self, id: i64) -> Result<Option<Lecture>> {
        let result = lectures::Entity::find_by_id(id).one(&self.db).await?;
        Ok(result.map(|m| m.into_lecture()))
    }

    /// 更新课时；时长变化按差值调整统计，新视频替换旧视频引用
    pub async fn update_lecture_impl(
        &self,
        id: i64,
        patch: LecturePatch,
        video: Option<LectureVideo>,
    ) -> Result<Lecture> {
        patch.validate()?;

        let txn = self.db.begin().await?;

        let existing = find_lecture(&txn, id).await?;
        let section = find_section(&txn, existing.section_id).await?;
        let delta = patch
            .duration_in_seconds
            .map_or(0, |d| d - existing.duration_in_seconds);

        let mut model: lectures::ActiveModel = existing.into();
        if let Some(title) = patch.title {
            model.title = Set(title.trim().to_string());
        }
        if let Some(duration) = patch.duration_in_seconds {
            model.duration_in_seconds = Set(duration);
        }
        if let Some(is_preview) = patch.is_preview {
            model.is_preview = Set(is_preview);
        }
        if let Some(video) = video {
            model.video_url = Set(Some(video.url));
            model.video_public_id = Set(Some(video.public_id));
        }
        model.updated_at = Set(chrono::Utc::now().timestamp());
        let updated = model.update(&txn).await?;

        shift_totals(&txn, section.id, section.course_id, 0, delta).await?;

        txn.commit().await?;
        Ok(updated.into_lecture())
    }

    /// 删除课时并扣除统计，返回被删除的课时（调用方据此清理视频）
    pub async fn delete_lecture_impl(&self, id: i64) -> Result<Lecture> {
        let txn = self.db.begin().await?;

        let existing = find_lecture(&txn, id).await?;
        let section = find_section(&txn, existing.section_id).await?;

        lectures::Entity::delete_by_id(id).exec(&txn).await?;
        shift_totals(
            &txn,
            section.id,
            section.course_id,
            -1,
            -existing.duration_in_seconds,
        )
        .await?;

        txn.commit().await?;
        Ok(existing.into_lecture())
    }

    /// 按课时行重新计算章节与课程统计
    pub async fn recompute_course_totals_impl(&self, course_id: i64) -> Result<CourseTotals> {
        let txn = self.db.begin().await?;

        courses::Entity::find_by_id(course_id)
            .one(&txn)
            .await?
            .ok_or_else(|| CourseHubError::not_found(format!("Course {course_id} not found")))?;

        let section_rows = sections::Entity::find()
            .filter(sections::Column::CourseId.eq(course_id))
            .all(&txn)
            .await?;
        let section_ids: Vec<i64> = section_rows.iter().map(|s| s.id).collect();
        let lecture_rows = if section_ids.is_empty() {
            Vec::new()
        } else {
            lectures::Entity::find()
                .filter(lectures::Column::SectionId.is_in(section_ids))
                .all(&txn)
                .await?
        };

        let mut per_section: HashMap<i64, i64> = HashMap::new();
        for lecture in &lecture_rows {
            *per_section.entry(lecture.section_id).or_default() += lecture.duration_in_seconds;
        }

        let now = chrono::Utc::now().timestamp();
        for section in section_rows {
            let total = per_section.get(&section.id).copied().unwrap_or(0);
            if section.total_duration_in_seconds != total {
                let mut model: sections::ActiveModel = section.into();
                model.total_duration_in_seconds = Set(total);
                model.updated_at = Set(now);
                model.update(&txn).await?;
            }
        }

        let totals = CourseTotals {
            course_id,
            total_lectures: lecture_rows.len() as i64,
            total_duration_in_seconds: per_section.values().sum(),
        };
        courses::Entity::update_many()
            .col_expr(
                courses::Column::TotalLectures,
                Expr::value(totals.total_lectures),
            )
            .col_expr(
                courses::Column::TotalDurationInSeconds,
                Expr::value(totals.total_duration_in_seconds),
            )
            .col_expr(courses::Column::UpdatedAt, Expr::value(now))
            .filter(courses::Column::Id.eq(course_id))
            .exec(&txn)
            .await?;

        txn.commit().await?;
        Ok(totals)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::users::entities::UserRole;
    use crate::storage::Storage;
    use crate::storage::sea_orm_storage::fixtures;

    async fn stored_totals(storage: &SeaOrmStorage, course_id: i64) -> CourseTotals {
        let course = storage.get_course_by_id(course_id).await.unwrap().unwrap();
        CourseTotals {
            course_id,
            total_lectures: course.total_lectures,
            total_duration_in_seconds: course.total_duration_in_seconds,
        }
    }

    #[tokio::test]
    async fn test_totals_follow_lecture_lifecycle() {
        let storage = SeaOrmStorage::new_in_memory().await;
        let instructor = fixtures::user(&storage, "t@example.com", UserRole::Instructor).await;
        let course = fixtures::draft_course(&storage, &instructor, "Rust", "Development").await;
        let s1 = fixtures::section(&storage, course.id, "Basics").await;
        let s2 = fixtures::section(&storage, course.id, "Advanced").await;

        let l1 = fixtures::lecture(&storage, s1.id, "Ownership", 300).await;
        let l2 = fixtures::lecture(&storage, s1.id, "Borrowing", 200).await;
        fixtures::lecture(&storage, s2.id, "Lifetimes", 500).await;

        let totals = stored_totals(&storage, course.id).await;
        assert_eq!(totals.total_lectures, 3);
        assert_eq!(totals.total_duration_in_seconds, 1000);

        storage
            .update_lecture(
                l1.id,
                LecturePatch {
                    duration_in_seconds: Some(120),
                    ..Default::default()
                },
                None,
            )
            .await
            .unwrap();
        storage.delete_lecture(l2.id).await.unwrap();

        let totals = stored_totals(&storage, course.id).await;
        assert_eq!(totals.total_lectures, 2);
        assert_eq!(totals.total_duration_in_seconds, 620);
        assert_eq!(
            storage.recompute_course_totals(course.id).await.unwrap(),
            totals
        );

        let s1_after = storage.get_section_by_id(s1.id).await.unwrap().unwrap();
        assert_eq!(s1_after.total_duration_in_seconds, 120);
    }

    #[tokio::test]
    async fn test_delete_section_decrements_course_totals() {
        let storage = SeaOrmStorage::new_in_memory().await;
        let instructor = fixtures::user(&storage, "t@example.com", UserRole::Instructor).await;
        let course = fixtures::draft_course(&storage, &instructor, "Rust", "Development").await;
        let keep = fixtures::section(&storage, course.id, "Keep").await;
        let drop = fixtures::section(&storage, course.id, "Drop").await;
        fixtures::lecture(&storage, keep.id, "A", 100).await;
        fixtures::lecture(&storage, drop.id, "B", 40).await;
        fixtures::lecture(&storage, drop.id, "C", 60).await;

        let totals = storage.delete_section(drop.id).await.unwrap();
        assert_eq!(totals.total_lectures, 1);
        assert_eq!(totals.total_duration_in_seconds, 100);
        assert_eq!(
            storage.recompute_course_totals(course.id).await.unwrap(),
            totals
        );
        assert!(storage.get_section_by_id(drop.id).await.unwrap().is_none());
        assert!(
            storage
                .list_section_lectures(drop.id)
                .await
                .unwrap()
                .is_empty()
        );
    }

    #[tokio::test]
    async fn test_recompute_repairs_drifted_counters() {
        let storage = SeaOrmStorage::new_in_memory().await;
        let instructor = fixtures::user(&storage, "t@example.com", UserRole::Instructor).await;
        let course = fixtures::draft_course(&storage, &instructor, "Rust", "Development").await;
        let section = fixtures::section(&storage, course.id, "Basics").await;
        fixtures::lecture(&storage, section.id, "A", 30).await;

        // 人为制造漂移
        courses::Entity::update_many()
            .col_expr(courses::Column::TotalLectures, Expr::value(9))
            .col_expr(courses::Column::TotalDurationInSeconds, Expr::value(9999))
            .filter(courses::Column::Id.eq(course.id))
            .exec(&storage.db)
            .await
            .unwrap();

        let repaired = storage.recompute_course_totals(course.id).await.unwrap();
        assert_eq!(repaired.total_lectures, 1);
        assert_eq!(repaired.total_duration_in_seconds, 30);
        assert_eq!(stored_totals(&storage, course.id).await, repaired);
    }

    #[tokio::test]
    async fn test_curriculum_order_and_validation() {
        let storage = SeaOrmStorage::new_in_memory().await;
        let instructor = fixtures::user(&storage, "t@example.com", UserRole::Instructor).await;
        let course = fixtures::draft_course(&storage, &instructor, "Rust", "Development").await;

        assert!(matches!(
            storage.create_section(course.id, "  ").await.unwrap_err(),
            CourseHubError::Validation(_)
        ));
        assert!(matches!(
            storage.create_section(9999, "Ghost").await.unwrap_err(),
            CourseHubError::NotFound(_)
        ));

        let first = fixtures::section(&storage, course.id, "First").await;
        let second = fixtures::section(&storage, course.id, "Second").await;
        assert!(second.position > first.position);

        let err = storage
            .create_lecture(
                first.id,
                CreateLectureRequest {
                    title: "Negative".into(),
                    duration_in_seconds: -5,
                    is_preview: false,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, CourseHubError::Validation(_)));

        fixtures::lecture(&storage, first.id, "One", 10).await;
        fixtures::lecture(&storage, first.id, "Two", 10).await;

        let curriculum = storage.get_curriculum(course.id).await.unwrap();
        let titles: Vec<_> = curriculum
            .iter()
            .map(|s| s.section.title.as_str())
            .collect();
        assert_eq!(titles, vec!["First", "Second"]);
        let lecture_titles: Vec<_> = curriculum[0]
            .lectures
            .iter()
            .map(|l| l.title.as_str())
            .collect();
        assert_eq!(lecture_titles, vec!["One", "Two"]);
        assert!(curriculum[1].lectures.is_empty());
    }

    #[tokio::test]
    async fn test_update_lecture_attaches_video() {
        let storage = SeaOrmStorage::new_in_memory().await;
        let instructor = fixtures::user(&storage, "t@example.com", UserRole::Instructor).await;
        let course = fixtures::draft_course(&storage, &instructor, "Rust", "Development").await;
        let section = fixtures::section(&storage, course.id, "Basics").await;
        let lecture = fixtures::lecture(&storage, section.id, "A", 30).await;

        let updated = storage
            .update_lecture(
                lecture.id,
                LecturePatch {
                    is_preview: Some(true),
                    ..Default::default()
                },
                Some(LectureVideo {
                    url: "http://localhost/media/videos/a.mp4".into(),
                    public_id: "videos/a.mp4".into(),
                }),
            )
            .await
            .unwrap();
        assert!(updated.is_preview);
        assert_eq!(updated.video_public_id.as_deref(), Some("videos/a.mp4"));
        assert_eq!(updated.duration_in_seconds, 30);

        assert!(matches!(
            storage
                .update_lecture(424242, LecturePatch::default(), None)
                .await
                .unwrap_err(),
            CourseHubError::NotFound(_)
        ));
    }
}
