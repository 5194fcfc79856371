//! 测试数据构造

use super::SeaOrmStorage;
use crate::models::{
    courses::{
        entities::{Course, CourseLevel, CoursePrice},
        requests::CreateCourseRequest,
    },
    curriculum::{
        entities::{Lecture, Section},
        requests::CreateLectureRequest,
    },
    users::{
        entities::{User, UserRole},
        requests::NewUser,
    },
};
use crate::storage::Storage;

pub(crate) async fn user(storage: &SeaOrmStorage, email: &str, role: UserRole) -> User {
    let name = email.split('@').next().unwrap_or("user").to_string();
    storage
        .create_user(NewUser {
            name,
            email: email.to_string(),
            password_hash: None,
            role,
        })
        .await
        .expect("create user")
}

pub(crate) fn course_request(title: &str, category: &str, price: f64) -> CreateCourseRequest {
    CreateCourseRequest {
        title: title.to_string(),
        subtitle: format!("{title} subtitle"),
        description: String::new(),
        language: "English".to_string(),
        category: category.to_string(),
        level: CourseLevel::AllLevels,
        price: CoursePrice {
            original: price,
            current: price,
        },
        thumbnail_url: None,
        learnings: vec![],
        requirements: vec![],
        includes: vec![],
    }
}

pub(crate) async fn draft_course(
    storage: &SeaOrmStorage,
    creator: &User,
    title: &str,
    category: &str,
) -> Course {
    storage
        .create_course(creator.id, course_request(title, category, 100.0))
        .await
        .expect("create course")
}

pub(crate) async fn section(storage: &SeaOrmStorage, course_id: i64, title: &str) -> Section {
    storage
        .create_section(course_id, title)
        .await
        .expect("create section")
}

pub(crate) async fn lecture(
    storage: &SeaOrmStorage,
    section_id: i64,
    title: &str,
    duration: i64,
) -> Lecture {
    storage
        .create_lecture(
            section_id,
            CreateLectureRequest {
                title: title.to_string(),
                duration_in_seconds: duration,
                is_preview: false,
            },
        )
        .await
        .expect("create lecture")
}

/// 带一个章节和一个课时的已发布课程
pub(crate) async fn published_course(
    storage: &SeaOrmStorage,
    creator: &User,
    title: &str,
    category: &str,
) -> Course {
    let course = draft_course(storage, creator, title, category).await;
    let s = section(storage, course.id, "Intro").await;
    lecture(storage, s.id, "Welcome", 60).await;
    storage
        .set_course_published(course.id, true)
        .await
        .expect("publish course")
}

/// 通过完整的购买流程选课
pub(crate) async fn enroll(storage: &SeaOrmStorage, user: &User, course: &Course) {
    let purchase = storage
        .create_pending_purchase(user.id, course.id)
        .await
        .expect("pending purchase");
    storage
        .complete_purchase(
            &purchase.transaction_uuid,
            &format!("TXN-{}", purchase.id),
            Some(purchase.amount),
        )
        .await
        .expect("complete purchase");
}
