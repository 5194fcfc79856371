//! 课程实体

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "courses")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub creator_id: i64,
    pub title: String,
    pub subtitle: String,
    #[sea_orm(column_type = "Text")]
    pub description: String,
    pub language: String,
    pub category: String,
    pub level: String,
    #[sea_orm(column_type = "Double")]
    pub price_original: f64,
    #[sea_orm(column_type = "Double")]
    pub price_current: f64,
    pub thumbnail_url: Option<String>,
    pub is_bestseller: bool,
    pub total_lectures: i64,
    pub total_duration_in_seconds: i64,
    #[sea_orm(column_type = "Text")]
    pub learnings: String,
    #[sea_orm(column_type = "Text")]
    pub requirements: String,
    #[sea_orm(column_type = "Text")]
    pub includes: String,
    pub is_published: bool,
    #[sea_orm(column_type = "Double")]
    pub ratings: f64,
    pub num_of_reviews: i64,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::CreatorId",
        to = "super::users::Column::Id"
    )]
    Creator,
    #[sea_orm(has_many = "super::sections::Entity")]
    Sections,
    #[sea_orm(has_many = "super::enrollments::Entity")]
    Enrollments,
    #[sea_orm(has_many = "super::reviews::Entity")]
    Reviews,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Creator.def()
    }
}

impl Related<super::sections::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Sections.def()
    }
}

impl Related<super::enrollments::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Enrollments.def()
    }
}

impl Related<super::reviews::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Reviews.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

// 从数据库模型转换为业务模型
impl Model {
    pub fn into_course(self) -> crate::models::courses::entities::Course {
        use crate::models::courses::entities::{Course, CourseLevel, CoursePrice};

        Course {
            id: self.id,
            creator_id: self.creator_id,
            title: self.title,
            subtitle: self.subtitle,
            description: self.description,
            language: self.language,
            category: self.category,
            level: self
                .level
                .parse::<CourseLevel>()
                .unwrap_or(CourseLevel::AllLevels),
            price: CoursePrice {
                original: self.price_original,
                current: self.price_current,
            },
            thumbnail_url: self.thumbnail_url,
            is_bestseller: self.is_bestseller,
            total_lectures: self.total_lectures,
            total_duration_in_seconds: self.total_duration_in_seconds,
            learnings: super::from_json_text(&self.learnings),
            requirements: super::from_json_text(&self.requirements),
            includes: super::from_json_text(&self.includes),
            is_published: self.is_published,
            ratings: self.ratings,
            num_of_reviews: self.num_of_reviews,
            created_at: super::to_datetime(self.created_at),
            updated_at: super::to_datetime(self.updated_at),
        }
    }
}
