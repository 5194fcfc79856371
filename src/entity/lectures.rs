//! 课时实体

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "lectures")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub section_id: i64,
    pub title: String,
    pub video_url: Option<String>,
    pub video_public_id: Option<String>,
    pub duration_in_seconds: i64,
    pub is_preview: bool,
    pub position: i32,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::sections::Entity",
        from = "Column::SectionId",
        to = "super::sections::Column::Id"
    )]
    Section,
}

impl Related<super::sections::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Section.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn into_lecture(self) -> crate::models::curriculum::entities::Lecture {
        crate::models::curriculum::entities::Lecture {
            id: self.id,
            section_id: self.section_id,
            title: self.title,
            video_url: self.video_url,
            video_public_id: self.video_public_id,
            duration_in_seconds: self.duration_in_seconds,
            is_preview: self.is_preview,
            position: self.position,
            created_at: super::to_datetime(self.created_at),
            updated_at: super::to_datetime(self.updated_at),
        }
    }
}
