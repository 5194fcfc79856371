//! 课程购买记录实体

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "course_purchases")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    #[sea_orm(unique)]
    pub transaction_uuid: String,
    pub course_id: i64,
    pub user_id: i64,
    #[sea_orm(column_type = "Double")]
    pub amount: f64,
    pub status: String,
    pub payment_id: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::courses::Entity",
        from = "Column::CourseId",
        to = "super::courses::Column::Id"
    )]
    Course,
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id"
    )]
    User,
}

impl Related<super::courses::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Course.def()
    }
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn into_purchase(self) -> crate::models::purchases::entities::CoursePurchase {
        use crate::models::purchases::entities::{CoursePurchase, PurchaseStatus};

        CoursePurchase {
            id: self.id,
            transaction_uuid: self.transaction_uuid,
            course_id: self.course_id,
            user_id: self.user_id,
            amount: self.amount,
            status: self
                .status
                .parse::<PurchaseStatus>()
                .unwrap_or(PurchaseStatus::Pending),
            payment_id: self.payment_id,
            created_at: super::to_datetime(self.created_at),
            updated_at: super::to_datetime(self.updated_at),
        }
    }
}
