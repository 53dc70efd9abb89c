//! Coupon database entity.

use sea_orm::entity::prelude::*;

use crate::domain::Coupon;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "coupons")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    #[sea_orm(unique)]
    pub code: String,
    pub title: String,
    pub percent: i32,
    pub description: Option<String>,
    pub min_order: i64,
    pub start_time: DateTimeUtc,
    pub exp_time: DateTimeUtc,
    pub status: i16,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::user_coupon::Entity")]
    UserCoupon,
}

impl Related<super::user_coupon::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::UserCoupon.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for Coupon {
    fn from(model: Model) -> Self {
        Coupon {
            id: model.id,
            code: model.code,
            title: model.title,
            percent: model.percent,
            description: model.description,
            min_order: model.min_order,
            start_time: model.start_time,
            exp_time: model.exp_time,
            status: model.status,
        }
    }
}
