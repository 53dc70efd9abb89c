//! User database entity.

use sea_orm::entity::prelude::*;

use crate::domain::{User, UserRole};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    #[sea_orm(unique)]
    pub email: String,
    pub password_hash: Option<String>,
    pub full_name: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub role: String,
    pub email_active: bool,
    pub verified_at: Option<DateTimeUtc>,
    /// Set when an administrator locks the account (NULL = active)
    pub disabled_at: Option<DateTimeUtc>,
    /// Single active session/verification token
    pub session_token: Option<String>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::otp::Entity")]
    Otp,
}

impl Related<super::otp::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Otp.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for User {
    fn from(model: Model) -> Self {
        User {
            id: model.id,
            email: model.email,
            password_hash: model.password_hash,
            full_name: model.full_name,
            phone: model.phone,
            address: model.address,
            role: UserRole::parse(&model.role),
            email_active: model.email_active,
            verified_at: model.verified_at,
            disabled_at: model.disabled_at,
            session_token: model.session_token,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}
