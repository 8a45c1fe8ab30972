//! `SeaORM` Entity for users table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub username: String,
    #[sea_orm(unique)]
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub is_active: bool,
    pub activated_at: Option<DateTimeWithTimeZone>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::activation_tokens::Entity")]
    ActivationTokens,
    #[sea_orm(has_many = "super::trip_participants::Entity")]
    TripParticipants,
}

impl Related<super::activation_tokens::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ActivationTokens.def()
    }
}

impl Related<super::trip_participants::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TripParticipants.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
