//! `SeaORM` Entity for trips table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "trips")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    pub location: String,
    pub description: Option<String>,
    pub start_date: Date,
    pub end_date: Date,
    /// Fixed at creation.
    pub currency: String,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::trip_participants::Entity")]
    TripParticipants,
    #[sea_orm(has_many = "super::cost_categories::Entity")]
    CostCategories,
    #[sea_orm(has_many = "super::costs::Entity")]
    Costs,
    #[sea_orm(has_many = "super::transactions::Entity")]
    Transactions,
    #[sea_orm(has_many = "super::debts::Entity")]
    Debts,
}

impl Related<super::trip_participants::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TripParticipants.def()
    }
}

impl Related<super::cost_categories::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CostCategories.def()
    }
}

impl Related<super::costs::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Costs.def()
    }
}

impl Related<super::transactions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Transactions.def()
    }
}

impl Related<super::debts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Debts.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
