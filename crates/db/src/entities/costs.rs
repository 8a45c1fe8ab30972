//! `SeaORM` Entity for costs table.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "costs")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub trip_id: Uuid,
    pub category_id: Uuid,
    pub created_by: Uuid,
    pub name: String,
    pub amount: String,
    pub currency: String,
    pub cost_date: Date,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::trips::Entity",
        from = "Column::TripId",
        to = "super::trips::Column::Id"
    )]
    Trips,
    #[sea_orm(
        belongs_to = "super::cost_categories::Entity",
        from = "Column::CategoryId",
        to = "super::cost_categories::Column::Id"
    )]
    CostCategories,
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::CreatedBy",
        to = "super::users::Column::Id"
    )]
    Users,
}

impl Related<super::trips::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Trips.def()
    }
}

impl Related<super::cost_categories::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CostCategories.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
