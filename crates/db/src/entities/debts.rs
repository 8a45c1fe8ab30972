//! `SeaORM` Entity for debts table.
//!
//! One row per unordered user pair and trip. `creditor_id` is always the
//! lower id of the pair; a positive `amount` means the debtor owes the
//! creditor. Settled pairs keep a `"0.00"` row.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "debts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub trip_id: Uuid,
    pub creditor_id: Uuid,
    pub debtor_id: Uuid,
    pub amount: String,
    pub currency: String,
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
        belongs_to = "super::users::Entity",
        from = "Column::CreditorId",
        to = "super::users::Column::Id"
    )]
    Creditor,
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::DebtorId",
        to = "super::users::Column::Id"
    )]
    Debtor,
}

impl Related<super::trips::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Trips.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
