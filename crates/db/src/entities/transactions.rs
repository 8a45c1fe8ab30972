//! `SeaORM` Entity for transactions table.
//!
//! Rows are soft-deleted: a set `deleted_at` hides the row from every read.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "transactions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub trip_id: Uuid,
    pub creditor_id: Uuid,
    pub debtor_id: Uuid,
    pub amount: String,
    pub currency: String,
    pub description: Option<String>,
    pub occurred_at: DateTimeWithTimeZone,
    pub is_confirmed: bool,
    pub confirmed_at: Option<DateTimeWithTimeZone>,
    pub deleted_at: Option<DateTimeWithTimeZone>,
    pub deleted_by: Option<Uuid>,
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
