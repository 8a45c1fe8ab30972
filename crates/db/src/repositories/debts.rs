//! Debt row repository.
//!
//! Rows are keyed by (`trip_id`, `creditor_id`, `debtor_id`) in canonical
//! orientation; callers canonicalise before they get here.

use chrono::Utc;
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{
    ColumnTrait, Condition, DatabaseConnection, DatabaseTransaction, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use splittrip_shared::{Currency, Money};
use uuid::Uuid;

use crate::entities::debts;
use crate::error::{StoreError, StoreResult};
use crate::store::ensure_affected;

/// Debt row repository.
#[derive(Debug, Clone)]
pub struct DebtRepository {
    db: DatabaseConnection,
}

impl DebtRepository {
    /// Creates a new debt repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Inserts a zero row for the pair unless one exists.
    /// Returns the number of rows inserted.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::ForeignKeyMissing` if trip or users do not exist.
    pub async fn ensure_pair(
        &self,
        txn: &DatabaseTransaction,
        trip_id: Uuid,
        creditor_id: Uuid,
        debtor_id: Uuid,
        currency: Currency,
    ) -> StoreResult<u64> {
        let now: DateTimeWithTimeZone = Utc::now().into();
        let row = debts::ActiveModel {
            id: Set(Uuid::new_v4()),
            trip_id: Set(trip_id),
            creditor_id: Set(creditor_id),
            debtor_id: Set(debtor_id),
            amount: Set(Money::zero(currency).amount_string()),
            currency: Set(currency.as_str().to_string()),
            created_at: Set(now),
            updated_at: Set(now),
        };
        let inserted = debts::Entity::insert(row)
            .on_conflict(
                OnConflict::columns([
                    debts::Column::TripId,
                    debts::Column::CreditorId,
                    debts::Column::DebtorId,
                ])
                .do_nothing()
                .to_owned(),
            )
            .exec_without_returning(txn)
            .await?;
        Ok(inserted)
    }

    /// Reads the pair row and locks it until `txn` ends.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the row does not exist.
    pub async fn lock_pair(
        &self,
        txn: &DatabaseTransaction,
        trip_id: Uuid,
        creditor_id: Uuid,
        debtor_id: Uuid,
    ) -> StoreResult<debts::Model> {
        debts::Entity::find()
            .filter(debts::Column::TripId.eq(trip_id))
            .filter(debts::Column::CreditorId.eq(creditor_id))
            .filter(debts::Column::DebtorId.eq(debtor_id))
            .lock_exclusive()
            .one(txn)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("debt {creditor_id}/{debtor_id}")))
    }

    /// Overwrites the stored balance of a row.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the row is gone.
    pub async fn set_amount(
        &self,
        txn: &DatabaseTransaction,
        id: Uuid,
        amount: Money,
    ) -> StoreResult<()> {
        let now: DateTimeWithTimeZone = Utc::now().into();
        let result = debts::Entity::update_many()
            .col_expr(debts::Column::Amount, Expr::value(amount.amount_string()))
            .col_expr(debts::Column::UpdatedAt, Expr::value(now))
            .filter(debts::Column::Id.eq(id))
            .exec(txn)
            .await?;
        ensure_affected(result.rows_affected, "debt")?;
        Ok(())
    }

    /// Finds the row of a canonical pair.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_pair(
        &self,
        trip_id: Uuid,
        creditor_id: Uuid,
        debtor_id: Uuid,
    ) -> StoreResult<Option<debts::Model>> {
        Ok(debts::Entity::find()
            .filter(debts::Column::TripId.eq(trip_id))
            .filter(debts::Column::CreditorId.eq(creditor_id))
            .filter(debts::Column::DebtorId.eq(debtor_id))
            .one(&self.db)
            .await?)
    }

    /// Lists every row of a trip.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_for_trip(&self, trip_id: Uuid) -> StoreResult<Vec<debts::Model>> {
        Ok(debts::Entity::find()
            .filter(debts::Column::TripId.eq(trip_id))
            .order_by_asc(debts::Column::CreditorId)
            .order_by_asc(debts::Column::DebtorId)
            .all(&self.db)
            .await?)
    }

    /// Lists the rows of a trip that involve `user_id` on either side.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_for_user(
        &self,
        trip_id: Uuid,
        user_id: Uuid,
    ) -> StoreResult<Vec<debts::Model>> {
        Ok(debts::Entity::find()
            .filter(debts::Column::TripId.eq(trip_id))
            .filter(
                Condition::any()
                    .add(debts::Column::CreditorId.eq(user_id))
                    .add(debts::Column::DebtorId.eq(user_id)),
            )
            .all(&self.db)
            .await?)
    }
}
