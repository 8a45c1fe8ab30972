//! Transaction repository.
//!
//! Soft-deleted rows are filtered out of every read here, so nothing above
//! this layer ever sees them.

use chrono::Utc;
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set,
};
use splittrip_shared::Money;
use uuid::Uuid;

use crate::entities::transactions;
use crate::error::{StoreError, StoreResult};

/// Input for a new transaction.
#[derive(Debug, Clone)]
pub struct NewTransaction {
    /// Owning trip.
    pub trip_id: Uuid,
    /// User who is owed.
    pub creditor_id: Uuid,
    /// User who owes.
    pub debtor_id: Uuid,
    /// Positive amount.
    pub amount: Money,
    /// Free text.
    pub description: Option<String>,
    /// When the money changed hands.
    pub occurred_at: DateTimeWithTimeZone,
}

/// Transaction repository.
#[derive(Debug, Clone)]
pub struct TransactionRepository {
    db: DatabaseConnection,
}

impl TransactionRepository {
    /// Creates a new transaction repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Finds a transaction that has not been deleted.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` for unknown or deleted transactions.
    pub async fn find_active(&self, id: Uuid) -> StoreResult<transactions::Model> {
        transactions::Entity::find_by_id(id)
            .filter(transactions::Column::DeletedAt.is_null())
            .one(&self.db)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("transaction {id}")))
    }

    /// Lists the live transactions of a trip, most recent first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_active_for_trip(
        &self,
        trip_id: Uuid,
    ) -> StoreResult<Vec<transactions::Model>> {
        Ok(transactions::Entity::find()
            .filter(transactions::Column::TripId.eq(trip_id))
            .filter(transactions::Column::DeletedAt.is_null())
            .order_by_desc(transactions::Column::OccurredAt)
            .order_by_asc(transactions::Column::Id)
            .all(&self.db)
            .await?)
    }

    /// Inserts an unconfirmed transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub async fn insert<C: ConnectionTrait>(
        &self,
        conn: &C,
        new: NewTransaction,
    ) -> StoreResult<transactions::Model> {
        let now: DateTimeWithTimeZone = Utc::now().into();
        let transaction = transactions::ActiveModel {
            id: Set(Uuid::new_v4()),
            trip_id: Set(new.trip_id),
            creditor_id: Set(new.creditor_id),
            debtor_id: Set(new.debtor_id),
            amount: Set(new.amount.amount_string()),
            currency: Set(new.amount.currency().as_str().to_string()),
            description: Set(new.description),
            occurred_at: Set(new.occurred_at),
            is_confirmed: Set(false),
            confirmed_at: Set(None),
            deleted_at: Set(None),
            deleted_by: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        };
        Ok(transaction.insert(conn).await?)
    }

    /// Confirms a live, unconfirmed transaction. Returns the number of rows
    /// changed; zero means another request got there first.
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails.
    pub async fn mark_confirmed(&self, id: Uuid) -> StoreResult<u64> {
        let now: DateTimeWithTimeZone = Utc::now().into();
        let result = transactions::Entity::update_many()
            .col_expr(transactions::Column::IsConfirmed, Expr::value(true))
            .col_expr(transactions::Column::ConfirmedAt, Expr::value(now))
            .col_expr(transactions::Column::UpdatedAt, Expr::value(now))
            .filter(transactions::Column::Id.eq(id))
            .filter(transactions::Column::IsConfirmed.eq(false))
            .filter(transactions::Column::DeletedAt.is_null())
            .exec(&self.db)
            .await?;
        Ok(result.rows_affected)
    }

    /// Soft-deletes a live transaction. Returns the number of rows changed;
    /// zero means it was already deleted.
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails.
    pub async fn mark_deleted<C: ConnectionTrait>(
        &self,
        conn: &C,
        id: Uuid,
        deleted_by: Uuid,
    ) -> StoreResult<u64> {
        let now: DateTimeWithTimeZone = Utc::now().into();
        let result = transactions::Entity::update_many()
            .col_expr(transactions::Column::DeletedAt, Expr::value(now))
            .col_expr(transactions::Column::DeletedBy, Expr::value(deleted_by))
            .col_expr(transactions::Column::UpdatedAt, Expr::value(now))
            .filter(transactions::Column::Id.eq(id))
            .filter(transactions::Column::DeletedAt.is_null())
            .exec(conn)
            .await?;
        Ok(result.rows_affected)
    }
}
