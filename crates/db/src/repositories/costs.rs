//! Cost repository.

use chrono::{NaiveDate, Utc};
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use splittrip_shared::Money;
use uuid::Uuid;

use crate::entities::costs;
use crate::error::{StoreError, StoreResult};
use crate::store::ensure_affected;

/// Input for a new cost.
#[derive(Debug, Clone)]
pub struct NewCost {
    /// Owning trip.
    pub trip_id: Uuid,
    /// Category within the trip.
    pub category_id: Uuid,
    /// Recording user.
    pub created_by: Uuid,
    /// Label.
    pub name: String,
    /// Positive amount in the trip currency.
    pub amount: Money,
    /// Day the cost occurred.
    pub cost_date: NaiveDate,
}

/// Cost repository.
#[derive(Debug, Clone)]
pub struct CostRepository {
    db: DatabaseConnection,
}

impl CostRepository {
    /// Creates a new cost repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Finds a cost of `trip_id`.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the cost does not exist in that trip.
    pub async fn find(&self, trip_id: Uuid, id: Uuid) -> StoreResult<costs::Model> {
        costs::Entity::find_by_id(id)
            .filter(costs::Column::TripId.eq(trip_id))
            .one(&self.db)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("cost {id}")))
    }

    /// Lists the costs of a trip, most recent first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_for_trip(&self, trip_id: Uuid) -> StoreResult<Vec<costs::Model>> {
        Ok(costs::Entity::find()
            .filter(costs::Column::TripId.eq(trip_id))
            .order_by_desc(costs::Column::CostDate)
            .order_by_asc(costs::Column::Name)
            .all(&self.db)
            .await?)
    }

    /// Inserts a cost.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::ForeignKeyMissing` if the category is gone.
    pub async fn insert(&self, new: NewCost) -> StoreResult<costs::Model> {
        let now: DateTimeWithTimeZone = Utc::now().into();
        let cost = costs::ActiveModel {
            id: Set(Uuid::new_v4()),
            trip_id: Set(new.trip_id),
            category_id: Set(new.category_id),
            created_by: Set(new.created_by),
            name: Set(new.name),
            amount: Set(new.amount.amount_string()),
            currency: Set(new.amount.currency().as_str().to_string()),
            cost_date: Set(new.cost_date),
            created_at: Set(now),
            updated_at: Set(now),
        };
        Ok(cost.insert(&self.db).await?)
    }

    /// Deletes a cost.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if there is no such cost.
    pub async fn delete(&self, id: Uuid) -> StoreResult<()> {
        let result = costs::Entity::delete_by_id(id).exec(&self.db).await?;
        ensure_affected(result.rows_affected, "cost")?;
        Ok(())
    }
}
