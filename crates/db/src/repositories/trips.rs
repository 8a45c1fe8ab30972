//! Trip repository.

use chrono::{NaiveDate, Utc};
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set,
};
use splittrip_core::trip::{DateRange, TripFields};
use splittrip_shared::Currency;
use uuid::Uuid;

use crate::entities::{trip_participants, trips};
use crate::error::{StoreError, StoreResult, translate_delete};
use crate::store::ensure_affected;

/// Input for a new trip.
#[derive(Debug, Clone)]
pub struct NewTrip {
    /// Validated fields.
    pub fields: TripFields,
    /// Fixed trip currency.
    pub currency: Currency,
}

/// Trip repository.
#[derive(Debug, Clone)]
pub struct TripRepository {
    db: DatabaseConnection,
}

impl TripRepository {
    /// Creates a new trip repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Finds a trip by ID.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if there is no such trip.
    pub async fn find_by_id(&self, id: Uuid) -> StoreResult<trips::Model> {
        trips::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("trip {id}")))
    }

    /// Lists every trip `user_id` participates in, invited or accepted,
    /// ordered by start date.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_for_user(&self, user_id: Uuid) -> StoreResult<Vec<trips::Model>> {
        Ok(trips::Entity::find()
            .inner_join(trip_participants::Entity)
            .filter(trip_participants::Column::UserId.eq(user_id))
            .order_by_asc(trips::Column::StartDate)
            .order_by_asc(trips::Column::Name)
            .all(&self.db)
            .await?)
    }

    /// Inserts a trip.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub async fn insert<C: ConnectionTrait>(
        &self,
        conn: &C,
        new: NewTrip,
    ) -> StoreResult<trips::Model> {
        let now: DateTimeWithTimeZone = Utc::now().into();
        let trip = trips::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(new.fields.name),
            location: Set(new.fields.location),
            description: Set(new.fields.description),
            start_date: Set(new.fields.dates.start()),
            end_date: Set(new.fields.dates.end()),
            currency: Set(new.currency.as_str().to_string()),
            created_at: Set(now),
            updated_at: Set(now),
        };
        Ok(trip.insert(conn).await?)
    }

    /// Overwrites the editable fields of `current`.
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails.
    pub async fn update<C: ConnectionTrait>(
        &self,
        conn: &C,
        current: trips::Model,
        fields: TripFields,
    ) -> StoreResult<trips::Model> {
        let mut trip: trips::ActiveModel = current.into();
        trip.name = Set(fields.name);
        trip.location = Set(fields.location);
        trip.description = Set(fields.description);
        trip.start_date = Set(fields.dates.start());
        trip.end_date = Set(fields.dates.end());
        trip.updated_at = Set(Utc::now().into());
        Ok(trip.update(conn).await?)
    }

    /// Deletes a trip; participants, categories, costs, transactions and
    /// debts go with it.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if there is no such trip.
    pub async fn delete(&self, id: Uuid) -> StoreResult<()> {
        let result = trips::Entity::delete_by_id(id)
            .exec(&self.db)
            .await
            .map_err(translate_delete)?;
        ensure_affected(result.rows_affected, "trip")?;
        Ok(())
    }
}

/// Rebuilds the editable fields of a stored trip.
///
/// # Errors
///
/// Returns `StoreError::Internal` if the stored dates are reversed.
pub fn stored_fields(trip: &trips::Model) -> StoreResult<TripFields> {
    Ok(TripFields {
        name: trip.name.clone(),
        location: trip.location.clone(),
        description: trip.description.clone(),
        dates: stored_dates(trip.start_date, trip.end_date)?,
    })
}

/// Rebuilds a stored date range.
///
/// # Errors
///
/// Returns `StoreError::Internal` if the stored dates are reversed.
pub fn stored_dates(start: NaiveDate, end: NaiveDate) -> StoreResult<DateRange> {
    DateRange::new(start, end).map_err(|e| StoreError::Internal(format!("corrupt trip dates: {e}")))
}
