//! Cost category repository.

use chrono::Utc;
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use crate::entities::cost_categories;
use crate::error::{StoreError, StoreResult, translate_delete};
use crate::store::ensure_affected;

/// Input for a new category.
#[derive(Debug, Clone)]
pub struct NewCategory {
    /// Owning trip.
    pub trip_id: Uuid,
    /// Name, unique per trip.
    pub name: String,
    /// Free text.
    pub description: Option<String>,
    /// Icon name.
    pub icon: Option<String>,
    /// Display color.
    pub color: Option<String>,
}

/// Partial category update; `None` leaves a field as it is.
#[derive(Debug, Clone, Default)]
pub struct CategoryPatch {
    /// New name.
    pub name: Option<String>,
    /// New description.
    pub description: Option<String>,
    /// New icon.
    pub icon: Option<String>,
    /// New color.
    pub color: Option<String>,
}

/// Cost category repository.
#[derive(Debug, Clone)]
pub struct CategoryRepository {
    db: DatabaseConnection,
}

impl CategoryRepository {
    /// Creates a new category repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Finds a category of `trip_id`.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the category does not exist in that trip.
    pub async fn find(&self, trip_id: Uuid, id: Uuid) -> StoreResult<cost_categories::Model> {
        cost_categories::Entity::find_by_id(id)
            .filter(cost_categories::Column::TripId.eq(trip_id))
            .one(&self.db)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("category {id}")))
    }

    /// Lists the categories of a trip by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_for_trip(&self, trip_id: Uuid) -> StoreResult<Vec<cost_categories::Model>> {
        Ok(cost_categories::Entity::find()
            .filter(cost_categories::Column::TripId.eq(trip_id))
            .order_by_asc(cost_categories::Column::Name)
            .all(&self.db)
            .await?)
    }

    /// Inserts a category.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Conflict` if the trip already has a category of that name.
    pub async fn insert(&self, new: NewCategory) -> StoreResult<cost_categories::Model> {
        let now: DateTimeWithTimeZone = Utc::now().into();
        let category = cost_categories::ActiveModel {
            id: Set(Uuid::new_v4()),
            trip_id: Set(new.trip_id),
            name: Set(new.name),
            description: Set(new.description),
            icon: Set(new.icon),
            color: Set(new.color),
            created_at: Set(now),
            updated_at: Set(now),
        };
        Ok(category.insert(&self.db).await?)
    }

    /// Applies a patch to `current`.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Conflict` if the new name is taken in the trip.
    pub async fn update(
        &self,
        current: cost_categories::Model,
        patch: CategoryPatch,
    ) -> StoreResult<cost_categories::Model> {
        let mut category: cost_categories::ActiveModel = current.into();
        if let Some(name) = patch.name {
            category.name = Set(name);
        }
        if let Some(description) = patch.description {
            category.description = Set(Some(description));
        }
        if let Some(icon) = patch.icon {
            category.icon = Set(Some(icon));
        }
        if let Some(color) = patch.color {
            category.color = Set(Some(color));
        }
        category.updated_at = Set(Utc::now().into());
        Ok(category.update(&self.db).await?)
    }

    /// Deletes a category.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Conflict` while costs still reference it.
    pub async fn delete(&self, id: Uuid) -> StoreResult<()> {
        let result = cost_categories::Entity::delete_by_id(id)
            .exec(&self.db)
            .await
            .map_err(translate_delete)?;
        ensure_affected(result.rows_affected, "category")?;
        Ok(())
    }
}
