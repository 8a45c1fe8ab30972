//! Cost categories and costs of a trip.

use chrono::NaiveDate;
use serde::Deserialize;
use splittrip_core::trip::{require_text, validate_trip_amount};
use splittrip_shared::{AppError, AppResult, Currency, Money};
use uuid::Uuid;

use super::require_accepted;
use crate::error::StoreError;
use crate::repositories::{
    CategoryPatch, CategoryRepository, CostRepository, NewCategory, NewCost,
    ParticipantRepository, TripRepository,
};
use crate::store::{LedgerStore, stored_currency};
use crate::views::{CategoryView, CostView};

/// Request to create a category.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateCategory {
    /// Name, unique within the trip.
    pub name: String,
    /// Free text.
    pub description: Option<String>,
    /// Icon name.
    pub icon: Option<String>,
    /// Display color.
    pub color: Option<String>,
}

/// Partial category update; blank fields are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateCategory {
    /// New name.
    pub name: Option<String>,
    /// New description.
    pub description: Option<String>,
    /// New icon.
    pub icon: Option<String>,
    /// New color.
    pub color: Option<String>,
}

/// Request to record a cost.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateCost {
    /// Category within the trip.
    pub category_id: Uuid,
    /// Label.
    pub name: String,
    /// Decimal amount, e.g. `"12.50"`.
    pub amount: String,
    /// Currency of `amount`; the trip currency if omitted.
    pub currency: Option<Currency>,
    /// Day it occurred.
    pub cost_date: NaiveDate,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn duplicate_name(err: StoreError, name: &str) -> AppError {
    match err {
        StoreError::Conflict(_) => AppError::Conflict(format!("category {name:?} already exists")),
        other => other.into(),
    }
}

/// Category and cost operations, for accepted participants.
#[derive(Debug, Clone)]
pub struct CostService {
    trips: TripRepository,
    participants: ParticipantRepository,
    categories: CategoryRepository,
    costs: CostRepository,
}

impl CostService {
    /// Creates the service on `store`.
    #[must_use]
    pub fn new(store: &LedgerStore) -> Self {
        let db = store.connection().clone();
        Self {
            trips: TripRepository::new(db.clone()),
            participants: ParticipantRepository::new(db.clone()),
            categories: CategoryRepository::new(db.clone()),
            costs: CostRepository::new(db),
        }
    }

    async fn authorize(&self, actor: Uuid, trip_id: Uuid) -> AppResult<Currency> {
        let trip = self.trips.find_by_id(trip_id).await?;
        require_accepted(&self.participants, trip_id, actor).await?;
        Ok(stored_currency(&trip.currency)?)
    }

    /// Creates a category.
    ///
    /// # Errors
    ///
    /// * `Forbidden` unless `actor` is an accepted participant
    /// * `BadRequest` for a blank name
    /// * `Conflict` if the name is taken in the trip
    pub async fn create_category(
        &self,
        actor: Uuid,
        trip_id: Uuid,
        request: CreateCategory,
    ) -> AppResult<CategoryView> {
        self.authorize(actor, trip_id).await?;
        let name = require_text("name", &request.name)?;
        let category = self
            .categories
            .insert(NewCategory {
                trip_id,
                name: name.clone(),
                description: non_blank(request.description),
                icon: non_blank(request.icon),
                color: non_blank(request.color),
            })
            .await
            .map_err(|e| duplicate_name(e, &name))?;
        tracing::info!(trip_id = %trip_id, category_id = %category.id, "Category created");
        Ok(category.into())
    }

    /// Updates a category.
    ///
    /// # Errors
    ///
    /// * `NotFound` if the category is not in the trip
    /// * `Forbidden` unless `actor` is an accepted participant
    /// * `Conflict` if the new name is taken in the trip
    pub async fn update_category(
        &self,
        actor: Uuid,
        trip_id: Uuid,
        category_id: Uuid,
        request: UpdateCategory,
    ) -> AppResult<CategoryView> {
        self.authorize(actor, trip_id).await?;
        let current = self.categories.find(trip_id, category_id).await?;
        let name = non_blank(request.name);
        let shown = name.clone().unwrap_or_else(|| current.name.clone());
        let category = self
            .categories
            .update(
                current,
                CategoryPatch {
                    name,
                    description: non_blank(request.description),
                    icon: non_blank(request.icon),
                    color: non_blank(request.color),
                },
            )
            .await
            .map_err(|e| duplicate_name(e, &shown))?;
        Ok(category.into())
    }

    /// Deletes a category that has no costs.
    ///
    /// # Errors
    ///
    /// * `NotFound` if the category is not in the trip
    /// * `Forbidden` unless `actor` is an accepted participant
    /// * `Conflict` while costs still reference it
    pub async fn delete_category(&self, actor: Uuid, trip_id: Uuid, category_id: Uuid) -> AppResult<()> {
        self.authorize(actor, trip_id).await?;
        self.categories.find(trip_id, category_id).await?;
        self.categories
            .delete(category_id)
            .await
            .map_err(|e| match e {
                StoreError::Conflict(_) => {
                    AppError::Conflict("category still has costs".to_string())
                }
                other => other.into(),
            })?;
        tracing::info!(trip_id = %trip_id, category_id = %category_id, "Category deleted");
        Ok(())
    }

    /// Lists the categories of a trip.
    ///
    /// # Errors
    ///
    /// `Forbidden` unless `actor` is an accepted participant.
    pub async fn list_categories(&self, actor: Uuid, trip_id: Uuid) -> AppResult<Vec<CategoryView>> {
        self.authorize(actor, trip_id).await?;
        let categories = self.categories.list_for_trip(trip_id).await?;
        Ok(categories.into_iter().map(CategoryView::from).collect())
    }

    /// Records a cost.
    ///
    /// # Errors
    ///
    /// * `NotFound` if the category is not in the trip
    /// * `Forbidden` unless `actor` is an accepted participant
    /// * `BadRequest` for a blank name or a malformed, non-positive or
    ///   foreign-currency amount
    pub async fn create_cost(
        &self,
        actor: Uuid,
        trip_id: Uuid,
        request: CreateCost,
    ) -> AppResult<CostView> {
        let trip_currency = self.authorize(actor, trip_id).await?;
        let name = require_text("name", &request.name)?;
        let amount = Money::parse_input(&request.amount, request.currency.unwrap_or(trip_currency))?;
        validate_trip_amount(&amount, trip_currency)?;
        self.categories.find(trip_id, request.category_id).await?;

        let cost = self
            .costs
            .insert(NewCost {
                trip_id,
                category_id: request.category_id,
                created_by: actor,
                name,
                amount,
                cost_date: request.cost_date,
            })
            .await?;
        tracing::info!(trip_id = %trip_id, cost_id = %cost.id, amount = %amount, "Cost recorded");
        Ok(CostView::from_model(cost)?)
    }

    /// Deletes a cost.
    ///
    /// # Errors
    ///
    /// `NotFound` if the cost is not in the trip, `Forbidden` unless `actor`
    /// is an accepted participant.
    pub async fn delete_cost(&self, actor: Uuid, trip_id: Uuid, cost_id: Uuid) -> AppResult<()> {
        self.authorize(actor, trip_id).await?;
        self.costs.find(trip_id, cost_id).await?;
        self.costs.delete(cost_id).await?;
        tracing::info!(trip_id = %trip_id, cost_id = %cost_id, "Cost deleted");
        Ok(())
    }

    /// Lists the costs of a trip.
    ///
    /// # Errors
    ///
    /// `Forbidden` unless `actor` is an accepted participant.
    pub async fn list_costs(&self, actor: Uuid, trip_id: Uuid) -> AppResult<Vec<CostView>> {
        self.authorize(actor, trip_id).await?;
        let costs = self.costs.list_for_trip(trip_id).await?;
        Ok(costs
            .into_iter()
            .map(CostView::from_model)
            .collect::<Result<Vec<_>, StoreError>>()?)
    }
}
