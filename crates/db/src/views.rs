//! Read models returned by the services.
//!
//! Views are composed after a unit of work has committed and never feed
//! back into a write.

use chrono::NaiveDate;
use sea_orm::prelude::DateTimeWithTimeZone;
use serde::Serialize;
use splittrip_core::debt::NetPosition;
use splittrip_core::transaction::TransactionState;
use splittrip_core::trip::ParticipantStatus;
use splittrip_shared::{Currency, Money};
use uuid::Uuid;

use crate::entities::{cost_categories, costs, transactions, trip_participants, trips, users};
use crate::error::StoreResult;
use crate::store::{stored_currency, stored_money};

/// Public identity of a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserSummary {
    /// User ID.
    pub id: Uuid,
    /// Display name.
    pub username: String,
    /// Email address.
    pub email: String,
}

impl From<&users::Model> for UserSummary {
    fn from(user: &users::Model) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
        }
    }
}

/// A user's own account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserView {
    /// User ID.
    pub id: Uuid,
    /// Display name.
    pub username: String,
    /// Email address.
    pub email: String,
    /// Whether the account has been activated.
    pub is_active: bool,
    /// When it was activated.
    pub activated_at: Option<DateTimeWithTimeZone>,
    /// When it was registered.
    pub created_at: DateTimeWithTimeZone,
}

impl From<users::Model> for UserView {
    fn from(user: users::Model) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            is_active: user.is_active,
            activated_at: user.activated_at,
            created_at: user.created_at,
        }
    }
}

/// Header fields of a trip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TripSummary {
    /// Trip ID.
    pub id: Uuid,
    /// Trip name.
    pub name: String,
    /// Where it happens.
    pub location: String,
    /// Free text.
    pub description: Option<String>,
    /// First day.
    pub start_date: NaiveDate,
    /// Last day.
    pub end_date: NaiveDate,
    /// Currency of every amount in the trip.
    pub currency: Currency,
}

impl TripSummary {
    /// Builds a summary from a stored trip.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Internal` for a corrupt currency column.
    pub fn from_model(trip: &trips::Model) -> StoreResult<Self> {
        Ok(Self {
            id: trip.id,
            name: trip.name.clone(),
            location: trip.location.clone(),
            description: trip.description.clone(),
            start_date: trip.start_date,
            end_date: trip.end_date,
            currency: stored_currency(&trip.currency)?,
        })
    }
}

/// A participant with the resolved user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParticipantView {
    /// The participant.
    pub user: UserSummary,
    /// Invited or accepted.
    pub status: ParticipantStatus,
    /// First day present.
    pub presence_start: Option<NaiveDate>,
    /// Last day present.
    pub presence_end: Option<NaiveDate>,
    /// Who sent the invitation.
    pub invited_by: Option<Uuid>,
}

impl ParticipantView {
    /// Pairs a participant row with its user.
    #[must_use]
    pub fn new(participant: &trip_participants::Model, user: UserSummary) -> Self {
        Self {
            user,
            status: ParticipantStatus::from_accepted(participant.is_accepted),
            presence_start: participant.presence_start,
            presence_end: participant.presence_end,
            invited_by: participant.invited_by,
        }
    }
}

/// A cost category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryView {
    /// Category ID.
    pub id: Uuid,
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

impl From<cost_categories::Model> for CategoryView {
    fn from(category: cost_categories::Model) -> Self {
        Self {
            id: category.id,
            trip_id: category.trip_id,
            name: category.name,
            description: category.description,
            icon: category.icon,
            color: category.color,
        }
    }
}

/// A category with the sum of its costs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryTotal {
    /// The category.
    #[serde(flatten)]
    pub category: CategoryView,
    /// Sum of its costs.
    pub total: Money,
}

/// A recorded cost.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CostView {
    /// Cost ID.
    pub id: Uuid,
    /// Owning trip.
    pub trip_id: Uuid,
    /// Category.
    pub category_id: Uuid,
    /// Recording user.
    pub created_by: Uuid,
    /// Label.
    pub name: String,
    /// Amount in the trip currency.
    pub amount: Money,
    /// Day it occurred.
    pub cost_date: NaiveDate,
}

impl CostView {
    /// Builds a view from a stored cost.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Internal` for a corrupt amount.
    pub fn from_model(cost: costs::Model) -> StoreResult<Self> {
        Ok(Self {
            amount: stored_money(&cost.amount, &cost.currency)?,
            id: cost.id,
            trip_id: cost.trip_id,
            category_id: cost.category_id,
            created_by: cost.created_by,
            name: cost.name,
            cost_date: cost.cost_date,
        })
    }
}

/// A transaction with its parties and trip resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransactionView {
    /// Transaction ID.
    pub id: Uuid,
    /// Owning trip.
    pub trip: TripSummary,
    /// User who is owed.
    pub creditor: UserSummary,
    /// User who owes.
    pub debtor: UserSummary,
    /// Positive amount.
    pub amount: Money,
    /// Free text.
    pub description: Option<String>,
    /// Lifecycle state.
    pub state: TransactionState,
    /// When the money changed hands.
    pub occurred_at: DateTimeWithTimeZone,
    /// Whether the debtor confirmed.
    pub is_confirmed: bool,
    /// When the debtor confirmed.
    pub confirmed_at: Option<DateTimeWithTimeZone>,
    /// When it was recorded.
    pub created_at: DateTimeWithTimeZone,
}

impl TransactionView {
    /// Composes a view from a stored transaction and its resolved parts.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Internal` for a corrupt amount.
    pub fn compose(
        transaction: transactions::Model,
        trip: TripSummary,
        creditor: UserSummary,
        debtor: UserSummary,
    ) -> StoreResult<Self> {
        Ok(Self {
            amount: stored_money(&transaction.amount, &transaction.currency)?,
            state: TransactionState::from_flags(
                transaction.is_confirmed,
                transaction.deleted_at.is_some(),
            ),
            id: transaction.id,
            trip,
            creditor,
            debtor,
            description: transaction.description,
            occurred_at: transaction.occurred_at,
            is_confirmed: transaction.is_confirmed,
            confirmed_at: transaction.confirmed_at,
            created_at: transaction.created_at,
        })
    }
}

/// A pair balance as people read it: `debtor` owes `creditor` `amount`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DebtView {
    /// User who is owed.
    pub creditor: UserSummary,
    /// User who owes.
    pub debtor: UserSummary,
    /// Non-negative amount; zero for a settled pair.
    pub amount: Money,
}

/// Everything a participant sees on a trip page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TripView {
    /// Trip header.
    #[serde(flatten)]
    pub trip: TripSummary,
    /// Invited and accepted participants.
    pub participants: Vec<ParticipantView>,
    /// Categories with their totals.
    pub categories: Vec<CategoryTotal>,
    /// Sum of all costs.
    pub total_cost: Money,
    /// Requesting user's position, computed from the debt ledger.
    pub position: NetPosition,
}

/// Ids that a batch of views needs resolved.
pub(crate) fn unique_ids<I>(ids: I) -> Vec<Uuid>
where
    I: IntoIterator<Item = Uuid>,
{
    let mut ids: Vec<Uuid> = ids.into_iter().collect();
    ids.sort_unstable();
    ids.dedup();
    ids
}
