//! Trip page aggregate.

use splittrip_core::cost::rollup;
use splittrip_shared::{AppResult, Money};
use uuid::Uuid;

use super::trips::participant_views;
use super::{DebtLedger, require_member};
use crate::repositories::{
    CategoryRepository, CostRepository, ParticipantRepository, TripRepository, UserRepository,
};
use crate::store::{LedgerStore, stored_money};
use crate::views::{CategoryTotal, CategoryView, TripSummary, TripView};

/// Builds [`TripView`]s.
#[derive(Debug, Clone)]
pub struct TripViewService {
    trips: TripRepository,
    participants: ParticipantRepository,
    users: UserRepository,
    categories: CategoryRepository,
    costs: CostRepository,
    ledger: DebtLedger,
}

impl TripViewService {
    /// Creates the service on `store`.
    #[must_use]
    pub fn new(store: &LedgerStore) -> Self {
        let db = store.connection().clone();
        Self {
            trips: TripRepository::new(db.clone()),
            participants: ParticipantRepository::new(db.clone()),
            users: UserRepository::new(db.clone()),
            categories: CategoryRepository::new(db.clone()),
            costs: CostRepository::new(db),
            ledger: DebtLedger::new(store),
        }
    }

    /// Trip header, participants, cost totals and `actor`'s live position.
    ///
    /// # Errors
    ///
    /// `NotFound` if the trip does not exist, `Forbidden` for non-participants.
    pub async fn trip_view(&self, actor: Uuid, trip_id: Uuid) -> AppResult<TripView> {
        let trip = self.trips.find_by_id(trip_id).await?;
        require_member(&self.participants, trip_id, actor).await?;
        let summary = TripSummary::from_model(&trip)?;
        let currency = summary.currency;

        let participant_rows = self.participants.list_for_trip(trip_id).await?;
        let participants = participant_views(&self.users, &participant_rows).await?;

        let costs = self
            .costs
            .list_for_trip(trip_id)
            .await?
            .iter()
            .map(|c| -> AppResult<(Uuid, Money)> {
                Ok((c.category_id, stored_money(&c.amount, &c.currency)?))
            })
            .collect::<AppResult<Vec<_>>>()?;
        let totals = rollup(currency, costs)?;

        let categories = self
            .categories
            .list_for_trip(trip_id)
            .await?
            .into_iter()
            .map(|category| CategoryTotal {
                total: totals
                    .by_category
                    .get(&category.id)
                    .copied()
                    .unwrap_or_else(|| Money::zero(currency)),
                category: CategoryView::from(category),
            })
            .collect();

        let position = self.ledger.net_position(trip_id, actor).await?;

        Ok(TripView {
            trip: summary,
            participants,
            categories,
            total_cost: totals.total,
            position,
        })
    }
}
