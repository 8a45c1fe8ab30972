//! Debt ledger engine.
//!
//! Every mutation is an additive delta on one canonical pair row, applied
//! inside the caller's transaction:
//!
//! 1. orient the pair (lower user id is the stored creditor)
//! 2. insert a zero row for the pair, doing nothing if it exists
//! 3. read the row with `FOR UPDATE`, so concurrent deltas on one pair queue
//!    behind each other under read-committed isolation
//! 4. refuse to mix currencies
//! 5. write the new balance
//!
//! Settled pairs keep their row with a zero balance.

use std::collections::HashMap;

use sea_orm::DatabaseTransaction;
use splittrip_core::debt::{
    DebtRecord, NetPosition, balance_from_perspective, canonical_delta, net_position,
};
use splittrip_core::transaction::TransactionRuleError;
use splittrip_shared::{AppError, AppResult, Money};
use uuid::Uuid;

use super::require_member;
use crate::entities::debts;
use crate::error::StoreResult;
use crate::repositories::{DebtRepository, ParticipantRepository, TripRepository, UserRepository};
use crate::store::{LedgerStore, stored_currency, stored_money};
use crate::views::{DebtView, UserSummary, unique_ids};

/// Pairwise debt ledger of every trip.
#[derive(Debug, Clone)]
pub struct DebtLedger {
    debts: DebtRepository,
    trips: TripRepository,
    participants: ParticipantRepository,
    users: UserRepository,
}

impl DebtLedger {
    /// Creates a ledger on `store`.
    #[must_use]
    pub fn new(store: &LedgerStore) -> Self {
        let db = store.connection().clone();
        Self {
            debts: DebtRepository::new(db.clone()),
            trips: TripRepository::new(db.clone()),
            participants: ParticipantRepository::new(db.clone()),
            users: UserRepository::new(db),
        }
    }

    /// Records that `debtor` owes `creditor` an extra `amount` (negative to
    /// reduce it) and returns the updated canonical row.
    ///
    /// # Errors
    ///
    /// * `BadRequest` if both users are the same, the pair already holds
    ///   another currency, or the balance would reach `MAX_AMOUNT`
    /// * `NotFound` if the trip or a user does not exist
    pub async fn apply_delta(
        &self,
        txn: &DatabaseTransaction,
        trip_id: Uuid,
        creditor: Uuid,
        debtor: Uuid,
        amount: Money,
    ) -> AppResult<DebtRecord> {
        if creditor == debtor {
            return Err(TransactionRuleError::SelfTransaction.into());
        }
        let delta = canonical_delta(creditor, debtor, amount);

        self.debts
            .ensure_pair(
                txn,
                trip_id,
                delta.creditor_id,
                delta.debtor_id,
                amount.currency(),
            )
            .await?;
        let row = self
            .debts
            .lock_pair(txn, trip_id, delta.creditor_id, delta.debtor_id)
            .await?;

        let current = stored_money(&row.amount, &row.currency)?;
        if current.currency() != amount.currency() {
            tracing::warn!(
                trip_id = %trip_id,
                stored = %current.currency(),
                delta = %amount.currency(),
                "Refusing to mix currencies on a debt pair"
            );
            return Err(AppError::BadRequest(format!(
                "debt is kept in {}, got {}",
                current.currency(),
                amount.currency()
            )));
        }
        let updated = current
            .checked_add(delta.amount)?
            .within_limit()
            .map_err(|e| {
                tracing::warn!(trip_id = %trip_id, error = %e, "Refusing debt balance beyond the limit");
                AppError::BadRequest(format!("debt balance would be out of range: {e}"))
            })?;
        self.debts.set_amount(txn, row.id, updated).await?;

        tracing::debug!(
            trip_id = %trip_id,
            creditor_id = %delta.creditor_id,
            debtor_id = %delta.debtor_id,
            delta = %delta.amount,
            balance = %updated,
            "Debt delta applied"
        );
        Ok(DebtRecord {
            creditor_id: delta.creditor_id,
            debtor_id: delta.debtor_id,
            amount: updated,
        })
    }

    /// Balance between `user` and `other` as seen by `user`: positive when
    /// `other` owes `user`. Zero if they never traded.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the trip does not exist.
    pub async fn balance_between(&self, trip_id: Uuid, user: Uuid, other: Uuid) -> AppResult<Money> {
        let trip = self.trips.find_by_id(trip_id).await?;
        let currency = stored_currency(&trip.currency)?;
        let zero = Money::zero(currency);
        if user == other {
            return Ok(zero);
        }
        let pair = canonical_delta(user, other, zero);
        let Some(row) = self
            .debts
            .find_pair(trip_id, pair.creditor_id, pair.debtor_id)
            .await?
        else {
            return Ok(zero);
        };
        let record = record_from_model(&row)?;
        Ok(balance_from_perspective(&record, user).unwrap_or(zero))
    }

    /// Every stored pair of the trip in canonical orientation.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or a row is corrupt.
    pub async fn records(&self, trip_id: Uuid) -> AppResult<Vec<DebtRecord>> {
        let rows = self.debts.list_for_trip(trip_id).await?;
        Ok(rows
            .iter()
            .map(record_from_model)
            .collect::<StoreResult<Vec<_>>>()?)
    }

    /// Credit, debt and net of `user` in the trip, computed from the rows.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the trip does not exist.
    pub async fn net_position(&self, trip_id: Uuid, user: Uuid) -> AppResult<NetPosition> {
        let trip = self.trips.find_by_id(trip_id).await?;
        let currency = stored_currency(&trip.currency)?;
        let records = self
            .debts
            .list_for_user(trip_id, user)
            .await?
            .iter()
            .map(record_from_model)
            .collect::<StoreResult<Vec<_>>>()?;
        Ok(net_position(currency, &records, user)?)
    }

    /// `actor`'s own position in the trip.
    ///
    /// # Errors
    ///
    /// * `NotFound` if the trip does not exist
    /// * `Forbidden` if `actor` is not a participant
    pub async fn my_position(&self, actor: Uuid, trip_id: Uuid) -> AppResult<NetPosition> {
        self.trips.find_by_id(trip_id).await?;
        require_member(&self.participants, trip_id, actor).await?;
        self.net_position(trip_id, actor).await
    }

    /// The trip's balances oriented so every amount is non-negative, for a
    /// participant.
    ///
    /// # Errors
    ///
    /// * `NotFound` if the trip does not exist
    /// * `Forbidden` if `actor` is not a participant
    pub async fn list_for_trip(&self, actor: Uuid, trip_id: Uuid) -> AppResult<Vec<DebtView>> {
        self.trips.find_by_id(trip_id).await?;
        require_member(&self.participants, trip_id, actor).await?;

        let records = self.records(trip_id).await?;
        let ids = unique_ids(
            records
                .iter()
                .flat_map(|r| [r.creditor_id, r.debtor_id]),
        );
        let users: HashMap<Uuid, UserSummary> = self
            .users
            .find_many(&ids)
            .await?
            .iter()
            .map(|u| (u.id, UserSummary::from(u)))
            .collect();

        records
            .iter()
            .map(|record| -> AppResult<DebtView> {
                let oriented = record.oriented();
                Ok(DebtView {
                    creditor: lookup(&users, oriented.creditor_id)?,
                    debtor: lookup(&users, oriented.debtor_id)?,
                    amount: oriented.amount,
                })
            })
            .collect()
    }
}

fn record_from_model(row: &debts::Model) -> StoreResult<DebtRecord> {
    Ok(DebtRecord {
        creditor_id: row.creditor_id,
        debtor_id: row.debtor_id,
        amount: stored_money(&row.amount, &row.currency)?,
    })
}

pub(crate) fn lookup(users: &HashMap<Uuid, UserSummary>, id: Uuid) -> AppResult<UserSummary> {
    users
        .get(&id)
        .cloned()
        .ok_or_else(|| AppError::NotFound(format!("user {id}")))
}
