//! Transaction lifecycle manager.
//!
//! `Unconfirmed -> Confirmed` by the debtor, once; any live state ->
//! `Deleted` by either party. Creation and deletion update the debt ledger
//! in the same database transaction as the row itself.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sea_orm::DatabaseTransaction;
use serde::Deserialize;
use splittrip_core::transaction::{Parties, TransactionRules, TransactionState};
use splittrip_core::trip::ParticipantStatus;
use splittrip_shared::{AppError, AppResult, Currency, Money};
use uuid::Uuid;

use super::debts::lookup;
use super::{DebtLedger, require_member};
use crate::entities::transactions;
use crate::repositories::{
    NewTransaction, ParticipantRepository, TransactionRepository, TripRepository, UserRepository,
};
use crate::store::{LedgerStore, stored_currency, stored_money};
use crate::views::{TransactionView, TripSummary, UserSummary, unique_ids};

/// Request to record that `debtor_id` owes `creditor_id` `amount`.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateTransaction {
    /// User who is owed.
    pub creditor_id: Uuid,
    /// User who owes.
    pub debtor_id: Uuid,
    /// Decimal amount, e.g. `"50.00"`.
    pub amount: String,
    /// Currency of `amount`; the trip currency if omitted.
    pub currency: Option<Currency>,
    /// Free text.
    pub description: Option<String>,
    /// When the money changed hands; now if omitted.
    pub occurred_at: Option<DateTime<Utc>>,
}

/// Creates, confirms and deletes transactions.
#[derive(Debug, Clone)]
pub struct TransactionLifecycle {
    store: LedgerStore,
    transactions: TransactionRepository,
    trips: TripRepository,
    participants: ParticipantRepository,
    users: UserRepository,
    ledger: DebtLedger,
}

const fn parties_of(transaction: &transactions::Model) -> Parties {
    Parties {
        creditor_id: transaction.creditor_id,
        debtor_id: transaction.debtor_id,
    }
}

impl TransactionLifecycle {
    /// Creates the manager on `store`.
    #[must_use]
    pub fn new(store: LedgerStore) -> Self {
        let db = store.connection().clone();
        Self {
            transactions: TransactionRepository::new(db.clone()),
            trips: TripRepository::new(db.clone()),
            participants: ParticipantRepository::new(db.clone()),
            users: UserRepository::new(db),
            ledger: DebtLedger::new(&store),
            store,
        }
    }

    /// Records a transaction and adds its amount to the pair balance.
    ///
    /// # Errors
    ///
    /// * `NotFound` if the trip does not exist
    /// * `BadRequest` for a malformed, non-positive or foreign-currency
    ///   amount, or if creditor and debtor are the same user
    /// * `Forbidden` if `actor` is not the creditor, or a party is not an
    ///   accepted participant
    pub async fn create(
        &self,
        actor: Uuid,
        trip_id: Uuid,
        request: CreateTransaction,
    ) -> AppResult<TransactionView> {
        let trip = self.trips.find_by_id(trip_id).await?;
        let trip_currency = stored_currency(&trip.currency)?;
        let amount = Money::parse_input(&request.amount, request.currency.unwrap_or(trip_currency))?;
        let parties = Parties {
            creditor_id: request.creditor_id,
            debtor_id: request.debtor_id,
        };
        TransactionRules::validate_create(actor, parties, &amount, trip_currency)?;

        let creditor = self.participants.status(trip_id, parties.creditor_id).await?;
        let debtor = self.participants.status(trip_id, parties.debtor_id).await?;
        TransactionRules::validate_participants(
            parties,
            creditor == Some(ParticipantStatus::Accepted),
            debtor == Some(ParticipantStatus::Accepted),
        )?;

        let new = NewTransaction {
            trip_id,
            creditor_id: parties.creditor_id,
            debtor_id: parties.debtor_id,
            amount,
            description: request
                .description
                .map(|d| d.trim().to_string())
                .filter(|d| !d.is_empty()),
            occurred_at: request.occurred_at.unwrap_or_else(Utc::now).into(),
        };

        let txn = self.store.begin().await?;
        let result = self.create_in(&txn, new).await;
        let transaction = LedgerStore::finish(txn, result).await?;

        tracing::info!(
            transaction_id = %transaction.id,
            trip_id = %trip_id,
            amount = %amount,
            "Transaction created"
        );
        self.view(transaction).await
    }

    async fn create_in(
        &self,
        txn: &DatabaseTransaction,
        new: NewTransaction,
    ) -> AppResult<transactions::Model> {
        let (trip_id, creditor, debtor, amount) =
            (new.trip_id, new.creditor_id, new.debtor_id, new.amount);
        let transaction = self.transactions.insert(txn, new).await?;
        self.ledger
            .apply_delta(txn, trip_id, creditor, debtor, amount)
            .await?;
        Ok(transaction)
    }

    /// Confirms a transaction as its debtor. The ledger does not change.
    ///
    /// # Errors
    ///
    /// * `NotFound` if the transaction does not exist or was deleted
    /// * `Forbidden` if `actor` is not the debtor
    /// * `Conflict` if it is already confirmed
    pub async fn confirm(&self, actor: Uuid, transaction_id: Uuid) -> AppResult<TransactionView> {
        let transaction = self.transactions.find_active(transaction_id).await?;
        let state = TransactionState::from_flags(transaction.is_confirmed, false);
        TransactionRules::confirm(state, actor, parties_of(&transaction))?;

        if self.transactions.mark_confirmed(transaction_id).await? == 0 {
            // Lost a race: tell a concurrent delete apart from a concurrent confirm.
            self.transactions.find_active(transaction_id).await?;
            return Err(AppError::Conflict("transaction already confirmed".to_string()));
        }

        tracing::info!(transaction_id = %transaction_id, "Transaction confirmed");
        let confirmed = self.transactions.find_active(transaction_id).await?;
        self.view(confirmed).await
    }

    /// Soft-deletes a transaction and reverses its amount on the ledger.
    ///
    /// # Errors
    ///
    /// * `NotFound` if the transaction does not exist or was already deleted
    /// * `Forbidden` if `actor` is neither creditor nor debtor
    pub async fn delete(&self, actor: Uuid, transaction_id: Uuid) -> AppResult<()> {
        let transaction = self.transactions.find_active(transaction_id).await?;
        let state = TransactionState::from_flags(transaction.is_confirmed, false);
        let amount = stored_money(&transaction.amount, &transaction.currency)?;
        let reversal =
            TransactionRules::delete(state, actor, parties_of(&transaction), amount)?;

        let txn = self.store.begin().await?;
        let result = self.delete_in(&txn, &transaction, actor, reversal).await;
        LedgerStore::finish(txn, result).await?;

        tracing::info!(
            transaction_id = %transaction_id,
            trip_id = %transaction.trip_id,
            reversal = %reversal,
            "Transaction deleted"
        );
        Ok(())
    }

    async fn delete_in(
        &self,
        txn: &DatabaseTransaction,
        transaction: &transactions::Model,
        actor: Uuid,
        reversal: Money,
    ) -> AppResult<()> {
        if self
            .transactions
            .mark_deleted(txn, transaction.id, actor)
            .await?
            == 0
        {
            return Err(AppError::NotFound(format!("transaction {}", transaction.id)));
        }
        self.ledger
            .apply_delta(
                txn,
                transaction.trip_id,
                transaction.creditor_id,
                transaction.debtor_id,
                reversal,
            )
            .await?;
        Ok(())
    }

    /// Reads one live transaction, for a participant of its trip.
    ///
    /// # Errors
    ///
    /// * `NotFound` if the transaction does not exist or was deleted
    /// * `Forbidden` if `actor` is not a participant
    pub async fn get(&self, actor: Uuid, transaction_id: Uuid) -> AppResult<TransactionView> {
        let transaction = self.transactions.find_active(transaction_id).await?;
        require_member(&self.participants, transaction.trip_id, actor).await?;
        self.view(transaction).await
    }

    /// Lists the live transactions of a trip, for a participant.
    ///
    /// # Errors
    ///
    /// * `NotFound` if the trip does not exist
    /// * `Forbidden` if `actor` is not a participant
    pub async fn list_for_trip(&self, actor: Uuid, trip_id: Uuid) -> AppResult<Vec<TransactionView>> {
        let trip = self.trips.find_by_id(trip_id).await?;
        require_member(&self.participants, trip_id, actor).await?;
        let summary = TripSummary::from_model(&trip)?;

        let rows = self.transactions.list_active_for_trip(trip_id).await?;
        let users = self
            .summaries(rows.iter().flat_map(|t| [t.creditor_id, t.debtor_id]))
            .await?;
        rows.into_iter()
            .map(|t| -> AppResult<TransactionView> {
                let creditor = lookup(&users, t.creditor_id)?;
                let debtor = lookup(&users, t.debtor_id)?;
                Ok(TransactionView::compose(t, summary.clone(), creditor, debtor)?)
            })
            .collect()
    }

    async fn view(&self, transaction: transactions::Model) -> AppResult<TransactionView> {
        let trip = self.trips.find_by_id(transaction.trip_id).await?;
        let users = self
            .summaries([transaction.creditor_id, transaction.debtor_id])
            .await?;
        let creditor = lookup(&users, transaction.creditor_id)?;
        let debtor = lookup(&users, transaction.debtor_id)?;
        Ok(TransactionView::compose(
            transaction,
            TripSummary::from_model(&trip)?,
            creditor,
            debtor,
        )?)
    }

    async fn summaries<I>(&self, ids: I) -> AppResult<HashMap<Uuid, UserSummary>>
    where
        I: IntoIterator<Item = Uuid>,
    {
        Ok(self
            .users
            .find_many(&unique_ids(ids))
            .await?
            .iter()
            .map(|u| (u.id, UserSummary::from(u)))
            .collect())
    }
}
