//! Transaction lifecycle rules.
//!
//! A transaction records that the creditor paid `amount` on behalf of the
//! debtor. Valid transitions are:
//! - Unconfirmed → Confirmed (debtor only, once)
//! - Unconfirmed | Confirmed → Deleted (creditor or debtor, terminal)
//!
//! Confirmation is an acknowledgment and never moves money. Creation applies
//! `+amount` to the pair's debt and deletion applies `-amount`.

use serde::{Deserialize, Serialize};
use splittrip_shared::{AppError, Currency, Money};
use thiserror::Error;
use uuid::Uuid;

use crate::trip::{TripRuleError, validate_trip_amount};

/// Lifecycle state of a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionState {
    /// Recorded, not yet acknowledged by the debtor.
    Unconfirmed,
    /// Acknowledged by the debtor.
    Confirmed,
    /// Reversed; invisible to reads.
    Deleted,
}

impl TransactionState {
    /// Maps the stored flags.
    #[must_use]
    pub const fn from_flags(is_confirmed: bool, is_deleted: bool) -> Self {
        match (is_deleted, is_confirmed) {
            (true, _) => Self::Deleted,
            (false, true) => Self::Confirmed,
            (false, false) => Self::Unconfirmed,
        }
    }
}

impl std::fmt::Display for TransactionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unconfirmed => write!(f, "unconfirmed"),
            Self::Confirmed => write!(f, "confirmed"),
            Self::Deleted => write!(f, "deleted"),
        }
    }
}

/// Errors raised by transaction rules.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransactionRuleError {
    /// Creditor and debtor are the same user.
    #[error("creditor and debtor must be different users")]
    SelfTransaction,

    /// Amount is not acceptable for the trip.
    #[error(transparent)]
    Amount(#[from] TripRuleError),

    /// Only the creditor may record a transaction.
    #[error("only the creditor may record a transaction")]
    NotCreditor,

    /// Only the debtor may confirm.
    #[error("only the debtor may confirm a transaction")]
    NotDebtor,

    /// Only creditor or debtor may delete.
    #[error("only the creditor or the debtor may delete a transaction")]
    NotParty,

    /// A party has not accepted the trip.
    #[error("user {0} is not an accepted participant of this trip")]
    ParticipantNotAccepted(Uuid),

    /// Transition not allowed from the current state.
    #[error("cannot {action} a {state} transaction")]
    InvalidTransition {
        /// Attempted action.
        action: &'static str,
        /// Current state.
        state: TransactionState,
    },
}

impl From<TransactionRuleError> for AppError {
    fn from(err: TransactionRuleError) -> Self {
        match err {
            TransactionRuleError::Amount(inner) => inner.into(),
            TransactionRuleError::SelfTransaction => Self::BadRequest(err.to_string()),
            TransactionRuleError::NotCreditor
            | TransactionRuleError::NotDebtor
            | TransactionRuleError::NotParty
            | TransactionRuleError::ParticipantNotAccepted(_) => Self::Forbidden(err.to_string()),
            TransactionRuleError::InvalidTransition {
                state: TransactionState::Deleted,
                ..
            } => Self::NotFound("transaction not found".to_string()),
            TransactionRuleError::InvalidTransition { .. } => Self::Conflict(err.to_string()),
        }
    }
}

/// Parties of a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Parties {
    /// User who paid.
    pub creditor_id: Uuid,
    /// User who owes.
    pub debtor_id: Uuid,
}

/// Stateless rule set for transaction transitions.
pub struct TransactionRules;

impl TransactionRules {
    /// Checks a new transaction before anything is written.
    ///
    /// Participant acceptance needs the store and is checked separately with
    /// [`TransactionRules::validate_participants`].
    ///
    /// # Errors
    ///
    /// * `SelfTransaction` if creditor and debtor are equal
    /// * `Amount` if the amount is not positive or not in the trip currency
    /// * `NotCreditor` if `actor` is not the creditor
    pub fn validate_create(
        actor: Uuid,
        parties: Parties,
        amount: &Money,
        trip_currency: Currency,
    ) -> Result<(), TransactionRuleError> {
        if parties.creditor_id == parties.debtor_id {
            return Err(TransactionRuleError::SelfTransaction);
        }
        validate_trip_amount(amount, trip_currency)?;
        if actor != parties.creditor_id {
            return Err(TransactionRuleError::NotCreditor);
        }
        Ok(())
    }

    /// Requires both parties to be accepted participants.
    ///
    /// # Errors
    ///
    /// Returns `ParticipantNotAccepted` naming the first party that is not.
    pub fn validate_participants(
        parties: Parties,
        creditor_accepted: bool,
        debtor_accepted: bool,
    ) -> Result<(), TransactionRuleError> {
        if !creditor_accepted {
            return Err(TransactionRuleError::ParticipantNotAccepted(
                parties.creditor_id,
            ));
        }
        if !debtor_accepted {
            return Err(TransactionRuleError::ParticipantNotAccepted(
                parties.debtor_id,
            ));
        }
        Ok(())
    }

    /// Validates `Unconfirmed -> Confirmed`.
    ///
    /// # Errors
    ///
    /// * `NotDebtor` if `actor` is not the debtor
    /// * `InvalidTransition` if already confirmed or deleted
    pub fn confirm(
        state: TransactionState,
        actor: Uuid,
        parties: Parties,
    ) -> Result<TransactionState, TransactionRuleError> {
        if state == TransactionState::Deleted {
            return Err(TransactionRuleError::InvalidTransition {
                action: "confirm",
                state,
            });
        }
        if actor != parties.debtor_id {
            return Err(TransactionRuleError::NotDebtor);
        }
        match state {
            TransactionState::Unconfirmed => Ok(TransactionState::Confirmed),
            _ => Err(TransactionRuleError::InvalidTransition {
                action: "confirm",
                state,
            }),
        }
    }

    /// Validates `* -> Deleted` and returns the ledger delta that undoes the
    /// transaction, expressed as "debtor owes creditor".
    ///
    /// # Errors
    ///
    /// * `NotParty` if `actor` is neither creditor nor debtor
    /// * `InvalidTransition` if already deleted
    pub fn delete(
        state: TransactionState,
        actor: Uuid,
        parties: Parties,
        amount: Money,
    ) -> Result<Money, TransactionRuleError> {
        if state == TransactionState::Deleted {
            return Err(TransactionRuleError::InvalidTransition {
                action: "delete",
                state,
            });
        }
        if actor != parties.creditor_id && actor != parties.debtor_id {
            return Err(TransactionRuleError::NotParty);
        }
        Ok(amount.negate())
    }

    /// Check if a state transition is valid.
    #[must_use]
    pub fn is_valid_transition(from: TransactionState, to: TransactionState) -> bool {
        matches!(
            (from, to),
            (TransactionState::Unconfirmed, TransactionState::Confirmed)
                | (
                    TransactionState::Unconfirmed | TransactionState::Confirmed,
                    TransactionState::Deleted
                )
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use splittrip_shared::ErrorKind;

    fn parties() -> Parties {
        Parties {
            creditor_id: Uuid::from_u128(1),
            debtor_id: Uuid::from_u128(2),
        }
    }

    fn eur(minor: i64) -> Money {
        Money::from_minor(minor, Currency::EUR)
    }

    #[test]
    fn test_create_by_creditor() {
        let p = parties();
        assert!(TransactionRules::validate_create(p.creditor_id, p, &eur(5000), Currency::EUR).is_ok());
    }

    #[test]
    fn test_create_rejects_self_transaction() {
        let user = Uuid::from_u128(1);
        let p = Parties {
            creditor_id: user,
            debtor_id: user,
        };
        let err = TransactionRules::validate_create(user, p, &eur(5000), Currency::EUR).unwrap_err();
        assert_eq!(err, TransactionRuleError::SelfTransaction);
        assert_eq!(AppError::from(err).kind(), ErrorKind::BadRequest);
    }

    #[test]
    fn test_create_rejects_other_actor() {
        let p = parties();
        let err = TransactionRules::validate_create(p.debtor_id, p, &eur(5000), Currency::EUR).unwrap_err();
        assert_eq!(AppError::from(err).kind(), ErrorKind::Forbidden);
    }

    #[test]
    fn test_create_rejects_bad_amount() {
        let p = parties();
        for amount in [eur(0), eur(-1), Money::from_minor(100, Currency::USD)] {
            let err = TransactionRules::validate_create(p.creditor_id, p, &amount, Currency::EUR)
                .unwrap_err();
            assert_eq!(AppError::from(err).kind(), ErrorKind::BadRequest);
        }
    }

    #[test]
    fn test_participants_must_be_accepted() {
        let p = parties();
        assert!(TransactionRules::validate_participants(p, true, true).is_ok());
        assert_eq!(
            TransactionRules::validate_participants(p, true, false),
            Err(TransactionRuleError::ParticipantNotAccepted(p.debtor_id))
        );
        assert_eq!(
            TransactionRules::validate_participants(p, false, true),
            Err(TransactionRuleError::ParticipantNotAccepted(p.creditor_id))
        );
    }

    #[test]
    fn test_confirm_once_by_debtor() {
        let p = parties();
        let next = TransactionRules::confirm(TransactionState::Unconfirmed, p.debtor_id, p).unwrap();
        assert_eq!(next, TransactionState::Confirmed);

        let again = TransactionRules::confirm(next, p.debtor_id, p).unwrap_err();
        assert_eq!(AppError::from(again).kind(), ErrorKind::Conflict);
    }

    #[test]
    fn test_confirm_by_creditor_is_forbidden() {
        let p = parties();
        let err = TransactionRules::confirm(TransactionState::Unconfirmed, p.creditor_id, p).unwrap_err();
        assert_eq!(err, TransactionRuleError::NotDebtor);
    }

    #[test]
    fn test_deleted_transaction_reads_as_missing() {
        let p = parties();
        let err = TransactionRules::confirm(TransactionState::Deleted, p.debtor_id, p).unwrap_err();
        assert_eq!(AppError::from(err).kind(), ErrorKind::NotFound);
        let err = TransactionRules::delete(TransactionState::Deleted, p.debtor_id, p, eur(1)).unwrap_err();
        assert_eq!(AppError::from(err).kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_delete_by_either_party_returns_reversal() {
        let p = parties();
        for actor in [p.creditor_id, p.debtor_id] {
            for state in [TransactionState::Unconfirmed, TransactionState::Confirmed] {
                let reversal = TransactionRules::delete(state, actor, p, eur(5000)).unwrap();
                assert_eq!(reversal, eur(-5000));
            }
        }
        let outsider = Uuid::from_u128(9);
        assert_eq!(
            TransactionRules::delete(TransactionState::Unconfirmed, outsider, p, eur(5000)),
            Err(TransactionRuleError::NotParty)
        );
    }

    #[test]
    fn test_state_from_flags() {
        assert_eq!(TransactionState::from_flags(false, false), TransactionState::Unconfirmed);
        assert_eq!(TransactionState::from_flags(true, false), TransactionState::Confirmed);
        assert_eq!(TransactionState::from_flags(true, true), TransactionState::Deleted);
        assert_eq!(TransactionState::Confirmed.to_string(), "confirmed");
    }

    fn arb_state() -> impl Strategy<Value = TransactionState> {
        prop_oneof![
            Just(TransactionState::Unconfirmed),
            Just(TransactionState::Confirmed),
            Just(TransactionState::Deleted),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// **Property: confirm only follows the state machine**
        #[test]
        fn prop_confirm_matches_transition_table(state in arb_state()) {
            let p = parties();
            let result = TransactionRules::confirm(state, p.debtor_id, p);
            prop_assert_eq!(
                result.is_ok(),
                TransactionRules::is_valid_transition(state, TransactionState::Confirmed)
            );
        }

        /// **Property: delete only follows the state machine**
        #[test]
        fn prop_delete_matches_transition_table(state in arb_state(), minor in 1i64..1_000_000) {
            let p = parties();
            let result = TransactionRules::delete(state, p.creditor_id, p, eur(minor));
            prop_assert_eq!(
                result.is_ok(),
                TransactionRules::is_valid_transition(state, TransactionState::Deleted)
            );
        }

        /// **Property: no self-transaction for any user or amount**
        #[test]
        fn prop_self_transaction_always_rejected(id in any::<u128>(), minor in -1_000_000i64..1_000_000) {
            let user = Uuid::from_u128(id);
            let p = Parties { creditor_id: user, debtor_id: user };
            prop_assert_eq!(
                TransactionRules::validate_create(user, p, &eur(minor), Currency::EUR),
                Err(TransactionRuleError::SelfTransaction)
            );
        }
    }
}
