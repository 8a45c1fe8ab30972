//! Pairwise debt bookkeeping rules.
//!
//! A debt row is stored once per unordered pair of users in a trip. The user
//! with the lower id is always the stored `creditor_id`; a positive stored
//! amount means the stored debtor owes the stored creditor, a negative one
//! means the reverse. Every ledger mutation is an additive delta, so reversing
//! a transaction is applying its negated amount.

use std::collections::HashMap;

use serde::Serialize;
use splittrip_shared::{Currency, Money, MoneyError};
use uuid::Uuid;

/// A delta expressed in the stored orientation of its pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CanonicalDelta {
    /// Lower of the two user ids.
    pub creditor_id: Uuid,
    /// Higher of the two user ids.
    pub debtor_id: Uuid,
    /// Amount to add to the stored balance.
    pub amount: Money,
}

/// Orients "`debtor` owes `creditor` an extra `amount`" onto the stored pair.
#[must_use]
pub fn canonical_delta(creditor: Uuid, debtor: Uuid, amount: Money) -> CanonicalDelta {
    if creditor <= debtor {
        CanonicalDelta {
            creditor_id: creditor,
            debtor_id: debtor,
            amount,
        }
    } else {
        CanonicalDelta {
            creditor_id: debtor,
            debtor_id: creditor,
            amount: amount.negate(),
        }
    }
}

/// A stored pair balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DebtRecord {
    /// Stored creditor (lower id).
    pub creditor_id: Uuid,
    /// Stored debtor (higher id).
    pub debtor_id: Uuid,
    /// Signed balance; positive means the debtor owes the creditor.
    pub amount: Money,
}

impl DebtRecord {
    /// Returns true if `user` is one side of the pair.
    #[must_use]
    pub fn involves(&self, user: Uuid) -> bool {
        self.creditor_id == user || self.debtor_id == user
    }

    /// Returns the other side of the pair, if `user` is on it.
    #[must_use]
    pub fn counterparty(&self, user: Uuid) -> Option<Uuid> {
        if self.creditor_id == user {
            Some(self.debtor_id)
        } else if self.debtor_id == user {
            Some(self.creditor_id)
        } else {
            None
        }
    }

    /// Re-expresses the record so the amount is never negative.
    #[must_use]
    pub fn oriented(&self) -> OrientedDebt {
        if self.amount.is_negative() {
            OrientedDebt {
                creditor_id: self.debtor_id,
                debtor_id: self.creditor_id,
                amount: self.amount.negate(),
            }
        } else {
            OrientedDebt {
                creditor_id: self.creditor_id,
                debtor_id: self.debtor_id,
                amount: self.amount,
            }
        }
    }
}

/// A balance as people read it: `debtor_id` owes `creditor_id` a non-negative amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OrientedDebt {
    /// User who is owed.
    pub creditor_id: Uuid,
    /// User who owes.
    pub debtor_id: Uuid,
    /// Non-negative amount.
    pub amount: Money,
}

/// Balance of a record as seen by `user`: positive when `user` is owed.
///
/// Returns `None` if `user` is not part of the pair.
#[must_use]
pub fn balance_from_perspective(record: &DebtRecord, user: Uuid) -> Option<Money> {
    if record.creditor_id == user {
        Some(record.amount)
    } else if record.debtor_id == user {
        Some(record.amount.negate())
    } else {
        None
    }
}

/// A user's aggregate position within one trip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NetPosition {
    /// Total others owe the user.
    pub credit: Money,
    /// Total the user owes others.
    pub debt: Money,
    /// `credit - debt`.
    pub net: Money,
}

impl NetPosition {
    /// A position with nothing owed either way.
    #[must_use]
    pub fn settled(currency: Currency) -> Self {
        let zero = Money::zero(currency);
        Self {
            credit: zero,
            debt: zero,
            net: zero,
        }
    }
}

/// Folds every pair balance involving `user` into a net position.
///
/// # Errors
///
/// Fails if a record is not in `currency`.
pub fn net_position<'a, I>(
    currency: Currency,
    records: I,
    user: Uuid,
) -> Result<NetPosition, MoneyError>
where
    I: IntoIterator<Item = &'a DebtRecord>,
{
    let mut position = NetPosition::settled(currency);
    for record in records {
        let Some(balance) = balance_from_perspective(record, user) else {
            continue;
        };
        if balance.is_positive() {
            position.credit = position.credit.checked_add(balance)?;
        } else if balance.is_negative() {
            position.debt = position.debt.checked_add(balance.negate())?;
        } else {
            // Settled rows still have to agree on currency.
            position.credit.checked_add(balance)?;
        }
    }
    position.net = position.credit.checked_sub(position.debt)?;
    Ok(position)
}

/// Reference model of a trip's debt rows, held in memory.
///
/// Applies the same per-delta rules as the persistent ledger in the db crate
/// (orientation, currency, overflow, balance limit). Nothing in the service
/// path uses it; it is the oracle the ledger is checked against in tests and
/// a way to replay a sequence of deltas without a database.
#[derive(Debug, Clone)]
pub struct DebtBook {
    currency: Currency,
    rows: HashMap<(Uuid, Uuid), Money>,
}

impl DebtBook {
    /// Creates an empty book.
    #[must_use]
    pub fn new(currency: Currency) -> Self {
        Self {
            currency,
            rows: HashMap::new(),
        }
    }

    /// Applies "`debtor` owes `creditor` an extra `amount`".
    ///
    /// # Errors
    ///
    /// Fails on currency mismatch, overflow, or a balance reaching
    /// [`MAX_AMOUNT`](splittrip_shared::MAX_AMOUNT); the book is unchanged then.
    pub fn apply(&mut self, creditor: Uuid, debtor: Uuid, amount: Money) -> Result<(), MoneyError> {
        let delta = canonical_delta(creditor, debtor, amount);
        let key = (delta.creditor_id, delta.debtor_id);
        let current = self
            .rows
            .get(&key)
            .copied()
            .unwrap_or_else(|| Money::zero(self.currency));
        let next = current.checked_add(delta.amount)?.within_limit()?;
        self.rows.insert(key, next);
        Ok(())
    }

    /// Stored rows, zero balances included.
    pub fn records(&self) -> impl Iterator<Item = DebtRecord> + '_ {
        self.rows.iter().map(|(&(creditor_id, debtor_id), &amount)| DebtRecord {
            creditor_id,
            debtor_id,
            amount,
        })
    }

    /// Number of stored rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns true if no delta was ever applied.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Balance between `a` and `b` from `a`'s perspective.
    #[must_use]
    pub fn balance_between(&self, a: Uuid, b: Uuid) -> Money {
        let delta = canonical_delta(a, b, Money::zero(self.currency));
        let stored = self
            .rows
            .get(&(delta.creditor_id, delta.debtor_id))
            .copied()
            .unwrap_or_else(|| Money::zero(self.currency));
        if a <= b { stored } else { stored.negate() }
    }

    /// Net position of `user`.
    ///
    /// # Errors
    ///
    /// Fails only on overflow.
    pub fn net_position(&self, user: Uuid) -> Result<NetPosition, MoneyError> {
        let records: Vec<DebtRecord> = self.records().collect();
        net_position(self.currency, &records, user)
    }
}
