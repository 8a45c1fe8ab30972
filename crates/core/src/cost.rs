//! Cost rollups per trip and category.

use std::collections::BTreeMap;

use splittrip_shared::{Currency, Money, MoneyError};
use uuid::Uuid;

/// Totals of a trip's costs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CostRollup {
    /// Sum of every cost.
    pub total: Money,
    /// Sum per category; categories without costs are absent.
    pub by_category: BTreeMap<Uuid, Money>,
}

/// Sums `(category_id, amount)` pairs in `currency`.
///
/// # Errors
///
/// Fails if an amount is in another currency or on overflow.
pub fn rollup<I>(currency: Currency, costs: I) -> Result<CostRollup, MoneyError>
where
    I: IntoIterator<Item = (Uuid, Money)>,
{
    let mut total = Money::zero(currency);
    let mut by_category = BTreeMap::new();
    for (category_id, amount) in costs {
        total = total.checked_add(amount)?;
        let entry = by_category
            .entry(category_id)
            .or_insert_with(|| Money::zero(currency));
        *entry = entry.checked_add(amount)?;
    }
    Ok(CostRollup { total, by_category })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn eur(minor: i64) -> Money {
        Money::from_minor(minor, Currency::EUR)
    }

    #[test]
    fn test_rollup_groups_by_category() {
        let food = Uuid::from_u128(1);
        let fuel = Uuid::from_u128(2);
        let result = rollup(
            Currency::EUR,
            [(food, eur(1250)), (fuel, eur(4000)), (food, eur(750))],
        )
        .unwrap();
        assert_eq!(result.total, eur(6000));
        assert_eq!(result.by_category[&food], eur(2000));
        assert_eq!(result.by_category[&fuel], eur(4000));
    }

    #[test]
    fn test_rollup_empty() {
        let result = rollup(Currency::EUR, Vec::<(Uuid, Money)>::new()).unwrap();
        assert!(result.total.is_zero());
        assert!(result.by_category.is_empty());
    }

    #[test]
    fn test_rollup_rejects_mixed_currency() {
        let cat = Uuid::from_u128(1);
        assert!(rollup(Currency::EUR, [(cat, Money::from_minor(1, Currency::USD))]).is_err());
    }

    proptest! {
        /// **Property: category totals add up to the trip total**
        #[test]
        fn prop_category_totals_sum_to_total(
            costs in prop::collection::vec((0u128..4, 1i64..100_000), 0..30)
        ) {
            let items = costs.iter().map(|&(c, m)| (Uuid::from_u128(c), eur(m)));
            let result = rollup(Currency::EUR, items).unwrap();
            let sum = Money::sum(Currency::EUR, result.by_category.values().copied()).unwrap();
            prop_assert_eq!(sum, result.total);
        }
    }
}
