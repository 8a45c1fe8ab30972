//! Money type with decimal precision and currency.
//!
//! CRITICAL: Never use floating-point for money calculations.
//! This type wraps `rust_decimal::Decimal` and keeps every amount at a fixed
//! scale of two decimal places, so the canonical string form is stable and
//! `parse(to_string(m)) == m` holds for every value.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of fractional digits every amount is stored with.
pub const MONEY_SCALE: u32 = 2;

/// Bound (exclusive) on the absolute value of an entered amount and of any
/// balance the ledger is allowed to persist.
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(2_764_472_320, 232_830, 0, false, 0); // 10^15

/// Errors produced while parsing or combining money values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MoneyError {
    /// The amount is not a decimal number.
    #[error("invalid amount: {0:?}")]
    InvalidAmount(String),

    /// The amount carries more precision than the stored scale.
    #[error("amount {0} has more than 2 decimal places")]
    TooPrecise(String),

    /// The amount is outside the accepted range.
    #[error("amount {0} is out of range")]
    OutOfRange(String),

    /// The currency code is not three ASCII letters.
    #[error("invalid currency code: {0:?}")]
    InvalidCurrency(String),

    /// Two amounts in different currencies were combined or compared.
    #[error("currency mismatch: {left} vs {right}")]
    CurrencyMismatch {
        /// Currency of the left operand.
        left: Currency,
        /// Currency of the right operand.
        right: Currency,
    },

    /// Decimal arithmetic overflowed.
    #[error("arithmetic overflow")]
    Overflow,
}

/// ISO 4217-like currency code: three upper-case ASCII letters.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Currency([u8; 3]);

impl Currency {
    /// Euro
    pub const EUR: Self = Self(*b"EUR");
    /// US Dollar
    pub const USD: Self = Self(*b"USD");
    /// Pound Sterling
    pub const GBP: Self = Self(*b"GBP");
    /// Swiss Franc
    pub const CHF: Self = Self(*b"CHF");

    /// Returns the code as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        // Only upper-case ASCII ever reaches the array.
        std::str::from_utf8(&self.0).unwrap_or("???")
    }
}

impl fmt::Debug for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Currency({})", self.as_str())
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Currency {
    type Err = MoneyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = s.trim().as_bytes();
        match bytes {
            [a, b, c] if bytes.iter().all(u8::is_ascii_alphabetic) => Ok(Self([
                a.to_ascii_uppercase(),
                b.to_ascii_uppercase(),
                c.to_ascii_uppercase(),
            ])),
            _ => Err(MoneyError::InvalidCurrency(s.to_string())),
        }
    }
}

impl TryFrom<String> for Currency {
    type Error = MoneyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Currency> for String {
    fn from(value: Currency) -> Self {
        value.as_str().to_string()
    }
}

/// Represents a monetary amount with currency.
///
/// The amount is always held at [`MONEY_SCALE`] and zero is never signed,
/// so two equal values also render to identical strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "MoneyRepr", into = "MoneyRepr")]
pub struct Money {
    amount: Decimal,
    currency: Currency,
}

/// Wire form: `{"amount": "50.00", "currency": "EUR"}`.
#[derive(Serialize, Deserialize)]
struct MoneyRepr {
    amount: String,
    currency: Currency,
}

fn canonical(mut amount: Decimal) -> Decimal {
    amount.rescale(MONEY_SCALE);
    if amount.is_zero() {
        amount.set_sign_positive(true);
    }
    amount
}

impl Money {
    /// Creates a money value from a decimal amount.
    ///
    /// # Errors
    ///
    /// Fails if the amount needs more than two fractional digits.
    pub fn new(amount: Decimal, currency: Currency) -> Result<Self, MoneyError> {
        if amount.normalize().scale() > MONEY_SCALE {
            return Err(MoneyError::TooPrecise(amount.to_string()));
        }
        Ok(Self {
            amount: canonical(amount),
            currency,
        })
    }

    /// Creates a money value from minor units (cents).
    #[must_use]
    pub fn from_minor(minor: i64, currency: Currency) -> Self {
        Self {
            amount: canonical(Decimal::new(minor, MONEY_SCALE)),
            currency,
        }
    }

    /// Creates a zero amount in the specified currency.
    #[must_use]
    pub fn zero(currency: Currency) -> Self {
        Self::from_minor(0, currency)
    }

    /// Parses a decimal amount string such as `"50"`, `"50.5"` or `"-6.00"`.
    ///
    /// # Errors
    ///
    /// Fails on empty, non-numeric, scientific or over-precise input.
    pub fn parse(amount: &str, currency: Currency) -> Result<Self, MoneyError> {
        let trimmed = amount.trim();
        if trimmed.is_empty() || trimmed.contains(['e', 'E', '_']) {
            return Err(MoneyError::InvalidAmount(amount.to_string()));
        }
        let value = Decimal::from_str(trimmed)
            .map_err(|_| MoneyError::InvalidAmount(amount.to_string()))?;
        Self::new(value, currency)
    }

    /// Parses an amount entered by a user; like [`Money::parse`] but also
    /// bounded by [`MAX_AMOUNT`].
    ///
    /// # Errors
    ///
    /// Fails like `parse`, or with `OutOfRange`.
    pub fn parse_input(amount: &str, currency: Currency) -> Result<Self, MoneyError> {
        Self::parse(amount, currency)?.within_limit()
    }

    /// Passes the value through if its magnitude is below [`MAX_AMOUNT`].
    ///
    /// # Errors
    ///
    /// Returns `OutOfRange` otherwise.
    pub fn within_limit(self) -> Result<Self, MoneyError> {
        if self.amount.abs() >= MAX_AMOUNT {
            Err(MoneyError::OutOfRange(self.amount.to_string()))
        } else {
            Ok(self)
        }
    }

    /// Returns the decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.amount
    }

    /// Returns the currency.
    #[must_use]
    pub const fn currency(&self) -> Currency {
        self.currency
    }

    /// Canonical fixed two-decimal form of the amount, e.g. `"50.00"`.
    #[must_use]
    pub fn amount_string(&self) -> String {
        self.amount.to_string()
    }

    /// Returns true if the amount is zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.amount.is_zero()
    }

    /// Returns true if the amount is negative.
    #[must_use]
    pub fn is_negative(&self) -> bool {
        self.amount < Decimal::ZERO
    }

    /// Returns true if the amount is strictly positive.
    #[must_use]
    pub fn is_positive(&self) -> bool {
        self.amount > Decimal::ZERO
    }

    /// Returns the additive inverse.
    #[must_use]
    pub fn negate(self) -> Self {
        Self {
            amount: canonical(-self.amount),
            currency: self.currency,
        }
    }

    /// Returns the absolute value.
    #[must_use]
    pub fn abs(self) -> Self {
        Self {
            amount: canonical(self.amount.abs()),
            currency: self.currency,
        }
    }

    /// Adds two amounts of the same currency.
    ///
    /// # Errors
    ///
    /// Fails on currency mismatch or overflow.
    pub fn checked_add(self, other: Self) -> Result<Self, MoneyError> {
        self.same_currency(&other)?;
        let amount = self
            .amount
            .checked_add(other.amount)
            .ok_or(MoneyError::Overflow)?;
        Ok(Self {
            amount: canonical(amount),
            currency: self.currency,
        })
    }

    /// Subtracts an amount of the same currency.
    ///
    /// # Errors
    ///
    /// Fails on currency mismatch or overflow.
    pub fn checked_sub(self, other: Self) -> Result<Self, MoneyError> {
        self.checked_add(other.negate())
    }

    /// Compares two amounts of the same currency.
    ///
    /// # Errors
    ///
    /// Fails on currency mismatch.
    pub fn try_cmp(&self, other: &Self) -> Result<Ordering, MoneyError> {
        self.same_currency(other)?;
        Ok(self.amount.cmp(&other.amount))
    }

    /// Sums amounts, starting from zero in `currency`.
    ///
    /// # Errors
    ///
    /// Fails if any item is in another currency or on overflow.
    pub fn sum<I>(currency: Currency, items: I) -> Result<Self, MoneyError>
    where
        I: IntoIterator<Item = Self>,
    {
        items
            .into_iter()
            .try_fold(Self::zero(currency), Self::checked_add)
    }

    fn same_currency(&self, other: &Self) -> Result<(), MoneyError> {
        if self.currency == other.currency {
            Ok(())
        } else {
            Err(MoneyError::CurrencyMismatch {
                left: self.currency,
                right: other.currency,
            })
        }
    }
}

impl PartialOrd for Money {
    /// Ordering by numeric value; amounts in different currencies are unordered.
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.try_cmp(other).ok()
    }
}

impl std::ops::Neg for Money {
    type Output = Self;

    fn neg(self) -> Self::Output {
        self.negate()
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.amount, self.currency)
    }
}

impl FromStr for Money {
    type Err = MoneyError;

    /// Parses the `Display` form, e.g. `"50.00 EUR"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (amount, currency) = s
            .trim()
            .rsplit_once(' ')
            .ok_or_else(|| MoneyError::InvalidAmount(s.to_string()))?;
        Self::parse(amount, currency.parse()?)
    }
}

impl TryFrom<MoneyRepr> for Money {
    type Error = MoneyError;

    fn try_from(value: MoneyRepr) -> Result<Self, Self::Error> {
        Self::parse(&value.amount, value.currency)
    }
}

impl From<Money> for MoneyRepr {
    fn from(value: Money) -> Self {
        Self {
            amount: value.amount_string(),
            currency: value.currency,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    fn eur(amount: &str) -> Money {
        Money::parse(amount, Currency::EUR).unwrap()
    }

    #[test]
    fn test_money_zero() {
        let money = Money::zero(Currency::EUR);
        assert!(money.is_zero());
        assert_eq!(money.amount(), Decimal::ZERO);
        assert_eq!(money.amount_string(), "0.00");
    }

    #[test]
    fn test_parse_pads_to_two_decimals() {
        assert_eq!(eur("50").amount_string(), "50.00");
        assert_eq!(eur("50.5").amount_string(), "50.50");
        assert_eq!(eur(" 12.34 ").amount_string(), "12.34");
        assert_eq!(eur("-6").amount_string(), "-6.00");
        assert_eq!(eur("50.000").amount_string(), "50.00");
    }

    #[rstest]
    #[case("abc")]
    #[case("")]
    #[case("   ")]
    #[case("1.2.3")]
    #[case("1e3")]
    #[case("12,50")]
    #[case("1_000")]
    fn test_parse_rejects_malformed(#[case] input: &str) {
        assert!(matches!(
            Money::parse(input, Currency::EUR),
            Err(MoneyError::InvalidAmount(_))
        ));
    }

    #[test]
    fn test_parse_rejects_extra_precision() {
        assert!(matches!(
            Money::parse("0.001", Currency::EUR),
            Err(MoneyError::TooPrecise(_))
        ));
    }

    #[test]
    fn test_parse_input_rejects_out_of_range() {
        assert!(matches!(
            Money::parse_input("1000000000000000", Currency::EUR),
            Err(MoneyError::OutOfRange(_))
        ));
        assert!(matches!(
            Money::parse_input("-1000000000000000", Currency::EUR),
            Err(MoneyError::OutOfRange(_))
        ));
        assert!(Money::parse_input("999999999999999.99", Currency::EUR).is_ok());
        assert!(Money::parse_input("abc", Currency::EUR).is_err());
    }

    #[test]
    fn test_large_sums_still_round_trip() {
        let half = Money::parse_input("600000000000000.00", Currency::EUR).unwrap();
        let sum = half.checked_add(half).unwrap();
        assert_eq!(sum.amount_string(), "1200000000000000.00");

        let reparsed: Money = sum.to_string().parse().unwrap();
        assert_eq!(reparsed, sum);
        assert_eq!(Money::parse(&sum.amount_string(), Currency::EUR), Ok(sum));
        assert!(matches!(sum.within_limit(), Err(MoneyError::OutOfRange(_))));
        assert_eq!(half.within_limit(), Ok(half));
    }

    #[test]
    fn test_negate_never_yields_signed_zero() {
        let zero = Money::zero(Currency::EUR).negate();
        assert_eq!(zero.amount_string(), "0.00");

        let settled = eur("50.00").checked_add(eur("-50.00")).unwrap();
        assert_eq!(settled.amount_string(), "0.00");
        assert!(!settled.is_negative());
    }

    #[test]
    fn test_add_and_sub() {
        assert_eq!(eur("10.00").checked_add(eur("-4.00")).unwrap(), eur("6.00"));
        assert_eq!(eur("0.10").checked_add(eur("0.20")).unwrap(), eur("0.30"));
        assert_eq!(eur("1.00").checked_sub(eur("2.50")).unwrap(), eur("-1.50"));
    }

    #[test]
    fn test_cross_currency_operations_fail() {
        let usd = Money::parse("1.00", Currency::USD).unwrap();
        assert!(matches!(
            eur("1.00").checked_add(usd),
            Err(MoneyError::CurrencyMismatch { .. })
        ));
        assert!(eur("1.00").try_cmp(&usd).is_err());
        assert_eq!(eur("1.00").partial_cmp(&usd), None);
    }

    #[test]
    fn test_ordering_by_value() {
        assert!(eur("2.00") > eur("1.99"));
        assert!(eur("-1.00") < eur("0.00"));
        assert_eq!(eur("1.50").try_cmp(&eur("1.5")).unwrap(), Ordering::Equal);
    }

    #[test]
    fn test_sum() {
        let total = Money::sum(Currency::EUR, [eur("1.10"), eur("2.20"), eur("3.30")]).unwrap();
        assert_eq!(total, eur("6.60"));
        assert_eq!(
            Money::sum(Currency::EUR, Vec::new()).unwrap(),
            Money::zero(Currency::EUR)
        );
    }

    #[test]
    fn test_display_and_from_str() {
        let money = eur("50");
        assert_eq!(money.to_string(), "50.00 EUR");
        assert_eq!("50.00 EUR".parse::<Money>().unwrap(), money);
        assert!("50.00".parse::<Money>().is_err());
        assert!("abc EUR".parse::<Money>().is_err());
    }

    #[test]
    fn test_new_from_decimal() {
        let money = Money::new(dec!(19.9), Currency::GBP).unwrap();
        assert_eq!(money.amount_string(), "19.90");
        assert!(Money::new(dec!(19.999), Currency::GBP).is_err());
    }

    #[test]
    fn test_currency_from_str() {
        assert_eq!("EUR".parse::<Currency>().unwrap(), Currency::EUR);
        assert_eq!("usd".parse::<Currency>().unwrap(), Currency::USD);
        assert_eq!(Currency::CHF.to_string(), "CHF");
        assert!("EURO".parse::<Currency>().is_err());
        assert!("E1R".parse::<Currency>().is_err());
        assert!("".parse::<Currency>().is_err());
    }

    #[test]
    fn test_serde_shape() {
        let json = serde_json::to_value(eur("12.5")).unwrap();
        assert_eq!(json, serde_json::json!({"amount": "12.50", "currency": "EUR"}));

        let back: Money = serde_json::from_value(json).unwrap();
        assert_eq!(back, eur("12.50"));

        let bad = serde_json::json!({"amount": "abc", "currency": "EUR"});
        assert!(serde_json::from_value::<Money>(bad).is_err());
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        #[test]
        fn prop_display_round_trip(minor in -100_000_000_000i64..100_000_000_000i64) {
            let money = Money::from_minor(minor, Currency::EUR);
            let parsed: Money = money.to_string().parse().unwrap();
            prop_assert_eq!(parsed, money);
            prop_assert_eq!(parsed.amount_string(), money.amount_string());
        }

        #[test]
        fn prop_negate_is_additive_inverse(minor in -1_000_000_000i64..1_000_000_000i64) {
            let money = Money::from_minor(minor, Currency::EUR);
            let sum = money.checked_add(money.negate()).unwrap();
            prop_assert!(sum.is_zero());
            prop_assert_eq!(sum.amount_string(), "0.00");
        }

        #[test]
        fn prop_add_then_sub_restores_value(
            a in -1_000_000_000i64..1_000_000_000i64,
            b in -1_000_000_000i64..1_000_000_000i64,
        ) {
            let start = Money::from_minor(a, Currency::EUR);
            let delta = Money::from_minor(b, Currency::EUR);
            let back = start.checked_add(delta).unwrap().checked_sub(delta).unwrap();
            prop_assert_eq!(back.amount_string(), start.amount_string());
        }
    }
}
