//! Common types used across the application.

pub mod money;

pub use money::{Currency, MAX_AMOUNT, MONEY_SCALE, Money, MoneyError};
