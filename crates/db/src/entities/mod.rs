//! `SeaORM` entity definitions.
//!
//! Money columns are stored as canonical decimal strings (`"50.00"`) next to
//! a three-letter currency column.

pub mod activation_tokens;
pub mod cost_categories;
pub mod costs;
pub mod debts;
pub mod transactions;
pub mod trip_participants;
pub mod trips;
pub mod users;
