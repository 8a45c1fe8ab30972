//! Core business rules for SplitTrip.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//! The persistence layer calls into it before and while it writes.
//!
//! # Modules
//!
//! - `debt` - Canonical pair orientation and net positions
//! - `transaction` - Transaction state machine and creation rules
//! - `trip` - Trip dates, presence ranges, participant transitions
//! - `cost` - Cost rollups per category
//! - `user` - Registration, activation and login gating
//! - `auth` - Password hashing

pub mod auth;
pub mod cost;
pub mod debt;
pub mod transaction;
pub mod trip;
pub mod user;
