//! Ledger store for SplitTrip.
//!
//! This crate provides:
//! - `SeaORM` entity definitions and the portable migration set
//! - [`LedgerStore`], the pooled handle with explicit transaction scoping
//! - Repositories per table
//! - The transactional services: debt ledger engine, transaction lifecycle,
//!   trips and participants, costs, users
//! - Read models composed after commit

pub mod entities;
pub mod error;
pub mod migration;
pub mod repositories;
pub mod services;
pub mod store;
pub mod views;

pub use error::{StoreError, StoreResult};
pub use migration::Migrator;
pub use services::{
    CostService, CreateCategory, CreateCost, CreateTransaction, CreateTrip, DebtLedger,
    InviteParticipant, Mailer, Outcome, RegisterOutcome, TransactionLifecycle, TripService,
    TripViewService, UpdateCategory, UpdateProfile, UserService,
};
pub use store::LedgerStore;
