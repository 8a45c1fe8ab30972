//! Repository abstractions for data access.
//!
//! Repositories hide `SeaORM` from the services. Writes that belong to a
//! larger unit of work take the caller's connection or transaction; plain
//! reads and single-statement writes use the pool.

pub mod activation_tokens;
pub mod categories;
pub mod costs;
pub mod debts;
pub mod participants;
pub mod transactions;
pub mod trips;
pub mod users;

pub use activation_tokens::ActivationTokenRepository;
pub use categories::{CategoryPatch, CategoryRepository, NewCategory};
pub use costs::{CostRepository, NewCost};
pub use debts::DebtRepository;
pub use participants::{NewParticipant, ParticipantRepository};
pub use transactions::{NewTransaction, TransactionRepository};
pub use trips::{NewTrip, TripRepository};
pub use users::{NewUser, UserPatch, UserRepository};
