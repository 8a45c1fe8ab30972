//! Shared types, errors, and configuration for SplitTrip.
//!
//! This crate provides common types used across all other crates:
//! - Money types with decimal precision
//! - Application-wide error types
//! - Configuration management
//! - JWT handling and the outbound notification collaborator

pub mod auth;
pub mod config;
pub mod email;
pub mod error;
pub mod jwt;
pub mod types;

pub use config::AppConfig;
pub use error::{AppError, AppResult, ErrorKind};
pub use types::{Currency, MAX_AMOUNT, Money, MoneyError};
