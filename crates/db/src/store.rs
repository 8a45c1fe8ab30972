//! Ledger store handle: bounded pool plus explicit transaction scoping.
//!
//! There is no process-wide connection. A `LedgerStore` is built once and
//! cloned into every repository and service.

use std::time::Duration;

use sea_orm::{ConnectOptions, Database, DatabaseConnection, DatabaseTransaction, TransactionTrait};
use sea_orm_migration::MigratorTrait;
use splittrip_shared::config::DatabaseConfig;
use splittrip_shared::{Currency, Money};

use crate::error::{StoreError, StoreResult};
use crate::migration::Migrator;

/// Shared handle to the relational store.
#[derive(Debug, Clone)]
pub struct LedgerStore {
    db: DatabaseConnection,
}

impl LedgerStore {
    /// Connects with a bounded pool.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Unavailable` if the database cannot be reached.
    pub async fn connect(config: &DatabaseConfig) -> StoreResult<Self> {
        let mut options = ConnectOptions::new(config.url.clone());
        options
            .max_connections(config.max_connections)
            .min_connections(config.min_connections.min(config.max_connections))
            .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
            .sqlx_logging(false);

        let db = Database::connect(options)
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        tracing::info!(
            max_connections = config.max_connections,
            "Database pool ready"
        );
        Ok(Self { db })
    }

    /// Wraps an existing connection.
    #[must_use]
    pub const fn from_connection(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Returns the pooled connection for reads and single-statement writes.
    #[must_use]
    pub const fn connection(&self) -> &DatabaseConnection {
        &self.db
    }

    /// Applies pending migrations.
    ///
    /// # Errors
    ///
    /// Returns an error if a migration fails.
    pub async fn migrate(&self) -> StoreResult<()> {
        Migrator::up(&self.db, None).await?;
        Ok(())
    }

    /// Round-trips a trivial statement.
    ///
    /// # Errors
    ///
    /// Returns an error if the database does not answer.
    pub async fn ping(&self) -> StoreResult<()> {
        self.db.ping().await?;
        Ok(())
    }

    /// Opens a transaction.
    ///
    /// Dropping the returned handle without committing rolls it back, which
    /// also covers a cancelled request future.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Unavailable` if no connection can be acquired.
    pub async fn begin(&self) -> StoreResult<DatabaseTransaction> {
        Ok(self.db.begin().await?)
    }

    /// Commits a transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if the commit fails; nothing is persisted then.
    pub async fn commit(txn: DatabaseTransaction) -> StoreResult<()> {
        Ok(txn.commit().await?)
    }

    /// Rolls a transaction back.
    ///
    /// # Errors
    ///
    /// Returns an error if the rollback statement fails.
    pub async fn rollback(txn: DatabaseTransaction) -> StoreResult<()> {
        Ok(txn.rollback().await?)
    }

    /// Commits on `Ok`, rolls back on `Err`, and passes the result through.
    ///
    /// # Errors
    ///
    /// Returns the body's error, or the commit error.
    pub async fn finish<T, E>(txn: DatabaseTransaction, result: Result<T, E>) -> Result<T, E>
    where
        E: From<StoreError>,
    {
        match result {
            Ok(value) => {
                Self::commit(txn).await?;
                Ok(value)
            }
            Err(err) => {
                if let Err(rollback_err) = Self::rollback(txn).await {
                    tracing::warn!(error = %rollback_err, "Rollback failed");
                }
                Err(err)
            }
        }
    }
}

/// Turns zero affected rows of a targeted write into `NotFound`.
///
/// # Errors
///
/// Returns `StoreError::NotFound` when `rows_affected == 0`.
pub fn ensure_affected(rows_affected: u64, what: &str) -> StoreResult<u64> {
    if rows_affected == 0 {
        Err(StoreError::NotFound(what.to_string()))
    } else {
        Ok(rows_affected)
    }
}

/// Rebuilds a `Money` from its stored columns.
///
/// # Errors
///
/// Returns `StoreError::Internal` for a row that does not hold a canonical amount.
pub fn stored_money(amount: &str, currency: &str) -> StoreResult<Money> {
    let currency = stored_currency(currency)?;
    Money::parse(amount, currency)
        .map_err(|e| StoreError::Internal(format!("corrupt stored amount {amount:?}: {e}")))
}

/// Rebuilds a `Currency` from its stored column.
///
/// # Errors
///
/// Returns `StoreError::Internal` for a malformed code.
pub fn stored_currency(currency: &str) -> StoreResult<Currency> {
    currency
        .parse()
        .map_err(|e| StoreError::Internal(format!("corrupt stored currency: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ensure_affected() {
        assert_eq!(ensure_affected(1, "trip"), Ok(1));
        assert_eq!(
            ensure_affected(0, "trip"),
            Err(StoreError::NotFound("trip".into()))
        );
    }

    #[test]
    fn test_stored_money() {
        let money = stored_money("50.00", "EUR").unwrap();
        assert_eq!(money.to_string(), "50.00 EUR");
        assert!(matches!(
            stored_money("fifty", "EUR"),
            Err(StoreError::Internal(_))
        ));
        assert!(matches!(
            stored_money("1.00", "EURO"),
            Err(StoreError::Internal(_))
        ));
    }
}
