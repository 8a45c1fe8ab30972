//! Activation token repository.
//!
//! Only the SHA-256 digest of a token is stored; the raw value goes out by
//! mail and is never persisted.

use chrono::{Duration, Utc};
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    Set,
};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::entities::activation_tokens;
use crate::error::StoreResult;

/// Activation token repository.
#[derive(Debug, Clone)]
pub struct ActivationTokenRepository {
    db: DatabaseConnection,
}

impl ActivationTokenRepository {
    /// Creates a new activation token repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Hashes a token for storage.
    #[must_use]
    pub fn hash_token(token: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(token.as_bytes());
        format!("{:x}", hasher.finalize())
    }

    /// Generates a random URL-safe token.
    #[must_use]
    pub fn generate_token() -> String {
        let bytes: [u8; 32] = rand::random();
        base64_url::encode(&bytes)
    }

    /// Issues a token for `user_id` valid for `ttl_hours`.
    /// Returns the raw token.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub async fn issue<C: ConnectionTrait>(
        &self,
        conn: &C,
        user_id: Uuid,
        ttl_hours: i64,
    ) -> StoreResult<String> {
        let raw_token = Self::generate_token();
        let now = Utc::now();
        let token = activation_tokens::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            token_hash: Set(Self::hash_token(&raw_token)),
            expires_at: Set((now + Duration::hours(ttl_hours)).into()),
            used_at: Set(None),
            created_at: Set(now.into()),
        };
        token.insert(conn).await?;
        Ok(raw_token)
    }

    /// Looks a raw token up by digest.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_raw(&self, raw_token: &str) -> StoreResult<Option<activation_tokens::Model>> {
        Ok(activation_tokens::Entity::find()
            .filter(activation_tokens::Column::TokenHash.eq(Self::hash_token(raw_token)))
            .one(&self.db)
            .await?)
    }

    /// Marks an unused token as used. Returns the number of rows changed,
    /// which is zero if another request used it first.
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails.
    pub async fn mark_used<C: ConnectionTrait>(&self, conn: &C, id: Uuid) -> StoreResult<u64> {
        let now: DateTimeWithTimeZone = Utc::now().into();
        let result = activation_tokens::Entity::update_many()
            .col_expr(activation_tokens::Column::UsedAt, Expr::value(now))
            .filter(activation_tokens::Column::Id.eq(id))
            .filter(activation_tokens::Column::UsedAt.is_null())
            .exec(conn)
            .await?;
        Ok(result.rows_affected)
    }
}
