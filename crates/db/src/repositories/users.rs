//! User repository for database operations.

use chrono::Utc;
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set,
};
use uuid::Uuid;

use crate::entities::users;
use crate::error::{StoreError, StoreResult, translate_delete};
use crate::store::ensure_affected;

/// Input for a new, inactive user.
#[derive(Debug, Clone)]
pub struct NewUser {
    /// Unique display name.
    pub username: String,
    /// Normalised, unique email.
    pub email: String,
    /// Argon2 PHC string.
    pub password_hash: String,
}

/// Fields a profile update may change.
#[derive(Debug, Clone, Default)]
pub struct UserPatch {
    /// New username.
    pub username: Option<String>,
    /// New normalised email.
    pub email: Option<String>,
    /// New password hash.
    pub password_hash: Option<String>,
}

/// User repository for CRUD operations.
#[derive(Debug, Clone)]
pub struct UserRepository {
    db: DatabaseConnection,
}

impl UserRepository {
    /// Creates a new user repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Finds a user by ID.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if there is no such user.
    pub async fn find_by_id(&self, id: Uuid) -> StoreResult<users::Model> {
        users::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("user {id}")))
    }

    /// Finds a user by normalised email.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_email(&self, email: &str) -> StoreResult<Option<users::Model>> {
        Ok(users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .one(&self.db)
            .await?)
    }

    /// Loads every user in `ids`, ordered by username.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_many(&self, ids: &[Uuid]) -> StoreResult<Vec<users::Model>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        Ok(users::Entity::find()
            .filter(users::Column::Id.is_in(ids.iter().copied()))
            .order_by_asc(users::Column::Username)
            .all(&self.db)
            .await?)
    }

    /// Inserts an inactive user.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Conflict` if the username or email is taken.
    pub async fn insert<C: ConnectionTrait>(
        &self,
        conn: &C,
        new: NewUser,
    ) -> StoreResult<users::Model> {
        let now: DateTimeWithTimeZone = Utc::now().into();
        let user = users::ActiveModel {
            id: Set(Uuid::new_v4()),
            username: Set(new.username),
            email: Set(new.email),
            password_hash: Set(new.password_hash),
            is_active: Set(false),
            activated_at: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        };
        Ok(user.insert(conn).await?)
    }

    /// Flips an inactive user to active.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the user is missing or already active.
    pub async fn activate<C: ConnectionTrait>(&self, conn: &C, id: Uuid) -> StoreResult<()> {
        let now: DateTimeWithTimeZone = Utc::now().into();
        let result = users::Entity::update_many()
            .col_expr(users::Column::IsActive, Expr::value(true))
            .col_expr(users::Column::ActivatedAt, Expr::value(now))
            .col_expr(users::Column::UpdatedAt, Expr::value(now))
            .filter(users::Column::Id.eq(id))
            .filter(users::Column::IsActive.eq(false))
            .exec(conn)
            .await?;
        ensure_affected(result.rows_affected, "inactive user")?;
        Ok(())
    }

    /// Applies a profile patch.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` for an unknown user and
    /// `StoreError::Conflict` if the new username or email is taken.
    pub async fn update(&self, id: Uuid, patch: UserPatch) -> StoreResult<users::Model> {
        let mut user: users::ActiveModel = self.find_by_id(id).await?.into();
        if let Some(username) = patch.username {
            user.username = Set(username);
        }
        if let Some(email) = patch.email {
            user.email = Set(email);
        }
        if let Some(password_hash) = patch.password_hash {
            user.password_hash = Set(password_hash);
        }
        user.updated_at = Set(Utc::now().into());
        Ok(user.update(&self.db).await?)
    }

    /// Deletes a user.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Conflict` while costs, transactions or debts
    /// reference the user, and `StoreError::NotFound` if there is no such user.
    pub async fn delete(&self, id: Uuid) -> StoreResult<()> {
        let result = users::Entity::delete_by_id(id)
            .exec(&self.db)
            .await
            .map_err(translate_delete)?;
        ensure_affected(result.rows_affected, "user")?;
        Ok(())
    }
}
