//! Registration, activation, login and profile management.

use chrono::Utc;
use sea_orm::DatabaseTransaction;
use serde::Deserialize;
use splittrip_core::auth::{hash_password, verify_password};
use splittrip_core::user::{
    MIN_PASSWORD_LENGTH, UserRuleError, check_activation_token, ensure_active, normalize_email,
    validate_email, validate_registration,
};
use splittrip_shared::auth::{AccessToken, ActivateRequest, LoginRequest, RegisterRequest};
use splittrip_shared::config::ActivationConfig;
use splittrip_shared::jwt::JwtService;
use splittrip_shared::{AppError, AppResult};
use uuid::Uuid;

use super::{Mailer, Outcome};
use crate::entities::users;
use crate::error::StoreError;
use crate::repositories::{ActivationTokenRepository, NewUser, UserPatch, UserRepository};
use crate::store::LedgerStore;
use crate::views::{UserSummary, UserView};

/// Result of a registration; degraded when the activation mail failed.
pub type RegisterOutcome = Outcome<UserView>;

/// Partial profile update; blank fields are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateProfile {
    /// New username.
    pub username: Option<String>,
    /// New email.
    pub email: Option<String>,
    /// New password.
    pub password: Option<String>,
}

fn taken(err: StoreError) -> AppError {
    match err {
        StoreError::Conflict(_) => AppError::Conflict("username or email already taken".to_string()),
        other => other.into(),
    }
}

/// Account lifecycle operations.
#[derive(Debug, Clone)]
pub struct UserService {
    store: LedgerStore,
    users: UserRepository,
    tokens: ActivationTokenRepository,
    jwt: JwtService,
    mailer: Mailer,
    token_ttl_hours: i64,
}

impl UserService {
    /// Creates the service on `store`.
    #[must_use]
    pub fn new(
        store: LedgerStore,
        jwt: JwtService,
        mailer: Mailer,
        activation: &ActivationConfig,
    ) -> Self {
        let db = store.connection().clone();
        Self {
            users: UserRepository::new(db.clone()),
            tokens: ActivationTokenRepository::new(db),
            store,
            jwt,
            mailer,
            token_ttl_hours: activation.token_ttl_hours,
        }
    }

    /// Registers an inactive user and mails an activation link.
    ///
    /// A failed mail leaves the user registered and is reported in the
    /// outcome.
    ///
    /// # Errors
    ///
    /// * `BadRequest` for a blank username, malformed email or short password
    /// * `Conflict` if the username or email is taken
    pub async fn register(&self, request: RegisterRequest) -> AppResult<RegisterOutcome> {
        let registration =
            validate_registration(&request.username, &request.email, &request.password)?;
        let password_hash = hash_password(&request.password)?;
        let new = NewUser {
            username: registration.username,
            email: registration.email,
            password_hash,
        };

        let txn = self.store.begin().await?;
        let result = self.register_in(&txn, new).await;
        let (user, token) = LedgerStore::finish(txn, result).await?;
        tracing::info!(user_id = %user.id, "User registered");

        let mail = self.send_activation(&user, &token).await;
        let view = UserView::from(user);
        match mail {
            Ok(()) => Ok(Outcome::complete(view)),
            Err(e) => {
                tracing::warn!(user_id = %view.id, error = %e, "Activation mail not delivered");
                Ok(Outcome::degraded(view, e.into()))
            }
        }
    }

    async fn register_in(
        &self,
        txn: &DatabaseTransaction,
        new: NewUser,
    ) -> AppResult<(users::Model, String)> {
        let user = self.users.insert(txn, new).await.map_err(taken)?;
        let token = self
            .tokens
            .issue(txn, user.id, self.token_ttl_hours)
            .await?;
        Ok((user, token))
    }

    async fn send_activation(
        &self,
        user: &users::Model,
        token: &str,
    ) -> Result<(), splittrip_shared::email::EmailError> {
        let link = self.mailer.link(&format!("activate?token={token}"));
        let body = format!(
            "Hi {},\n\nopen {link} to activate your account.\nThe link expires in {} hours.\n",
            user.username, self.token_ttl_hours,
        );
        self.mailer
            .send(&user.email, "Activate your account", &body)
            .await
    }

    /// Consumes an activation token and activates its user.
    ///
    /// # Errors
    ///
    /// `BadRequest` for an unknown, used or expired token.
    pub async fn activate(&self, request: ActivateRequest) -> AppResult<UserView> {
        let token = self
            .tokens
            .find_by_raw(request.token.trim())
            .await?
            .ok_or(UserRuleError::TokenInvalid)?;
        check_activation_token(
            token.expires_at.with_timezone(&Utc),
            token.used_at.map(|t| t.with_timezone(&Utc)),
            Utc::now(),
        )?;

        let txn = self.store.begin().await?;
        let result = self.activate_in(&txn, token.id, token.user_id).await;
        LedgerStore::finish(txn, result).await?;

        tracing::info!(user_id = %token.user_id, "User activated");
        Ok(self.users.find_by_id(token.user_id).await?.into())
    }

    async fn activate_in(
        &self,
        txn: &DatabaseTransaction,
        token_id: Uuid,
        user_id: Uuid,
    ) -> AppResult<()> {
        if self.tokens.mark_used(txn, token_id).await? == 0 {
            return Err(UserRuleError::TokenUsed.into());
        }
        self.users.activate(txn, user_id).await.map_err(|e| match e {
            StoreError::NotFound(_) => AppError::from(UserRuleError::TokenUsed),
            other => other.into(),
        })
    }

    /// Checks credentials and issues an access token.
    ///
    /// # Errors
    ///
    /// `Unauthorized` for wrong credentials, `Forbidden` for an inactive account.
    pub async fn login(&self, request: LoginRequest) -> AppResult<AccessToken> {
        let user = self
            .users
            .find_by_email(&normalize_email(&request.email))
            .await?
            .ok_or(UserRuleError::InvalidCredentials)?;
        if !verify_password(&request.password, &user.password_hash)? {
            tracing::debug!(user_id = %user.id, "Password mismatch");
            return Err(UserRuleError::InvalidCredentials.into());
        }
        ensure_active(user.is_active)?;

        let token = self.jwt.generate_access_token(user.id)?;
        tracing::info!(user_id = %user.id, "User logged in");
        Ok(AccessToken::bearer(token, self.jwt.access_token_expires_in()))
    }

    /// The acting user's own account.
    ///
    /// # Errors
    ///
    /// `NotFound` if the account has been deleted.
    pub async fn me(&self, actor: Uuid) -> AppResult<UserView> {
        Ok(self.users.find_by_id(actor).await?.into())
    }

    /// Public identity of any user.
    ///
    /// # Errors
    ///
    /// `NotFound` if there is no such user.
    pub async fn get(&self, id: Uuid) -> AppResult<UserSummary> {
        Ok(UserSummary::from(&self.users.find_by_id(id).await?))
    }

    /// Updates the acting user's profile.
    ///
    /// # Errors
    ///
    /// * `BadRequest` for a malformed email or short password
    /// * `Conflict` if the new username or email is taken
    pub async fn update_profile(&self, actor: Uuid, request: UpdateProfile) -> AppResult<UserView> {
        let username = request
            .username
            .map(|u| u.trim().to_string())
            .filter(|u| !u.is_empty());
        let email = match request.email.filter(|e| !e.trim().is_empty()) {
            Some(email) => Some(validate_email(&email)?),
            None => None,
        };
        let password_hash = match request.password.filter(|p| !p.is_empty()) {
            Some(password) if password.chars().count() < MIN_PASSWORD_LENGTH => {
                return Err(UserRuleError::PasswordTooShort.into());
            }
            Some(password) => Some(hash_password(&password)?),
            None => None,
        };

        let user = self
            .users
            .update(
                actor,
                UserPatch {
                    username,
                    email,
                    password_hash,
                },
            )
            .await
            .map_err(taken)?;
        tracing::info!(user_id = %actor, "Profile updated");
        Ok(user.into())
    }

    /// Deletes the acting user's account.
    ///
    /// # Errors
    ///
    /// `Conflict` while costs, transactions or debts reference the user.
    pub async fn delete(&self, actor: Uuid) -> AppResult<()> {
        self.users.delete(actor).await.map_err(|e| match e {
            StoreError::Conflict(_) => AppError::Conflict(
                "user is still referenced by costs, transactions or debts".to_string(),
            ),
            other => other.into(),
        })?;
        tracing::info!(user_id = %actor, "User deleted");
        Ok(())
    }
}
