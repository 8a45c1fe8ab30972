//! Transactional services.
//!
//! Every service takes the acting user as an explicit argument and performs
//! its writes inside one database transaction scoped by [`LedgerStore`].
//!
//! [`LedgerStore`]: crate::store::LedgerStore

pub mod costs;
pub mod debts;
pub mod transactions;
pub mod trip_views;
pub mod trips;
pub mod users;

pub use costs::{CostService, CreateCategory, CreateCost, UpdateCategory};
pub use debts::DebtLedger;
pub use transactions::{CreateTransaction, TransactionLifecycle};
pub use trip_views::TripViewService;
pub use trips::{CreateTrip, InviteParticipant, TripService};
pub use users::{RegisterOutcome, UpdateProfile, UserService};

use std::fmt;
use std::sync::Arc;

use splittrip_core::trip::{ParticipantStatus, ensure_accepted};
use splittrip_shared::config::EmailConfig;
use splittrip_shared::email::{EmailError, Notifier, deliver_with_retry};
use splittrip_shared::{AppError, AppResult};
use uuid::Uuid;

use crate::repositories::ParticipantRepository;

/// Outcome of an operation whose primary effect succeeded.
///
/// `upstream_error` is set when a secondary step, such as sending mail,
/// failed without undoing the primary effect.
#[derive(Debug)]
pub struct Outcome<T> {
    /// The committed result.
    pub value: T,
    /// Degraded secondary step, if any.
    pub upstream_error: Option<AppError>,
}

impl<T> Outcome<T> {
    /// A fully successful outcome.
    pub const fn complete(value: T) -> Self {
        Self {
            value,
            upstream_error: None,
        }
    }

    /// A successful outcome with a degraded secondary step.
    pub const fn degraded(value: T, error: AppError) -> Self {
        Self {
            value,
            upstream_error: Some(error),
        }
    }

    /// Returns true if a secondary step failed.
    pub const fn is_degraded(&self) -> bool {
        self.upstream_error.is_some()
    }
}

/// Outbound mail with the configured retry budget and link base.
#[derive(Clone)]
pub struct Mailer {
    notifier: Arc<dyn Notifier>,
    frontend_url: String,
    max_attempts: u32,
}

impl fmt::Debug for Mailer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mailer")
            .field("frontend_url", &self.frontend_url)
            .field("max_attempts", &self.max_attempts)
            .finish_non_exhaustive()
    }
}

impl Mailer {
    /// Wraps a notifier.
    #[must_use]
    pub fn new(notifier: Arc<dyn Notifier>, config: &EmailConfig) -> Self {
        Self {
            notifier,
            frontend_url: config.frontend_url.trim_end_matches('/').to_string(),
            max_attempts: config.max_attempts,
        }
    }

    /// Absolute frontend link for `path`.
    pub(crate) fn link(&self, path: &str) -> String {
        format!("{}/{}", self.frontend_url, path.trim_start_matches('/'))
    }

    /// Sends one message, retrying up to the configured attempts.
    pub(crate) async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), EmailError> {
        deliver_with_retry(
            self.notifier.as_ref(),
            &[to.to_string()],
            subject,
            body,
            self.max_attempts,
        )
        .await
    }
}

/// Requires `user_id` to hold any participant row in the trip.
pub(crate) async fn require_member(
    participants: &ParticipantRepository,
    trip_id: Uuid,
    user_id: Uuid,
) -> AppResult<ParticipantStatus> {
    participants
        .status(trip_id, user_id)
        .await?
        .ok_or_else(|| AppError::Forbidden("not a participant of this trip".to_string()))
}

/// Requires `user_id` to be an accepted participant of the trip.
pub(crate) async fn require_accepted(
    participants: &ParticipantRepository,
    trip_id: Uuid,
    user_id: Uuid,
) -> AppResult<()> {
    ensure_accepted(participants.status(trip_id, user_id).await?)?;
    Ok(())
}
