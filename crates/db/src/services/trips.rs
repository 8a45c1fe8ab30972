//! Trips and their participants.

use chrono::NaiveDate;
use sea_orm::DatabaseTransaction;
use serde::Deserialize;
use splittrip_core::trip::{DateRange, Presence, TripFields, TripPatch, TripRuleError, require_text};
use splittrip_core::user::normalize_email;
use splittrip_shared::{AppError, AppResult, Currency};
use uuid::Uuid;

use super::{Mailer, Outcome, require_accepted, require_member};
use crate::entities::{trip_participants, trips, users};
use crate::error::StoreError;
use crate::repositories::participants::stored_presence;
use crate::repositories::trips::{stored_dates, stored_fields};
use crate::repositories::{
    NewParticipant, NewTrip, ParticipantRepository, TripRepository, UserRepository,
};
use crate::store::LedgerStore;
use crate::views::{ParticipantView, TripSummary, UserSummary};

/// Request to create a trip.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateTrip {
    /// Trip name.
    pub name: String,
    /// Where it happens.
    pub location: String,
    /// Free text.
    pub description: Option<String>,
    /// First day.
    pub start_date: NaiveDate,
    /// Last day.
    pub end_date: NaiveDate,
    /// Three-letter code fixed for the trip's lifetime.
    pub currency: String,
}

/// Request to invite a registered user.
#[derive(Debug, Clone, Deserialize)]
pub struct InviteParticipant {
    /// Invitee's email.
    pub email: String,
}

/// Trip and participant operations.
#[derive(Debug, Clone)]
pub struct TripService {
    store: LedgerStore,
    trips: TripRepository,
    participants: ParticipantRepository,
    users: UserRepository,
    mailer: Mailer,
}

impl TripService {
    /// Creates the service on `store`.
    #[must_use]
    pub fn new(store: LedgerStore, mailer: Mailer) -> Self {
        let db = store.connection().clone();
        Self {
            trips: TripRepository::new(db.clone()),
            participants: ParticipantRepository::new(db.clone()),
            users: UserRepository::new(db),
            store,
            mailer,
        }
    }

    /// Creates a trip with `actor` as its first, accepted participant.
    ///
    /// # Errors
    ///
    /// `BadRequest` for blank name or location, reversed dates or a
    /// malformed currency.
    pub async fn create(&self, actor: Uuid, request: CreateTrip) -> AppResult<TripSummary> {
        let fields = TripFields {
            name: require_text("name", &request.name)?,
            location: require_text("location", &request.location)?,
            description: request
                .description
                .map(|d| d.trim().to_string())
                .filter(|d| !d.is_empty()),
            dates: DateRange::new(request.start_date, request.end_date)?,
        };
        let currency: Currency = request.currency.parse()?;

        let txn = self.store.begin().await?;
        let result = self.create_in(&txn, actor, NewTrip { fields, currency }).await;
        let trip = LedgerStore::finish(txn, result).await?;

        tracing::info!(trip_id = %trip.id, user_id = %actor, currency = %currency, "Trip created");
        Ok(TripSummary::from_model(&trip)?)
    }

    async fn create_in(
        &self,
        txn: &DatabaseTransaction,
        actor: Uuid,
        new: NewTrip,
    ) -> AppResult<trips::Model> {
        let trip = self.trips.insert(txn, new).await?;
        self.participants
            .insert(
                txn,
                NewParticipant {
                    trip_id: trip.id,
                    user_id: actor,
                    is_accepted: true,
                    invited_by: None,
                },
            )
            .await?;
        Ok(trip)
    }

    /// Reads a trip header, for a participant.
    ///
    /// # Errors
    ///
    /// `NotFound` if the trip does not exist, `Forbidden` for non-participants.
    pub async fn get(&self, actor: Uuid, trip_id: Uuid) -> AppResult<TripSummary> {
        let trip = self.trips.find_by_id(trip_id).await?;
        require_member(&self.participants, trip_id, actor).await?;
        Ok(TripSummary::from_model(&trip)?)
    }

    /// Applies a partial update. Blank supplied fields are ignored; the
    /// resulting dates must still contain every participant's presence.
    ///
    /// # Errors
    ///
    /// * `NotFound` if the trip does not exist
    /// * `Forbidden` unless `actor` is an accepted participant
    /// * `BadRequest` if the new dates are reversed or exclude a presence
    pub async fn patch(&self, actor: Uuid, trip_id: Uuid, patch: TripPatch) -> AppResult<TripSummary> {
        let trip = self.trips.find_by_id(trip_id).await?;
        require_accepted(&self.participants, trip_id, actor).await?;

        let current = stored_fields(&trip)?;
        let presences: Vec<Presence> = self
            .participants
            .list_for_trip(trip_id)
            .await?
            .iter()
            .map(stored_presence)
            .collect();
        let fields = patch.apply(&current, &presences)?;
        let updated = self
            .trips
            .update(self.store.connection(), trip, fields)
            .await?;

        tracing::info!(trip_id = %trip_id, user_id = %actor, "Trip updated");
        Ok(TripSummary::from_model(&updated)?)
    }

    /// Deletes a trip with everything recorded in it.
    ///
    /// # Errors
    ///
    /// `NotFound` if the trip does not exist, `Forbidden` unless `actor` is
    /// an accepted participant.
    pub async fn delete(&self, actor: Uuid, trip_id: Uuid) -> AppResult<()> {
        self.trips.find_by_id(trip_id).await?;
        require_accepted(&self.participants, trip_id, actor).await?;
        self.trips.delete(trip_id).await?;
        tracing::info!(trip_id = %trip_id, user_id = %actor, "Trip deleted");
        Ok(())
    }

    /// Lists the trips `actor` is invited to or takes part in.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn list_for_user(&self, actor: Uuid) -> AppResult<Vec<TripSummary>> {
        let trips = self.trips.list_for_user(actor).await?;
        Ok(trips
            .iter()
            .map(TripSummary::from_model)
            .collect::<Result<Vec<_>, StoreError>>()?)
    }

    /// Invites a registered user by email and notifies them.
    ///
    /// A failed notification leaves the invitation in place and is reported
    /// in the outcome.
    ///
    /// # Errors
    ///
    /// * `NotFound` if the trip or the invitee does not exist
    /// * `Forbidden` unless `actor` is an accepted participant
    /// * `Conflict` if the invitee already is a participant
    pub async fn invite(
        &self,
        actor: Uuid,
        trip_id: Uuid,
        request: InviteParticipant,
    ) -> AppResult<Outcome<ParticipantView>> {
        let trip = self.trips.find_by_id(trip_id).await?;
        require_accepted(&self.participants, trip_id, actor).await?;

        let email = normalize_email(&request.email);
        let invitee = self
            .users
            .find_by_email(&email)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("user {email}")))?;

        let participant = self
            .participants
            .insert(
                self.store.connection(),
                NewParticipant {
                    trip_id,
                    user_id: invitee.id,
                    is_accepted: false,
                    invited_by: Some(actor),
                },
            )
            .await
            .map_err(|e| match e {
                StoreError::Conflict(_) => AppError::from(TripRuleError::AlreadyParticipant),
                other => other.into(),
            })?;
        tracing::info!(trip_id = %trip_id, user_id = %invitee.id, invited_by = %actor, "Participant invited");

        let view = ParticipantView::new(&participant, UserSummary::from(&invitee));
        match self.notify_invitee(&trip, &invitee).await {
            Ok(()) => Ok(Outcome::complete(view)),
            Err(e) => {
                tracing::warn!(trip_id = %trip_id, user_id = %invitee.id, error = %e, "Invitation mail not delivered");
                Ok(Outcome::degraded(view, e.into()))
            }
        }
    }

    async fn notify_invitee(
        &self,
        trip: &trips::Model,
        invitee: &users::Model,
    ) -> Result<(), splittrip_shared::email::EmailError> {
        let subject = format!("You are invited to {}", trip.name);
        let body = format!(
            "Hi {},\n\nyou have been invited to the trip \"{}\" in {}.\nOpen {} to accept or decline.\n",
            invitee.username,
            trip.name,
            trip.location,
            self.mailer.link(&format!("trips/{}", trip.id)),
        );
        self.mailer.send(&invitee.email, &subject, &body).await
    }

    /// Accepts `actor`'s own invitation.
    ///
    /// # Errors
    ///
    /// `NotFound` without an invitation, `Conflict` if already accepted.
    pub async fn accept(&self, actor: Uuid, trip_id: Uuid) -> AppResult<ParticipantView> {
        let status = self
            .participants
            .status(trip_id, actor)
            .await?
            .ok_or_else(|| AppError::NotFound("invitation".to_string()))?;
        status.accept()?;
        if self.participants.accept(trip_id, actor).await? == 0 {
            return Err(self.invitation_gone(trip_id, actor).await);
        }
        tracing::info!(trip_id = %trip_id, user_id = %actor, "Invitation accepted");
        self.participant_view(trip_id, actor).await
    }

    /// Declines `actor`'s own pending invitation, removing it.
    ///
    /// # Errors
    ///
    /// `NotFound` without an invitation, `Conflict` if already accepted.
    pub async fn decline(&self, actor: Uuid, trip_id: Uuid) -> AppResult<()> {
        let status = self
            .participants
            .status(trip_id, actor)
            .await?
            .ok_or_else(|| AppError::NotFound("invitation".to_string()))?;
        status.decline()?;
        if self.participants.delete_invitation(trip_id, actor).await? == 0 {
            return Err(self.invitation_gone(trip_id, actor).await);
        }
        tracing::info!(trip_id = %trip_id, user_id = %actor, "Invitation declined");
        Ok(())
    }

    /// Error for a pending invitation that changed between read and update.
    async fn invitation_gone(&self, trip_id: Uuid, actor: Uuid) -> AppError {
        match self.participants.status(trip_id, actor).await {
            Ok(Some(_)) => TripRuleError::AlreadyAccepted.into(),
            Ok(None) => AppError::NotFound("invitation".to_string()),
            Err(e) => e.into(),
        }
    }

    /// Sets `actor`'s own presence bounds.
    ///
    /// # Errors
    ///
    /// * `NotFound` if the trip does not exist
    /// * `Forbidden` for non-participants
    /// * `BadRequest` if a bound is outside the trip or the bounds are reversed
    pub async fn update_presence(
        &self,
        actor: Uuid,
        trip_id: Uuid,
        presence: Presence,
    ) -> AppResult<ParticipantView> {
        let trip = self.trips.find_by_id(trip_id).await?;
        require_member(&self.participants, trip_id, actor).await?;
        presence.validate_within(&stored_dates(trip.start_date, trip.end_date)?)?;
        if self.participants.set_presence(trip_id, actor, presence).await? == 0 {
            return Err(AppError::NotFound("participant".to_string()));
        }
        self.participant_view(trip_id, actor).await
    }

    /// Lists invited and accepted participants, for a participant.
    ///
    /// # Errors
    ///
    /// `NotFound` if the trip does not exist, `Forbidden` for non-participants.
    pub async fn participants(&self, actor: Uuid, trip_id: Uuid) -> AppResult<Vec<ParticipantView>> {
        self.trips.find_by_id(trip_id).await?;
        require_member(&self.participants, trip_id, actor).await?;
        let rows = self.participants.list_for_trip(trip_id).await?;
        participant_views(&self.users, &rows).await
    }

    async fn participant_view(&self, trip_id: Uuid, user_id: Uuid) -> AppResult<ParticipantView> {
        let participant = self
            .participants
            .find(trip_id, user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("participant".to_string()))?;
        let user = self.users.find_by_id(user_id).await?;
        Ok(ParticipantView::new(&participant, UserSummary::from(&user)))
    }
}

/// Resolves participant rows to views, keeping row order.
pub(crate) async fn participant_views(
    users: &UserRepository,
    rows: &[trip_participants::Model],
) -> AppResult<Vec<ParticipantView>> {
    let ids: Vec<Uuid> = rows.iter().map(|p| p.user_id).collect();
    let found = users.find_many(&ids).await?;
    rows.iter()
        .map(|p| -> AppResult<ParticipantView> {
            let user = found
                .iter()
                .find(|u| u.id == p.user_id)
                .ok_or_else(|| AppError::NotFound(format!("user {}", p.user_id)))?;
            Ok(ParticipantView::new(p, UserSummary::from(user)))
        })
        .collect()
}
