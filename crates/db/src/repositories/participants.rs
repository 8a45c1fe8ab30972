//! Trip participant repository.

use chrono::Utc;
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set,
};
use splittrip_core::trip::{ParticipantStatus, Presence};
use uuid::Uuid;

use crate::entities::trip_participants;
use crate::error::StoreResult;

/// Input for a participant row.
#[derive(Debug, Clone, Copy)]
pub struct NewParticipant {
    /// Trip joined.
    pub trip_id: Uuid,
    /// Participant.
    pub user_id: Uuid,
    /// True for the trip creator.
    pub is_accepted: bool,
    /// Inviting user.
    pub invited_by: Option<Uuid>,
}

/// Trip participant repository.
#[derive(Debug, Clone)]
pub struct ParticipantRepository {
    db: DatabaseConnection,
}

impl ParticipantRepository {
    /// Creates a new participant repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Finds one participant row.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find(
        &self,
        trip_id: Uuid,
        user_id: Uuid,
    ) -> StoreResult<Option<trip_participants::Model>> {
        Ok(trip_participants::Entity::find_by_id((trip_id, user_id))
            .one(&self.db)
            .await?)
    }

    /// Returns the participant state of `user_id`, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn status(
        &self,
        trip_id: Uuid,
        user_id: Uuid,
    ) -> StoreResult<Option<ParticipantStatus>> {
        Ok(self
            .find(trip_id, user_id)
            .await?
            .map(|p| ParticipantStatus::from_accepted(p.is_accepted)))
    }

    /// Lists the participants of a trip in joining order.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_for_trip(&self, trip_id: Uuid) -> StoreResult<Vec<trip_participants::Model>> {
        Ok(trip_participants::Entity::find()
            .filter(trip_participants::Column::TripId.eq(trip_id))
            .order_by_asc(trip_participants::Column::CreatedAt)
            .all(&self.db)
            .await?)
    }

    /// Inserts a participant row.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Conflict` if the user already is a participant and
    /// `StoreError::ForeignKeyMissing` if trip or user do not exist.
    pub async fn insert<C: ConnectionTrait>(
        &self,
        conn: &C,
        new: NewParticipant,
    ) -> StoreResult<trip_participants::Model> {
        let now: DateTimeWithTimeZone = Utc::now().into();
        let participant = trip_participants::ActiveModel {
            trip_id: Set(new.trip_id),
            user_id: Set(new.user_id),
            is_accepted: Set(new.is_accepted),
            presence_start: Set(None),
            presence_end: Set(None),
            invited_by: Set(new.invited_by),
            created_at: Set(now),
            updated_at: Set(now),
        };
        Ok(participant.insert(conn).await?)
    }

    /// Accepts a pending invitation. Returns the number of rows changed.
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails.
    pub async fn accept(&self, trip_id: Uuid, user_id: Uuid) -> StoreResult<u64> {
        let now: DateTimeWithTimeZone = Utc::now().into();
        let result = trip_participants::Entity::update_many()
            .col_expr(trip_participants::Column::IsAccepted, Expr::value(true))
            .col_expr(trip_participants::Column::UpdatedAt, Expr::value(now))
            .filter(trip_participants::Column::TripId.eq(trip_id))
            .filter(trip_participants::Column::UserId.eq(user_id))
            .filter(trip_participants::Column::IsAccepted.eq(false))
            .exec(&self.db)
            .await?;
        Ok(result.rows_affected)
    }

    /// Deletes a pending invitation. Returns the number of rows removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the delete fails.
    pub async fn delete_invitation(&self, trip_id: Uuid, user_id: Uuid) -> StoreResult<u64> {
        let result = trip_participants::Entity::delete_many()
            .filter(trip_participants::Column::TripId.eq(trip_id))
            .filter(trip_participants::Column::UserId.eq(user_id))
            .filter(trip_participants::Column::IsAccepted.eq(false))
            .exec(&self.db)
            .await?;
        Ok(result.rows_affected)
    }

    /// Stores presence bounds. Returns the number of rows changed.
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails.
    pub async fn set_presence(
        &self,
        trip_id: Uuid,
        user_id: Uuid,
        presence: Presence,
    ) -> StoreResult<u64> {
        let now: DateTimeWithTimeZone = Utc::now().into();
        let result = trip_participants::Entity::update_many()
            .col_expr(
                trip_participants::Column::PresenceStart,
                Expr::value(presence.start),
            )
            .col_expr(
                trip_participants::Column::PresenceEnd,
                Expr::value(presence.end),
            )
            .col_expr(trip_participants::Column::UpdatedAt, Expr::value(now))
            .filter(trip_participants::Column::TripId.eq(trip_id))
            .filter(trip_participants::Column::UserId.eq(user_id))
            .exec(&self.db)
            .await?;
        Ok(result.rows_affected)
    }
}

/// Presence bounds stored on a participant row.
#[must_use]
pub const fn stored_presence(participant: &trip_participants::Model) -> Presence {
    Presence {
        start: participant.presence_start,
        end: participant.presence_end,
    }
}
