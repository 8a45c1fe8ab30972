//! Invitations and presence.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post, put},
};
use splittrip_core::trip::Presence;
use splittrip_db::InviteParticipant;
use splittrip_db::views::ParticipantView;
use uuid::Uuid;

use crate::AppState;
use crate::error::{ApiResult, WithWarning};
use crate::middleware::auth::AuthUser;

async fn list_participants(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(trip_id): Path<Uuid>,
) -> ApiResult<Json<Vec<ParticipantView>>> {
    Ok(Json(state.trips.participants(auth.user_id(), trip_id).await?))
}

/// Invites a registered user by email.
///
/// The invitation stands even if the mail fails; the body then carries a
/// `warning`.
async fn invite(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(trip_id): Path<Uuid>,
    Json(request): Json<InviteParticipant>,
) -> ApiResult<(StatusCode, Json<WithWarning<ParticipantView>>)> {
    let outcome = state.trips.invite(auth.user_id(), trip_id, request).await?;
    Ok((StatusCode::CREATED, Json(outcome.into())))
}

async fn accept(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(trip_id): Path<Uuid>,
) -> ApiResult<Json<ParticipantView>> {
    Ok(Json(state.trips.accept(auth.user_id(), trip_id).await?))
}

async fn decline(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(trip_id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    state.trips.decline(auth.user_id(), trip_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn update_presence(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(trip_id): Path<Uuid>,
    Json(presence): Json<Presence>,
) -> ApiResult<Json<ParticipantView>> {
    Ok(Json(
        state
            .trips
            .update_presence(auth.user_id(), trip_id, presence)
            .await?,
    ))
}

/// Creates participant routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/trips/{trip_id}/participants",
            get(list_participants).post(invite),
        )
        .route("/trips/{trip_id}/participants/me/accept", post(accept))
        .route("/trips/{trip_id}/participants/me/decline", post(decline))
        .route(
            "/trips/{trip_id}/participants/me/presence",
            put(update_presence),
        )
}
