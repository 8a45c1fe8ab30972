//! Trip endpoints.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::get,
};
use splittrip_core::trip::TripPatch;
use splittrip_db::CreateTrip;
use splittrip_db::views::{TripSummary, TripView};
use uuid::Uuid;

use crate::AppState;
use crate::error::ApiResult;
use crate::middleware::auth::AuthUser;

async fn list_trips(
    State(state): State<AppState>,
    auth: AuthUser,
) -> ApiResult<Json<Vec<TripSummary>>> {
    Ok(Json(state.trips.list_for_user(auth.user_id()).await?))
}

async fn create_trip(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(request): Json<CreateTrip>,
) -> ApiResult<(StatusCode, Json<TripSummary>)> {
    let trip = state.trips.create(auth.user_id(), request).await?;
    Ok((StatusCode::CREATED, Json(trip)))
}

/// The trip page: participants, category totals and the caller's position.
async fn get_trip(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(trip_id): Path<Uuid>,
) -> ApiResult<Json<TripView>> {
    Ok(Json(state.trip_views.trip_view(auth.user_id(), trip_id).await?))
}

async fn patch_trip(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(trip_id): Path<Uuid>,
    Json(patch): Json<TripPatch>,
) -> ApiResult<Json<TripSummary>> {
    Ok(Json(state.trips.patch(auth.user_id(), trip_id, patch).await?))
}

async fn delete_trip(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(trip_id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    state.trips.delete(auth.user_id(), trip_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Creates trip routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/trips", get(list_trips).post(create_trip))
        .route(
            "/trips/{trip_id}",
            get(get_trip).patch(patch_trip).delete(delete_trip),
        )
}
