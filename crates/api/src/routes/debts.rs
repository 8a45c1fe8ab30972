//! Debt balances of a trip.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::get,
};
use splittrip_core::debt::NetPosition;
use splittrip_db::views::DebtView;
use uuid::Uuid;

use crate::AppState;
use crate::error::ApiResult;
use crate::middleware::auth::AuthUser;

async fn list_debts(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(trip_id): Path<Uuid>,
) -> ApiResult<Json<Vec<DebtView>>> {
    Ok(Json(state.ledger.list_for_trip(auth.user_id(), trip_id).await?))
}

async fn my_position(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(trip_id): Path<Uuid>,
) -> ApiResult<Json<NetPosition>> {
    Ok(Json(state.ledger.my_position(auth.user_id(), trip_id).await?))
}

/// Creates debt routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/trips/{trip_id}/debts", get(list_debts))
        .route("/trips/{trip_id}/debts/me", get(my_position))
}
