//! Recorded costs of a trip.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get},
};
use splittrip_db::CreateCost;
use splittrip_db::views::CostView;
use uuid::Uuid;

use crate::AppState;
use crate::error::ApiResult;
use crate::middleware::auth::AuthUser;

async fn list_costs(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(trip_id): Path<Uuid>,
) -> ApiResult<Json<Vec<CostView>>> {
    Ok(Json(state.costs.list_costs(auth.user_id(), trip_id).await?))
}

async fn create_cost(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(trip_id): Path<Uuid>,
    Json(request): Json<CreateCost>,
) -> ApiResult<(StatusCode, Json<CostView>)> {
    let cost = state.costs.create_cost(auth.user_id(), trip_id, request).await?;
    Ok((StatusCode::CREATED, Json(cost)))
}

async fn delete_cost(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((trip_id, cost_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<StatusCode> {
    state.costs.delete_cost(auth.user_id(), trip_id, cost_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Creates cost routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/trips/{trip_id}/costs", get(list_costs).post(create_cost))
        .route("/trips/{trip_id}/costs/{cost_id}", delete(delete_cost))
}
