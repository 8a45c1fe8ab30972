//! Cost categories of a trip.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, patch},
};
use splittrip_db::views::CategoryView;
use splittrip_db::{CreateCategory, UpdateCategory};
use uuid::Uuid;

use crate::AppState;
use crate::error::ApiResult;
use crate::middleware::auth::AuthUser;

async fn list_categories(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(trip_id): Path<Uuid>,
) -> ApiResult<Json<Vec<CategoryView>>> {
    Ok(Json(state.costs.list_categories(auth.user_id(), trip_id).await?))
}

async fn create_category(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(trip_id): Path<Uuid>,
    Json(request): Json<CreateCategory>,
) -> ApiResult<(StatusCode, Json<CategoryView>)> {
    let category = state
        .costs
        .create_category(auth.user_id(), trip_id, request)
        .await?;
    Ok((StatusCode::CREATED, Json(category)))
}

async fn update_category(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((trip_id, category_id)): Path<(Uuid, Uuid)>,
    Json(request): Json<UpdateCategory>,
) -> ApiResult<Json<CategoryView>> {
    Ok(Json(
        state
            .costs
            .update_category(auth.user_id(), trip_id, category_id, request)
            .await?,
    ))
}

async fn delete_category(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((trip_id, category_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<StatusCode> {
    state
        .costs
        .delete_category(auth.user_id(), trip_id, category_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Creates category routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/trips/{trip_id}/categories",
            get(list_categories).post(create_category),
        )
        .route(
            "/trips/{trip_id}/categories/{category_id}",
            patch(update_category).delete(delete_category),
        )
}
