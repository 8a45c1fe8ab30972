//! Account endpoints for the signed-in user.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::get,
};
use splittrip_db::UpdateProfile;
use splittrip_db::views::{UserSummary, UserView};
use uuid::Uuid;

use crate::AppState;
use crate::error::ApiResult;
use crate::middleware::auth::AuthUser;

async fn me(State(state): State<AppState>, auth: AuthUser) -> ApiResult<Json<UserView>> {
    Ok(Json(state.users.me(auth.user_id()).await?))
}

async fn update_me(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(request): Json<UpdateProfile>,
) -> ApiResult<Json<UserView>> {
    Ok(Json(state.users.update_profile(auth.user_id(), request).await?))
}

async fn delete_me(State(state): State<AppState>, auth: AuthUser) -> ApiResult<StatusCode> {
    state.users.delete(auth.user_id()).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn get_user(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(user_id): Path<Uuid>,
) -> ApiResult<Json<UserSummary>> {
    Ok(Json(state.users.get(user_id).await?))
}

/// Creates user routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/users/me", get(me).patch(update_me).delete(delete_me))
        .route("/users/{user_id}", get(get_user))
}
