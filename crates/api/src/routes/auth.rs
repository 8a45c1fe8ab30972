//! Registration, activation and login.

use axum::{Json, Router, extract::State, http::StatusCode, routing::post};
use splittrip_db::views::UserView;
use splittrip_shared::auth::{AccessToken, ActivateRequest, LoginRequest, RegisterRequest};

use crate::AppState;
use crate::error::{ApiResult, WithWarning};

/// Creates an inactive account and mails its activation link.
///
/// Answers 201 even when the mail could not be sent; the body then carries
/// a `warning`.
async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<WithWarning<UserView>>)> {
    let outcome = state.users.register(request).await?;
    Ok((StatusCode::CREATED, Json(outcome.into())))
}

async fn activate(
    State(state): State<AppState>,
    Json(request): Json<ActivateRequest>,
) -> ApiResult<Json<UserView>> {
    Ok(Json(state.users.activate(request).await?))
}

async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> ApiResult<Json<AccessToken>> {
    Ok(Json(state.users.login(request).await?))
}

/// Creates public authentication routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/activate", post(activate))
        .route("/auth/login", post(login))
}
