//! Transaction lifecycle endpoints.
//!
//! Creating and deleting a transaction move the trip's debt balances in the
//! same database transaction; confirming does not touch them.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
};
use splittrip_db::CreateTransaction;
use splittrip_db::views::TransactionView;
use uuid::Uuid;

use crate::AppState;
use crate::error::ApiResult;
use crate::middleware::auth::AuthUser;

async fn list_transactions(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(trip_id): Path<Uuid>,
) -> ApiResult<Json<Vec<TransactionView>>> {
    Ok(Json(
        state
            .transactions
            .list_for_trip(auth.user_id(), trip_id)
            .await?,
    ))
}

async fn create_transaction(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(trip_id): Path<Uuid>,
    Json(request): Json<CreateTransaction>,
) -> ApiResult<(StatusCode, Json<TransactionView>)> {
    let transaction = state
        .transactions
        .create(auth.user_id(), trip_id, request)
        .await?;
    Ok((StatusCode::CREATED, Json(transaction)))
}

async fn get_transaction(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(transaction_id): Path<Uuid>,
) -> ApiResult<Json<TransactionView>> {
    Ok(Json(
        state
            .transactions
            .get(auth.user_id(), transaction_id)
            .await?,
    ))
}

async fn confirm_transaction(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(transaction_id): Path<Uuid>,
) -> ApiResult<Json<TransactionView>> {
    Ok(Json(
        state
            .transactions
            .confirm(auth.user_id(), transaction_id)
            .await?,
    ))
}

async fn delete_transaction(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(transaction_id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    state
        .transactions
        .delete(auth.user_id(), transaction_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Creates transaction routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/trips/{trip_id}/transactions",
            get(list_transactions).post(create_transaction),
        )
        .route(
            "/transactions/{transaction_id}",
            get(get_transaction).delete(delete_transaction),
        )
        .route(
            "/transactions/{transaction_id}/confirm",
            post(confirm_transaction),
        )
}
