//! API route definitions.

use axum::{Router, middleware};

use crate::{AppState, middleware::auth::auth_middleware};

pub mod auth;
pub mod categories;
pub mod costs;
pub mod debts;
pub mod health;
pub mod participants;
pub mod transactions;
pub mod trips;
pub mod users;

/// Creates the API router; everything outside health and auth needs a bearer token.
#[allow(clippy::needless_pass_by_value)]
pub fn api_routes_with_state(state: AppState) -> Router<AppState> {
    let protected_routes = Router::new()
        .merge(users::routes())
        .merge(trips::routes())
        .merge(participants::routes())
        .merge(categories::routes())
        .merge(costs::routes())
        .merge(transactions::routes())
        .merge(debts::routes())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .merge(health::routes())
        .merge(auth::routes())
        .merge(protected_routes)
}
