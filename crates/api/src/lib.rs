//! HTTP API layer with Axum routes and middleware.
//!
//! This crate provides:
//! - REST API routes under `/api/v1`
//! - Bearer-token authentication middleware
//! - `AppError` to HTTP status mapping
//!
//! Handlers stay thin: they extract the acting user and the payload and hand
//! both to a service from `splittrip-db`.

pub mod error;
pub mod middleware;
pub mod routes;

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use splittrip_db::{
    CostService, DebtLedger, LedgerStore, Mailer, TransactionLifecycle, TripService,
    TripViewService, UserService,
};
use splittrip_shared::AppConfig;
use splittrip_shared::email::Notifier;
use splittrip_shared::jwt::JwtService;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Ledger store handle, for health checks.
    pub store: LedgerStore,
    /// JWT service for token operations.
    pub jwt_service: Arc<JwtService>,
    /// Accounts.
    pub users: UserService,
    /// Trips and participants.
    pub trips: TripService,
    /// Categories and costs.
    pub costs: CostService,
    /// Transaction lifecycle.
    pub transactions: TransactionLifecycle,
    /// Debt ledger queries.
    pub ledger: DebtLedger,
    /// Trip page aggregate.
    pub trip_views: TripViewService,
}

impl AppState {
    /// Wires every service on one store.
    #[must_use]
    pub fn new(
        store: LedgerStore,
        jwt_service: JwtService,
        notifier: Arc<dyn Notifier>,
        config: &AppConfig,
    ) -> Self {
        let mailer = Mailer::new(notifier, &config.email);
        Self {
            users: UserService::new(
                store.clone(),
                jwt_service.clone(),
                mailer.clone(),
                &config.activation,
            ),
            trips: TripService::new(store.clone(), mailer),
            costs: CostService::new(&store),
            transactions: TransactionLifecycle::new(store.clone()),
            ledger: DebtLedger::new(&store),
            trip_views: TripViewService::new(&store),
            jwt_service: Arc::new(jwt_service),
            store,
        }
    }
}

/// Creates the main application router.
///
/// A request that outlives `request_timeout` is dropped, which rolls back
/// any database transaction it still holds.
pub fn create_router(state: AppState, request_timeout: Duration) -> Router {
    Router::new()
        .nest("/api/v1", routes::api_routes_with_state(state.clone()))
        .layer(TimeoutLayer::new(request_timeout))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
