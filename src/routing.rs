//! Application router configuration.

use axum::{
    Router, middleware,
    routing::{get, post, put},
};
use tower_http::cors::CorsLayer;

use crate::{
    AppState,
    account::{post_log_in, post_register},
    dashboard::get_dashboard,
    endpoints,
    logging::logging_middleware,
    transaction::{delete_transaction, get_transactions, post_transaction, put_transaction},
};

/// Return a router with all the app's routes.
///
/// CORS is left wide open because the static frontend is served from a
/// different origin.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route(endpoints::REGISTER, post(post_register))
        .route(endpoints::LOG_IN, post(post_log_in))
        .route(
            endpoints::TRANSACTIONS,
            get(get_transactions).post(post_transaction),
        )
        .route(
            endpoints::TRANSACTION,
            put(put_transaction).delete(delete_transaction),
        )
        .route(endpoints::DASHBOARD, get(get_dashboard))
        .layer(middleware::from_fn(logging_middleware))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
