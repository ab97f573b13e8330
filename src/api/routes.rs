use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use super::handlers;
use super::middleware::require_user;
use crate::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    // User routes -- act on behalf of the X-User-Id caller
    let user_routes = Router::new()
        .route(
            "/checking-accounts",
            post(handlers::create_checking_account).get(handlers::list_checking_accounts),
        )
        .route(
            "/checking-accounts/:id",
            get(handlers::get_checking_account)
                .put(handlers::update_checking_account)
                .delete(handlers::delete_checking_account),
        )
        .route(
            "/checking-accounts/:id/spendings",
            post(handlers::create_spending).get(handlers::list_spendings),
        )
        .route(
            "/checking-accounts/:id/periodicals",
            post(handlers::create_periodical).get(handlers::list_periodicals),
        )
        .route("/checking-accounts/:id/report", get(handlers::get_report))
        .route("/checking-accounts/:id/titles", get(handlers::search_titles))
        .route(
            "/spendings/:id",
            get(handlers::get_spending)
                .put(handlers::update_spending)
                .delete(handlers::delete_spending),
        )
        .route("/periodicals/:id", get(handlers::get_periodical))
        .route_layer(middleware::from_fn(require_user));

    // Internal routes -- operations and scheduling, no user context
    let internal_routes = Router::new()
        .route("/_internal/health", get(handlers::health))
        .route(
            "/_internal/monthly-spendings",
            post(handlers::create_monthly_spendings),
        );

    Router::new()
        .merge(user_routes)
        .merge(internal_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
