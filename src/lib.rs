pub mod auth;
pub mod db;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod state;
pub mod utils;

use axum::{
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;

pub use auth::AuthService;
pub use db::{Database, InMemoryUserStore, UserStore};
pub use state::AppState;
pub use utils::{ApiError, ApiResult, Config};

/// Build the application router with every route mounted under the
/// configured prefix.
pub fn create_app(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/health", get(handlers::health))
        .route("/signup", post(handlers::auth::signup))
        .route("/login", post(handlers::auth::login));

    let protected_routes = Router::new()
        .route("/me", get(handlers::auth::me))
        .route_layer(from_fn_with_state(state.clone(), auth::auth_middleware));

    let routes = public_routes.merge(protected_routes);

    // axum refuses to nest at the root
    let prefix = state.config.server.api_prefix.as_str();
    let router = if prefix.is_empty() {
        Router::new().merge(routes)
    } else {
        Router::new().nest(prefix, routes)
    };

    router
        .layer(
            ServiceBuilder::new()
                .layer(middleware::request_id_layer())
                .layer(middleware::trace_layer())
                .layer(middleware::propagate_request_id_layer())
                .layer(middleware::cors_layer(&state.config.server))
                .layer(middleware::catch_panic_layer()),
        )
        .with_state(state)
}
