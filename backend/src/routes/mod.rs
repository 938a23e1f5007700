//! Route definitions for the BASP marketplace API

use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};

use crate::{
    handlers,
    middleware::{auth_middleware, optional_auth_middleware},
    AppState,
};

/// Create API routes
pub fn api_routes(state: AppState) -> Router<AppState> {
    Router::new()
        // Health check (public)
        .route("/health", get(handlers::health_check))
        // Auth routes (public)
        .nest("/auth", auth_routes())
        .nest("/services", service_routes(state.clone()))
        .nest("/businesses", business_routes(state.clone()))
        .nest("/communications", communication_routes(state.clone()))
        .nest("/reviews", review_routes(state.clone()))
        .nest("/promotions", promotion_routes(state.clone()))
        .nest("/users", user_routes(state))
}

/// Authentication routes (public)
fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(handlers::register))
        .route("/login", post(handlers::login))
        .route("/refresh", post(handlers::refresh))
}

/// Service category routes; reads are public, writes require a token
fn service_routes(state: AppState) -> Router<AppState> {
    let public = Router::new().route("/", get(handlers::list_services));

    let protected = Router::new()
        .route("/", post(handlers::create_service))
        .route(
            "/:service_id",
            put(handlers::update_service).delete(handlers::delete_service),
        )
        .route_layer(middleware::from_fn_with_state(state, auth_middleware));

    public.merge(protected)
}

/// Business routes; discovery and detail are public
fn business_routes(state: AppState) -> Router<AppState> {
    let public = Router::new()
        .route("/", get(handlers::discover_businesses))
        .route("/bests", get(handlers::get_best_businesses))
        .route("/:business_id", get(handlers::get_business));

    let protected = Router::new()
        .route("/", post(handlers::create_business))
        .route("/star", get(handlers::get_total_star))
        .route(
            "/:business_id",
            put(handlers::update_business).delete(handlers::delete_business),
        )
        .route(
            "/:business_id/subscription",
            put(handlers::set_business_subscription),
        )
        .route_layer(middleware::from_fn_with_state(state, auth_middleware));

    public.merge(protected)
}

/// Communication routes; creating one works with or without a token
fn communication_routes(state: AppState) -> Router<AppState> {
    let optional = Router::new()
        .route("/", post(handlers::create_communication))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            optional_auth_middleware,
        ));

    let protected = Router::new()
        .route("/", get(handlers::list_communications))
        .route(
            "/:communication_id",
            get(handlers::get_communication).post(handlers::request_review),
        )
        .route_layer(middleware::from_fn_with_state(state, auth_middleware));

    optional.merge(protected)
}

/// Review routes; a business's reviews are public
fn review_routes(state: AppState) -> Router<AppState> {
    let public = Router::new().route("/", get(handlers::list_business_reviews));

    let protected = Router::new()
        .route("/", post(handlers::create_review))
        .route("/all", get(handlers::list_all_reviews))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware));

    public.merge(protected)
}

/// Promotion routes; a business's current promotion is public
fn promotion_routes(state: AppState) -> Router<AppState> {
    let public = Router::new().route("/", get(handlers::get_business_promotion));

    let protected = Router::new()
        .route("/", post(handlers::create_promotion))
        .route("/all", get(handlers::list_unverified_promotions))
        .route("/:promotion_id", delete(handlers::delete_promotion))
        .route("/:promotion_id/approve", post(handlers::approve_promotion))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware));

    public.merge(protected)
}

/// Account administration; every route requires an administrator token
fn user_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_users))
        .route("/totals", get(handlers::get_user_totals))
        .route("/:user_id", delete(handlers::block_user))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}
