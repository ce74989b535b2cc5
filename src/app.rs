use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::routes::{auth, chat, health, threads};
use crate::state::AppState;

pub fn create_app(state: AppState) -> Router {
    // Routes keep their trailing slash, so each resource router spells its own
    // segment and only the shared prefix is nested.
    let api = Router::<AppState>::new()
        .merge(health::router())
        .merge(auth::router())
        .merge(chat::router())
        .merge(threads::router());

    Router::<AppState>::new()
        .nest("/api", api)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
