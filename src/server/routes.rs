use axum::{Router, routing::get};

use super::handlers;
use super::state::AppState;

pub fn create_routes(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/trunkports", get(handlers::get_trunk_ports))
        .route("/staticvlans", get(handlers::get_static_vlans))
        .with_state(state)
}
