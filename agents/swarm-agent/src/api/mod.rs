//! REST API
//!
//! The swarm's HTTP surface under `/api/swarm`.

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use crate::agent::swarm::Swarm;

pub mod error;
pub mod handlers;

pub const API_PREFIX: &str = "/api/swarm";

/// Build the API router
pub fn router(swarm: Arc<Swarm>) -> Router {
    let api = Router::new()
        .route(
            "/agents",
            post(handlers::create_agent).get(handlers::list_agents),
        )
        .route(
            "/agents/:agent_id",
            get(handlers::get_agent).delete(handlers::delete_agent),
        )
        .route("/exit", post(handlers::exit))
        .route("/health", get(handlers::health));

    Router::new().nest(API_PREFIX, api).with_state(swarm)
}
