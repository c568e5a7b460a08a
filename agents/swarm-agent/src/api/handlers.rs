//! Agent endpoints

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use crate::agent::params::NewAgentParams;
use crate::agent::state::Agent;
use crate::agent::swarm::Swarm;
use crate::api::error::ApiError;

/// Create an agent and start its loop
pub async fn create_agent(
    State(swarm): State<Arc<Swarm>>,
    params: Result<Json<NewAgentParams>, JsonRejection>,
) -> Result<(StatusCode, Json<Agent>), ApiError> {
    let Json(params) = params?;
    let agent = swarm.create_agent(params)?;
    Ok((StatusCode::CREATED, Json(agent)))
}

/// List all agents
pub async fn list_agents(State(swarm): State<Arc<Swarm>>) -> Json<Vec<Agent>> {
    Json(swarm.list_agents())
}

/// Get one agent
pub async fn get_agent(
    State(swarm): State<Arc<Swarm>>,
    agent_id: Result<Path<i64>, PathRejection>,
) -> Result<Json<Agent>, ApiError> {
    let Path(agent_id) = agent_id?;
    Ok(Json(swarm.get_agent(agent_id)?))
}

/// Remove an agent's record
pub async fn delete_agent(
    State(swarm): State<Arc<Swarm>>,
    agent_id: Result<Path<i64>, PathRejection>,
) -> Result<StatusCode, ApiError> {
    let Path(agent_id) = agent_id?;
    swarm.delete_agent(agent_id)?;
    Ok(StatusCode::NO_CONTENT)
}

/// Terminate the process shortly after responding
pub async fn exit(State(swarm): State<Arc<Swarm>>) -> StatusCode {
    swarm.exit();
    StatusCode::NO_CONTENT
}

pub async fn health(State(swarm): State<Arc<Swarm>>) -> StatusCode {
    if swarm.health() {
        StatusCode::NO_CONTENT
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}
