//! Swarm Errors
//!
//! Error taxonomy shared by the agent registry and the orchestrator.

use axum::http::StatusCode;
use thiserror::Error;

/// Errors surfaced by registry and orchestrator operations
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SwarmError {
    /// Malformed or missing request input, detected before any side effect
    #[error("{0}")]
    Validation(String),

    /// An agent with this id is already registered
    #[error("agent {0} already exists")]
    AlreadyExists(i64),

    /// No agent with this id is registered
    #[error("id {0} was not found")]
    NotFound(i64),

    /// Delete targeted an id that is not registered
    #[error("id {0} does not exist")]
    NoSuchAgent(i64),

    /// The orchestrator could not allocate a registry entry for a new agent
    #[error("cannot allocate agent: {0}")]
    Allocation(String),
}

impl SwarmError {
    /// HTTP status the REST surface reports for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            SwarmError::Validation(_) => StatusCode::BAD_REQUEST,
            SwarmError::AlreadyExists(_) => StatusCode::CONFLICT,
            SwarmError::NotFound(_) | SwarmError::NoSuchAgent(_) => StatusCode::NOT_FOUND,
            SwarmError::Allocation(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
