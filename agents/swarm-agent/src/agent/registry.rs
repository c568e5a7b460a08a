//! Agent Registry
//!
//! Concurrent id -> agent map shared by the REST handlers and the loop
//! supervisors.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;

use crate::agent::state::Agent;
use crate::error::SwarmError;

#[derive(Clone, Default)]
pub struct AgentRegistry {
    agents: Arc<DashMap<i64, Agent>>,
}

impl AgentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a new running agent
    ///
    /// Fails without touching the existing record when the id is taken.
    pub fn create(&self, id: i64) -> Result<Agent, SwarmError> {
        match self.agents.entry(id) {
            Entry::Occupied(_) => Err(SwarmError::AlreadyExists(id)),
            Entry::Vacant(slot) => {
                let agent = Agent::new(id);
                slot.insert(agent.clone());
                Ok(agent)
            }
        }
    }

    pub fn get(&self, id: i64) -> Option<Agent> {
        self.agents.get(&id).map(|entry| entry.value().clone())
    }

    /// Snapshot of all agents, ordered by id
    pub fn list(&self) -> Vec<Agent> {
        let mut agents: Vec<Agent> = self
            .agents
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        agents.sort_by_key(|agent| agent.id);
        agents
    }

    pub fn delete(&self, id: i64) -> Result<(), SwarmError> {
        self.agents
            .remove(&id)
            .map(|_| ())
            .ok_or(SwarmError::NoSuchAgent(id))
    }

    /// Flip an agent to TERMINATED
    ///
    /// Returns true only for the call that performed the transition. A
    /// deleted agent is left deleted.
    pub fn mark_terminated(&self, id: i64) -> bool {
        self.agents
            .get_mut(&id)
            .map(|mut entry| entry.terminate())
            .unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::state::AgentStatus;

    #[test]
    fn test_create_and_get() {
        let registry = AgentRegistry::new();
        let agent = registry.create(1).unwrap();
        assert_eq!(agent.status, AgentStatus::Running);
        assert_eq!(registry.get(1), Some(agent));
        assert!(registry.get(2).is_none());
    }

    #[test]
    fn test_duplicate_create_keeps_original() {
        let registry = AgentRegistry::new();
        let original = registry.create(1).unwrap();
        assert_eq!(registry.create(1), Err(SwarmError::AlreadyExists(1)));
        assert_eq!(registry.get(1), Some(original));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_list_is_empty_vec_when_no_agents() {
        let registry = AgentRegistry::new();
        assert!(registry.list().is_empty());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_list_snapshot() {
        let registry = AgentRegistry::new();
        registry.create(2).unwrap();
        registry.create(1).unwrap();
        let ids: Vec<i64> = registry.list().iter().map(|a| a.id).collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn test_delete() {
        let registry = AgentRegistry::new();
        registry.create(1).unwrap();
        assert!(registry.delete(1).is_ok());
        assert_eq!(registry.delete(1), Err(SwarmError::NoSuchAgent(1)));
        assert_eq!(
            registry.delete(1).unwrap_err().to_string(),
            "id 1 does not exist"
        );
    }

    #[test]
    fn test_mark_terminated_is_idempotent() {
        let registry = AgentRegistry::new();
        registry.create(1).unwrap();
        assert!(registry.mark_terminated(1));
        let first = registry.get(1).unwrap().terminated_at;
        assert!(!registry.mark_terminated(1));
        assert_eq!(registry.get(1).unwrap().terminated_at, first);
        assert!(!registry.mark_terminated(42));
    }

    #[test]
    fn test_concurrent_creates_one_winner() {
        let registry = AgentRegistry::new();
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let registry = registry.clone();
                std::thread::spawn(move || registry.create(5).is_ok())
            })
            .collect();
        let winners = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|won| *won)
            .count();
        assert_eq!(winners, 1);
    }
}
