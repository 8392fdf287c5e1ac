use super::Agent;
use std::sync::Arc;
use tracing::debug;

/// Agents in registration order; the router breaks relevance ties by this order
#[derive(Default)]
pub struct AgentRegistry {
    agents: Vec<Arc<dyn Agent>>,
}

impl AgentRegistry {
    pub fn new() -> Self {
        Self { agents: Vec::new() }
    }

    /// Registers `agent`. An agent with the same id is replaced in place.
    pub fn register(&mut self, agent: Arc<dyn Agent>) {
        let id = agent.id().to_string();
        if let Some(slot) = self.agents.iter_mut().find(|a| a.id() == id) {
            debug!(agent = %id, "Replacing registered agent");
            *slot = agent;
        } else {
            debug!(agent = %id, "Registered agent");
            self.agents.push(agent);
        }
    }

    pub fn get(&self, id: &str) -> Option<Arc<dyn Agent>> {
        self.agents.iter().find(|a| a.id() == id).cloned()
    }

    pub fn agents(&self) -> &[Arc<dyn Agent>] {
        &self.agents
    }

    pub fn ids(&self) -> Vec<&str> {
        self.agents.iter().map(|a| a.id()).collect()
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }
}

impl std::fmt::Debug for AgentRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentRegistry")
            .field("agents", &self.ids())
            .finish()
    }
}
