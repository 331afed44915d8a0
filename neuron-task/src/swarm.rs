//! Swarm topology (spec component C8): how a fixed set of agents are wired
//! together, and what kinds of control transfer between them are legal.

use crate::error::TaskError;
use layer0::id::AgentId;
use std::collections::{HashSet, VecDeque};

/// What an [`Edge`] means for routing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EdgeKind {
    /// After `from` produces a final answer (no handoff/delegate action),
    /// `to` is invoked with that answer as its input. Forms a pipeline.
    Workflow,
    /// `from` may emit a handoff action naming `to`; control transfers and
    /// the caller does not resume (§4.7 tree call).
    Handoff,
    /// `from` (the team leader) may invoke `to` the way it would a tool;
    /// `to`'s output returns to `from`, which keeps running.
    Team,
}

/// A directed, typed connection between two agents in a [`Swarm`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Edge {
    /// The agent the edge originates from.
    pub from: AgentId,
    /// The agent the edge points to.
    pub to: AgentId,
    /// What kind of control transfer this edge permits.
    pub kind: EdgeKind,
}

impl Edge {
    /// Build an edge.
    pub fn new(from: AgentId, to: AgentId, kind: EdgeKind) -> Self {
        Self { from, to, kind }
    }
}

/// Which edge kind a [`Swarm`] is built from. Mixed-kind swarms aren't
/// supported — pick the topology that matches how the agents actually
/// collaborate (§4.7).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwarmBuildType {
    /// A linear (or branching, acyclic) pipeline of `Workflow` edges.
    Workflow,
    /// Peer agents that hand off control to each other via `Handoff` edges.
    Handoff,
    /// One leader agent invoking teammates as tools via `Team` edges.
    Team,
}

/// A fixed set of agents and the typed edges between them.
///
/// The [`crate::SwarmRunner`] never consults an agent registry of its
/// own — agent names are resolved through the `Orchestrator` it's given.
/// `Swarm` only declares which routes between those names are legal.
#[derive(Debug, Clone)]
pub struct Swarm {
    /// Agent(s) the task is dispatched to first. More than one root means
    /// they run concurrently on the same input and their text outputs are
    /// merged into a single downstream node.
    pub root_agents: Vec<AgentId>,
    /// The declared edges.
    pub edges: Vec<Edge>,
    /// Which edge kind this swarm is built from.
    pub build_type: SwarmBuildType,
    /// Upper bound on agent-loop steps across the whole task (§4.8).
    pub max_steps: u32,
    known: HashSet<AgentId>,
}

impl Swarm {
    /// Build and validate a swarm. See [`TaskError::InvalidTopology`] for
    /// the conditions that reject a topology.
    pub fn new(
        build_type: SwarmBuildType,
        root_agents: Vec<AgentId>,
        edges: Vec<Edge>,
        max_steps: u32,
    ) -> Result<Self, TaskError> {
        if root_agents.is_empty() {
            return Err(TaskError::InvalidTopology(
                "swarm must declare at least one root agent".into(),
            ));
        }

        let mut known: HashSet<AgentId> = root_agents.iter().cloned().collect();
        for edge in &edges {
            known.insert(edge.from.clone());
            known.insert(edge.to.clone());
            if edge.kind != edge_kind_for(build_type) {
                return Err(TaskError::InvalidTopology(format!(
                    "{:?} swarm cannot contain a {:?} edge ({} -> {})",
                    build_type, edge.kind, edge.from, edge.to
                )));
            }
        }

        let swarm = Self {
            root_agents,
            edges,
            build_type,
            max_steps: max_steps.max(1),
            known,
        };
        swarm.validate()?;
        Ok(swarm)
    }

    fn validate(&self) -> Result<(), TaskError> {
        match self.build_type {
            SwarmBuildType::Workflow => self.validate_workflow(),
            SwarmBuildType::Team => self.validate_team(),
            SwarmBuildType::Handoff => Ok(()), // cycles are legal; runtime endless-loop detection covers it
        }
    }

    fn validate_workflow(&self) -> Result<(), TaskError> {
        // A node may have at most one outgoing workflow edge (§4.7 "pipeline").
        let mut seen_from: HashSet<&AgentId> = HashSet::new();
        for edge in &self.edges {
            if !seen_from.insert(&edge.from) {
                return Err(TaskError::InvalidTopology(format!(
                    "agent {} has more than one outgoing workflow edge",
                    edge.from
                )));
            }
        }

        // BFS from each root; a workflow graph must be acyclic.
        for root in &self.root_agents {
            let mut visited: HashSet<&AgentId> = HashSet::new();
            let mut queue: VecDeque<&AgentId> = VecDeque::from([root]);
            while let Some(node) = queue.pop_front() {
                if !visited.insert(node) {
                    return Err(TaskError::InvalidTopology(format!(
                        "workflow swarm contains a cycle reachable from {node}"
                    )));
                }
                if let Some(next) = self.workflow_next(node) {
                    queue.push_back(next);
                }
            }
        }
        Ok(())
    }

    fn validate_team(&self) -> Result<(), TaskError> {
        if self.root_agents.len() != 1 {
            return Err(TaskError::InvalidTopology(
                "team swarm must declare exactly one leader as root_agents".into(),
            ));
        }
        let leader = &self.root_agents[0];
        for edge in &self.edges {
            if &edge.from != leader {
                return Err(TaskError::InvalidTopology(format!(
                    "team swarm edge {} -> {} does not originate from the leader {}",
                    edge.from, edge.to, leader
                )));
            }
        }
        Ok(())
    }

    /// Whether `id` is part of this swarm (a root agent or an edge endpoint).
    pub fn contains_agent(&self, id: &AgentId) -> bool {
        self.known.contains(id)
    }

    /// The next node in a `Workflow` swarm after `from`, if declared.
    pub fn workflow_next(&self, from: &AgentId) -> Option<&AgentId> {
        self.edges
            .iter()
            .find(|e| &e.from == from && e.kind == EdgeKind::Workflow)
            .map(|e| &e.to)
    }

    /// Whether a `Handoff` swarm permits `from` to hand off to `to`.
    pub fn allows_handoff(&self, from: &AgentId, to: &AgentId) -> bool {
        self.build_type == SwarmBuildType::Handoff
            && self
                .edges
                .iter()
                .any(|e| &e.from == from && &e.to == to && e.kind == EdgeKind::Handoff)
    }

    /// Whether a `Team` swarm permits the leader `from` to delegate to `to`.
    pub fn allows_delegate(&self, from: &AgentId, to: &AgentId) -> bool {
        self.build_type == SwarmBuildType::Team
            && self
                .edges
                .iter()
                .any(|e| &e.from == from && &e.to == to && e.kind == EdgeKind::Team)
    }
}

fn edge_kind_for(build_type: SwarmBuildType) -> EdgeKind {
    match build_type {
        SwarmBuildType::Workflow => EdgeKind::Workflow,
        SwarmBuildType::Handoff => EdgeKind::Handoff,
        SwarmBuildType::Team => EdgeKind::Team,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn agent(name: &str) -> AgentId {
        AgentId::new(name)
    }

    #[test]
    fn workflow_chain_validates_and_resolves_next() {
        let swarm = Swarm::new(
            SwarmBuildType::Workflow,
            vec![agent("a")],
            vec![
                Edge::new(agent("a"), agent("b"), EdgeKind::Workflow),
                Edge::new(agent("b"), agent("c"), EdgeKind::Workflow),
            ],
            10,
        )
        .unwrap();

        assert_eq!(swarm.workflow_next(&agent("a")), Some(&agent("b")));
        assert_eq!(swarm.workflow_next(&agent("c")), None);
    }

    #[test]
    fn workflow_cycle_is_rejected() {
        let err = Swarm::new(
            SwarmBuildType::Workflow,
            vec![agent("a")],
            vec![
                Edge::new(agent("a"), agent("b"), EdgeKind::Workflow),
                Edge::new(agent("b"), agent("a"), EdgeKind::Workflow),
            ],
            10,
        )
        .unwrap_err();
        assert!(matches!(err, TaskError::InvalidTopology(_)));
    }

    #[test]
    fn workflow_branching_from_one_agent_is_rejected() {
        let err = Swarm::new(
            SwarmBuildType::Workflow,
            vec![agent("a")],
            vec![
                Edge::new(agent("a"), agent("b"), EdgeKind::Workflow),
                Edge::new(agent("a"), agent("c"), EdgeKind::Workflow),
            ],
            10,
        )
        .unwrap_err();
        assert!(matches!(err, TaskError::InvalidTopology(_)));
    }

    #[test]
    fn handoff_swarm_allows_declared_edges_only() {
        let swarm = Swarm::new(
            SwarmBuildType::Handoff,
            vec![agent("a")],
            vec![Edge::new(agent("a"), agent("b"), EdgeKind::Handoff)],
            10,
        )
        .unwrap();
        assert!(swarm.allows_handoff(&agent("a"), &agent("b")));
        assert!(!swarm.allows_handoff(&agent("b"), &agent("a")));
    }

    #[test]
    fn handoff_cycles_are_legal_at_build_time() {
        let swarm = Swarm::new(
            SwarmBuildType::Handoff,
            vec![agent("a")],
            vec![
                Edge::new(agent("a"), agent("b"), EdgeKind::Handoff),
                Edge::new(agent("b"), agent("a"), EdgeKind::Handoff),
            ],
            10,
        );
        assert!(swarm.is_ok());
    }

    #[test]
    fn team_swarm_requires_single_leader() {
        let err = Swarm::new(
            SwarmBuildType::Team,
            vec![agent("lead1"), agent("lead2")],
            vec![],
            10,
        )
        .unwrap_err();
        assert!(matches!(err, TaskError::InvalidTopology(_)));
    }

    #[test]
    fn team_swarm_rejects_teammate_to_teammate_edges() {
        let err = Swarm::new(
            SwarmBuildType::Team,
            vec![agent("lead")],
            vec![Edge::new(agent("m1"), agent("m2"), EdgeKind::Team)],
            10,
        )
        .unwrap_err();
        assert!(matches!(err, TaskError::InvalidTopology(_)));
    }

    #[test]
    fn mismatched_edge_kind_is_rejected() {
        let err = Swarm::new(
            SwarmBuildType::Workflow,
            vec![agent("a")],
            vec![Edge::new(agent("a"), agent("b"), EdgeKind::Handoff)],
            10,
        )
        .unwrap_err();
        assert!(matches!(err, TaskError::InvalidTopology(_)));
    }
}
