//! Simulation data types.

use crate::config::Config;
use crate::vec2::Vec2;
use serde::{Deserialize, Serialize};

/// Kind of an agent. Flips when an infection contact resolves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AgentType {
    Human,
    Zombie,
}

impl AgentType {
    /// Configured speed for this agent type.
    pub fn speed(self, cfg: &Config) -> f64 {
        match self {
            AgentType::Human => cfg.population.human_speed,
            AgentType::Zombie => cfg.population.zombie_speed,
        }
    }
}

/// An unresolved differing-type contact pending infection resolution.
///
/// The peer is a population index, never a reference: both sides point at each
/// other from the tick the contact starts until it resolves.
#[derive(Debug, Clone, PartialEq)]
pub struct ContactState {
    pub peer: usize,
    pub start_time: f64,
}

/// Agent of the simulation.
///
/// Owns its kinematic state, personal-space radius and contact state. The
/// `contacts` set is transient: it is rebuilt from scratch by every tick's
/// pairwise scan and holds the indices of agents whose disks currently overlap
/// this one.
#[derive(Debug, Clone)]
pub struct Agent {
    pub id: usize,
    pub kind: AgentType,
    pub position: Vec2,
    pub velocity: Vec2,
    pub desired_direction: Vec2,
    pub speed: f64,
    pub radius: f64,
    pub contact: Option<ContactState>,
    pub contacts: Vec<usize>,
}

impl Agent {
    /// Create an agent at rest at the given position, with the speed and
    /// relaxed radius its type prescribes.
    pub fn new(id: usize, kind: AgentType, position: Vec2, cfg: &Config) -> Self {
        Self {
            id,
            kind,
            position,
            velocity: Vec2::ZERO,
            desired_direction: Vec2::ZERO,
            speed: kind.speed(cfg),
            radius: cfg.body.max_radius,
            contact: None,
            contacts: Vec::new(),
        }
    }

    /// An agent is frozen while its infection contact has not yet lasted
    /// `contact_duration`.
    pub fn is_frozen(&self, now: f64, contact_duration: f64) -> bool {
        self.contact
            .as_ref()
            .is_some_and(|contact| now - contact.start_time < contact_duration)
    }
}

/// Magnitude of the mean velocity vector over the population.
///
/// Deliberately not the mean of the speeds: two agents moving in opposite
/// directions average to zero.
pub fn average_velocity(agents: &[Agent]) -> f64 {
    if agents.is_empty() {
        return 0.0;
    }
    let mut total = Vec2::ZERO;
    for agent in agents {
        total += agent.velocity;
    }
    (total / agents.len() as f64).magnitude()
}

/// Immutable deep copy of the population at one simulated time.
#[derive(Debug, Clone)]
pub struct Snapshot {
    time: f64,
    agents: Vec<Agent>,
}

impl Snapshot {
    pub fn new(time: f64, agents: &[Agent]) -> Self {
        Self {
            time,
            agents: agents.to_vec(),
        }
    }

    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    pub fn num_zombies(&self) -> usize {
        self.agents
            .iter()
            .filter(|agent| agent.kind == AgentType::Zombie)
            .count()
    }

    pub fn num_humans(&self) -> usize {
        self.agents
            .iter()
            .filter(|agent| agent.kind == AgentType::Human)
            .count()
    }

    /// Fraction of the population that is a zombie (zero for an empty one).
    pub fn zombie_percentage(&self) -> f64 {
        if self.agents.is_empty() {
            return 0.0;
        }
        self.num_zombies() as f64 / self.agents.len() as f64
    }

    pub fn average_velocity(&self) -> f64 {
        average_velocity(&self.agents)
    }
}

/// Terminal summary of one realization.
#[derive(Debug, Clone, Serialize)]
pub struct FinishState {
    pub time: f64,
    pub num_zombies: usize,
    pub num_humans: usize,
    pub average_velocity: f64,
}
