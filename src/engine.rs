use crate::config::Config;
use crate::model::{Agent, AgentType, ContactState, FinishState, Snapshot, average_velocity};
use crate::spawn;
use crate::vec2::{EPS, Vec2};
use anyhow::{Context, Result};
use rand::prelude::*;
use rand_chacha::ChaCha12Rng;
use rand_distr::Bernoulli;
use std::f64::consts::{PI, TAU};

/// Half-width 1.5 degrees of uniform angular noise applied to a human's
/// desired direction.
const DIRECTION_NOISE: f64 = 3.0 * PI / 180.0;

/// Simulation engine for a single realization.
///
/// Holds its own configuration copy, the population, the clock and the random
/// number generator; nothing is shared with other realizations. Time advances
/// in fixed steps and every step is a sequence of whole-population passes, so
/// each pass reads a consistent population state (simultaneous-update
/// semantics rather than sequential leak-through).
pub struct Engine {
    cfg: Config,
    probability_infection: f64,
    infection: Bernoulli,
    agents: Vec<Agent>,
    current_time: f64,
    snapshots: Vec<Snapshot>,
    rng: ChaCha12Rng,
}

impl Engine {
    /// Create a new `Engine` with a freshly placed population: the configured
    /// zombies first, then the humans, with identities assigned sequentially
    /// from zero.
    pub fn new(cfg: Config, probability_infection: f64, mut rng: ChaCha12Rng) -> Result<Self> {
        cfg.validate().context("failed to validate config")?;
        let infection = Bernoulli::new(probability_infection)
            .context("invalid infection probability")?;

        let total = cfg.population.initial_zombies + cfg.population.initial_humans;
        let mut agents: Vec<Agent> = Vec::with_capacity(total);
        for id in 0..total {
            let kind = if id < cfg.population.initial_zombies {
                AgentType::Zombie
            } else {
                AgentType::Human
            };
            let position = spawn::initial_position(&cfg, &agents, kind, &mut rng);
            agents.push(Agent::new(id, kind, position, &cfg));
        }

        Ok(Self {
            cfg,
            probability_infection,
            infection,
            agents,
            current_time: 0.0,
            snapshots: Vec::new(),
            rng,
        })
    }

    /// Create an `Engine` over a caller-provided population.
    ///
    /// Identities must be unique; positions are taken as given.
    pub fn with_population(
        cfg: Config,
        probability_infection: f64,
        agents: Vec<Agent>,
        rng: ChaCha12Rng,
    ) -> Result<Self> {
        cfg.validate().context("failed to validate config")?;
        let infection = Bernoulli::new(probability_infection)
            .context("invalid infection probability")?;
        Ok(Self {
            cfg,
            probability_infection,
            infection,
            agents,
            current_time: 0.0,
            snapshots: Vec::new(),
            rng,
        })
    }

    /// Run the realization to termination.
    ///
    /// Stops when the time budget is exhausted or either population is
    /// extinct; both conditions sit in the loop condition, so a realization
    /// that starts with an extinct population finishes at time zero.
    pub fn run(&mut self) -> FinishState {
        while self.current_time < self.cfg.run.simulation_time
            && self.num_humans() > 0
            && self.num_zombies() > 0
        {
            self.step();
        }

        FinishState {
            time: self.current_time,
            num_zombies: self.num_zombies(),
            num_humans: self.num_humans(),
            average_velocity: average_velocity(&self.agents),
        }
    }

    /// Advance the simulation by one time step.
    ///
    /// Pass order matters: this tick's integration uses last tick's desired
    /// directions, and contacts are recomputed only after the whole population
    /// has moved.
    pub fn step(&mut self) {
        let dt = self.cfg.run.time_step;
        let now = self.current_time;

        self.resolve_infections(now);
        self.integrate_positions(dt, now);
        self.update_contacts(dt, now);
        self.update_desired_directions(now);

        if self.cfg.output.save_snapshots {
            self.snapshots.push(Snapshot::new(now, &self.agents));
        }

        self.current_time = now + dt;
    }

    /// Resolve every infection contact whose `contact_duration` has elapsed.
    ///
    /// One coin flip decides the outcome for the pair: both agents become
    /// zombies, or both become humans. A missing or non-reciprocal peer is
    /// treated as already resolved.
    fn resolve_infections(&mut self, now: f64) {
        let duration = self.cfg.infection.contact_duration;
        let due: Vec<usize> = self
            .agents
            .iter()
            .enumerate()
            .filter(|(_, agent)| {
                agent
                    .contact
                    .as_ref()
                    .is_some_and(|contact| now - contact.start_time >= duration)
            })
            .map(|(idx, _)| idx)
            .collect();

        for idx in due {
            // The pair may already have been resolved from the other side.
            let Some(contact) = self.agents[idx].contact.clone() else {
                continue;
            };

            let reciprocal = self
                .agents
                .get(contact.peer)
                .is_some_and(|peer| {
                    peer.contact
                        .as_ref()
                        .is_some_and(|back| back.peer == idx)
                });
            if !reciprocal {
                self.agents[idx].contact = None;
                continue;
            }

            let kind = if self.infection.sample(&mut self.rng) {
                AgentType::Zombie
            } else {
                AgentType::Human
            };
            for member in [idx, contact.peer] {
                let speed = kind.speed(&self.cfg);
                let agent = &mut self.agents[member];
                agent.kind = kind;
                agent.speed = speed;
                agent.contact = None;
            }
        }
    }

    /// Compute every agent's velocity from the pre-move population state,
    /// then integrate all positions with boundary reflection.
    fn integrate_positions(&mut self, dt: f64, now: f64) {
        let mut velocities = Vec::with_capacity(self.agents.len());
        for idx in 0..self.agents.len() {
            velocities.push(self.cpm_velocity(idx, now));
        }

        let arena_radius = self.cfg.arena.radius;
        for (agent, velocity) in self.agents.iter_mut().zip(velocities) {
            agent.velocity = velocity;

            let mut next = agent.position + agent.velocity * dt;
            if next.magnitude() > arena_radius - agent.radius {
                let normal = next.normalize();
                next = normal * (arena_radius - agent.radius);
                agent.velocity = agent.velocity.reflect(normal);
            }
            agent.position = next;
        }
    }

    /// CPM velocity rule for one agent.
    ///
    /// Frozen agents do not move. A contact-free agent moves along its desired
    /// direction at a speed scaled by its normalized radius; an agent with
    /// active contacts flees them at full speed.
    fn cpm_velocity(&mut self, idx: usize, now: f64) -> Vec2 {
        if self.agents[idx].is_frozen(now, self.cfg.infection.contact_duration) {
            return Vec2::ZERO;
        }

        if self.agents[idx].contacts.is_empty() {
            // An agent without a heading yet picks a uniform random one.
            if self.agents[idx].desired_direction.magnitude() < EPS {
                let angle = self.rng.random_range(0.0..TAU);
                self.agents[idx].desired_direction = Vec2::from_angle(angle);
            }

            let body = &self.cfg.body;
            let agent = &self.agents[idx];
            let normalized_radius = ((agent.radius - body.min_radius)
                / (body.max_radius - body.min_radius))
                .clamp(0.0, 1.0);
            let desired_speed = agent.speed * normalized_radius.powf(body.cpm_beta);
            agent.desired_direction.normalize() * desired_speed
        } else {
            let agent = &self.agents[idx];
            let mut escape = Vec2::ZERO;
            for &other in &agent.contacts {
                let diff = agent.position - self.agents[other].position;
                let distance = diff.magnitude().max(EPS);
                escape += diff / distance;
            }

            if escape.magnitude() < EPS {
                // Symmetrically surrounded: nowhere to flee.
                Vec2::ZERO
            } else {
                escape.normalize() * agent.speed
            }
        }
    }

    /// Pairwise overlap scan over the whole population.
    ///
    /// Overlapping pairs are recorded symmetrically and both disks contract to
    /// `min_radius` at once. A differing-type pair where neither side is
    /// already engaged starts an infection contact. Agents that end the scan
    /// contact-free drop their contact state and relax exponentially back
    /// toward `max_radius`.
    fn update_contacts(&mut self, dt: f64, now: f64) {
        for agent in &mut self.agents {
            agent.contacts.clear();
        }

        // Decide all pairs against the same pre-contraction radii.
        let mut touching: Vec<(usize, usize)> = Vec::new();
        for i in 0..self.agents.len() {
            for j in (i + 1)..self.agents.len() {
                let distance = self.agents[i]
                    .position
                    .distance_to(self.agents[j].position)
                    .max(EPS);
                if distance < self.agents[i].radius + self.agents[j].radius {
                    touching.push((i, j));
                }
            }
        }

        let min_radius = self.cfg.body.min_radius;
        for (i, j) in touching {
            self.agents[i].contacts.push(j);
            self.agents[j].contacts.push(i);
            self.agents[i].radius = min_radius;
            self.agents[j].radius = min_radius;

            if self.agents[i].kind != self.agents[j].kind
                && self.agents[i].contact.is_none()
                && self.agents[j].contact.is_none()
            {
                self.agents[i].contact = Some(ContactState {
                    peer: j,
                    start_time: now,
                });
                self.agents[j].contact = Some(ContactState {
                    peer: i,
                    start_time: now,
                });
            }
        }

        let max_radius = self.cfg.body.max_radius;
        let relaxation = dt / self.cfg.body.relaxation_time;
        for agent in &mut self.agents {
            if agent.contacts.is_empty() {
                agent.contact = None;
                agent.radius += (max_radius - agent.radius) * relaxation;
                agent.radius = agent.radius.min(max_radius);
            }
        }
    }

    /// Recompute desired directions for every agent not frozen by infection.
    fn update_desired_directions(&mut self, now: f64) {
        let duration = self.cfg.infection.contact_duration;
        let mut updates: Vec<(usize, Vec2)> = Vec::with_capacity(self.agents.len());

        for idx in 0..self.agents.len() {
            if self.agents[idx].is_frozen(now, duration) {
                continue;
            }
            let direction = match self.agents[idx].kind {
                AgentType::Human => Some(self.human_direction(idx)),
                AgentType::Zombie => self.zombie_direction(idx),
            };
            if let Some(direction) = direction {
                updates.push((idx, direction));
            }
        }

        for (idx, direction) in updates {
            self.agents[idx].desired_direction = direction;
        }
    }

    /// Social-force heading for a human: distance-decayed repulsion away from
    /// the nearest zombies and humans, repulsion from the wall, and a small
    /// uniform angular perturbation.
    fn human_direction(&mut self, idx: usize) -> Vec2 {
        let agent = &self.agents[idx];

        let mut humans: Vec<(usize, f64)> = Vec::new();
        let mut zombies: Vec<(usize, f64)> = Vec::new();
        for (other_idx, other) in self.agents.iter().enumerate() {
            if other_idx == idx {
                continue;
            }
            let distance = agent.position.distance_to(other.position);
            if distance < EPS {
                continue;
            }
            match other.kind {
                AgentType::Human => humans.push((other_idx, distance)),
                AgentType::Zombie => zombies.push((other_idx, distance)),
            }
        }

        // Stable ascending sort: population order breaks distance ties.
        humans.sort_by(|a, b| a.1.total_cmp(&b.1));
        zombies.sort_by(|a, b| a.1.total_cmp(&b.1));
        humans.truncate(self.cfg.avoidance.n_humans);
        zombies.truncate(self.cfg.avoidance.n_zombies);

        let avoidance = &self.cfg.avoidance;
        let mut total = Vec2::ZERO;
        for &(other_idx, distance) in &humans {
            let direction = (agent.position - self.agents[other_idx].position).normalize();
            total += direction * (avoidance.a_human * (-distance / avoidance.b_human).exp());
        }
        for &(other_idx, distance) in &zombies {
            let direction = (agent.position - self.agents[other_idx].position).normalize();
            total += direction * (avoidance.a_zombie * (-distance / avoidance.b_zombie).exp());
        }

        let away_from_wall = self.wall_offset(agent.position);
        total += away_from_wall.normalize()
            * (avoidance.a_wall * (-away_from_wall.magnitude() / avoidance.b_wall).exp());

        let noise = (self.rng.random::<f64>() - 0.5) * DIRECTION_NOISE;
        total.rotate(noise).normalize()
    }

    /// Pursuit heading for a zombie: straight toward the nearest human that is
    /// not engaged in a contact. With no eligible human the zombie stops
    /// (zero heading); standing exactly on the target leaves the heading
    /// unchanged.
    fn zombie_direction(&self, idx: usize) -> Option<Vec2> {
        let agent = &self.agents[idx];

        let mut nearest: Option<(usize, f64)> = None;
        for (other_idx, other) in self.agents.iter().enumerate() {
            if other.kind != AgentType::Human || other.contact.is_some() {
                continue;
            }
            let distance = agent.position.distance_to(other.position);
            if nearest.is_none_or(|(_, best)| distance < best) {
                nearest = Some((other_idx, distance));
            }
        }

        match nearest {
            Some((target, _)) => {
                let pursuit = self.agents[target].position - agent.position;
                if pursuit.magnitude() > EPS {
                    Some(pursuit.normalize())
                } else {
                    None
                }
            }
            None => Some(Vec2::ZERO),
        }
    }

    /// Vector from the nearest wall point to the given position; its
    /// magnitude is the distance to the wall. Zero at the arena center.
    fn wall_offset(&self, position: Vec2) -> Vec2 {
        if position.magnitude() < EPS {
            return Vec2::ZERO;
        }
        let closest_on_wall = position.normalize() * self.cfg.arena.radius;
        position - closest_on_wall
    }

    pub fn cfg(&self) -> &Config {
        &self.cfg
    }

    pub fn probability_infection(&self) -> f64 {
        self.probability_infection
    }

    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    pub fn current_time(&self) -> f64 {
        self.current_time
    }

    pub fn snapshots(&self) -> &[Snapshot] {
        &self.snapshots
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
}
