//! Type-aware random placement of new agents.

use crate::config::Config;
use crate::model::{Agent, AgentType};
use crate::vec2::Vec2;
use rand::Rng;
use std::f64::consts::TAU;

/// Attempts before giving up on a non-overlapping position.
const MAX_ATTEMPTS: usize = 100;

/// Pick a position inside the arena for an agent of the given type.
///
/// The position must keep a distance of at least the sum of radii to every
/// agent placed so far. A lone configured zombie is seeded exactly at the
/// arena center; when several zombies are configured they are biased toward
/// the inner third of the arena. If the retry budget runs out the position is
/// returned unchecked (overlap allowed) rather than failing the realization.
pub fn initial_position<R: Rng>(
    cfg: &Config,
    agents: &[Agent],
    kind: AgentType,
    rng: &mut R,
) -> Vec2 {
    let zombie = kind == AgentType::Zombie;

    if zombie && cfg.population.initial_zombies == 1 {
        return Vec2::ZERO;
    }

    for _ in 0..MAX_ATTEMPTS {
        let position = if zombie {
            inner_position(cfg, rng)
        } else {
            annulus_position(cfg, rng)
        };

        let valid = agents.iter().all(|agent| {
            position.distance_to(agent.position) >= agent.radius + cfg.body.max_radius
        });
        if valid {
            return position;
        }
    }

    // Defined degradation: place unchecked instead of failing.
    annulus_position(cfg, rng)
}

/// Uniform angle, radial coordinate in `[1, arena_radius]`.
fn annulus_position<R: Rng>(cfg: &Config, rng: &mut R) -> Vec2 {
    let angle = rng.random_range(0.0..TAU);
    let radius = 1.0 + rng.random::<f64>() * (cfg.arena.radius - 1.0);
    Vec2::from_angle(angle) * radius
}

/// Uniform angle, radial coordinate in the inner third of the arena.
fn inner_position<R: Rng>(cfg: &Config, rng: &mut R) -> Vec2 {
    let angle = rng.random_range(0.0..TAU);
    let radius = rng.random::<f64>() * (cfg.arena.radius / 3.0);
    Vec2::from_angle(angle) * radius
}
