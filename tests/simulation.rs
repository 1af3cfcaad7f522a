use outbreak::config::{Arena, Avoidance, Body, Config, Infection, Output, Population, Run};
use outbreak::engine::Engine;
use outbreak::model::{Agent, AgentType, average_velocity};
use outbreak::vec2::Vec2;
use rand::SeedableRng;
use rand_chacha::ChaCha12Rng;

fn base_config() -> Config {
    Config {
        arena: Arena { radius: 10.0 },
        population: Population {
            initial_humans: 10,
            initial_zombies: 2,
            human_speed: 4.0,
            zombie_speed: 3.0,
        },
        body: Body {
            min_radius: 0.15,
            max_radius: 0.35,
            relaxation_time: 0.5,
            cpm_beta: 0.9,
        },
        infection: Infection {
            contact_duration: 7.0,
            probabilities: vec![0.5],
        },
        avoidance: Avoidance {
            a_human: 30.0,
            b_human: 1.0,
            a_zombie: 500.0,
            b_zombie: 2.0,
            a_wall: 50.0,
            b_wall: 1.0,
            n_humans: 4,
            n_zombies: 2,
        },
        run: Run {
            time_step: 0.05,
            simulation_time: 10.0,
            realizations: 1,
        },
        output: Output {
            directory: "output".to_string(),
            save_snapshots: false,
            save_positions: false,
            save_series: false,
            save_finish_states: false,
            min_finish_time: 0.0,
        },
    }
}

fn rng(seed: u64) -> ChaCha12Rng {
    ChaCha12Rng::seed_from_u64(seed)
}

/// A touching human/zombie pair, at rest relative to each other at the start.
fn contact_pair(cfg: &Config) -> Vec<Agent> {
    vec![
        Agent::new(0, AgentType::Human, Vec2::new(-0.05, 0.0), cfg),
        Agent::new(1, AgentType::Zombie, Vec2::new(0.05, 0.0), cfg),
    ]
}

#[test]
fn radius_stays_within_bounds() {
    let cfg = base_config();
    let mut engine = Engine::new(cfg.clone(), 0.5, rng(1)).unwrap();

    for _ in 0..200 {
        engine.step();
        for agent in engine.agents() {
            assert!(
                agent.radius >= cfg.body.min_radius && agent.radius <= cfg.body.max_radius,
                "radius {} out of [{}, {}]",
                agent.radius,
                cfg.body.min_radius,
                cfg.body.max_radius
            );
        }
    }
}

#[test]
fn contact_resolution_turns_both_into_zombies() {
    let mut cfg = base_config();
    cfg.infection.contact_duration = 0.0;
    let agents = contact_pair(&cfg);

    let mut engine = Engine::with_population(cfg.clone(), 1.0, agents, rng(2)).unwrap();
    // First step detects the contact, second step resolves it immediately
    // since the elapsed time is already >= 0.
    engine.step();
    engine.step();

    for agent in engine.agents() {
        assert_eq!(agent.kind, AgentType::Zombie);
        assert_eq!(agent.speed, cfg.population.zombie_speed);
    }
}

#[test]
fn contact_resolution_turns_both_into_humans() {
    let mut cfg = base_config();
    cfg.infection.contact_duration = 0.0;
    let agents = contact_pair(&cfg);

    let mut engine = Engine::with_population(cfg.clone(), 0.0, agents, rng(3)).unwrap();
    engine.step();
    engine.step();

    for agent in engine.agents() {
        assert_eq!(agent.kind, AgentType::Human);
        assert_eq!(agent.speed, cfg.population.human_speed);
    }
}

#[test]
fn frozen_pair_does_not_move() {
    let mut cfg = base_config();
    cfg.infection.contact_duration = 100.0;
    // Slow speeds keep the pair overlapping even after contraction, so the
    // contact survives the whole freeze.
    cfg.population.human_speed = 0.5;
    cfg.population.zombie_speed = 0.5;
    let agents = contact_pair(&cfg);

    let mut engine = Engine::with_population(cfg, 0.5, agents, rng(4)).unwrap();
    // The contact starts at the end of the first step; from then on both
    // agents are frozen for the whole contact duration.
    engine.step();
    let positions: Vec<Vec2> = engine.agents().iter().map(|agent| agent.position).collect();

    for _ in 0..10 {
        engine.step();
        for (agent, &before) in engine.agents().iter().zip(&positions) {
            assert_eq!(agent.velocity, Vec2::ZERO);
            assert_eq!(agent.position, before);
            assert!(agent.contact.is_some());
        }
    }
}

#[test]
fn positions_stay_inside_the_arena() {
    let mut cfg = base_config();
    cfg.population.human_speed = 10.0;
    let mut agent = Agent::new(0, AgentType::Human, Vec2::new(9.0, 0.0), &cfg);
    agent.desired_direction = Vec2::new(1.0, 0.0);

    let mut engine = Engine::with_population(cfg.clone(), 0.5, vec![agent], rng(5)).unwrap();
    for _ in 0..50 {
        engine.step();
        let agent = &engine.agents()[0];
        assert!(
            agent.position.magnitude() <= cfg.arena.radius - agent.radius + 1e-9,
            "agent escaped to {:?}",
            agent.position
        );
    }
}

#[test]
fn extinct_population_terminates_at_time_zero() {
    let mut cfg = base_config();
    cfg.population.initial_humans = 0;
    cfg.population.initial_zombies = 1;

    let mut engine = Engine::new(cfg, 0.5, rng(6)).unwrap();
    let finish = engine.run();

    assert_eq!(finish.time, 0.0);
    assert_eq!(finish.num_humans, 0);
    assert_eq!(finish.num_zombies, 1);
    assert_eq!(finish.average_velocity, 0.0);

    // A lone configured zombie is seeded exactly at the arena center and
    // never gets to move.
    let zombie = &engine.agents()[0];
    assert_eq!(zombie.position, Vec2::ZERO);
    assert_eq!(zombie.velocity, Vec2::ZERO);
}

#[test]
fn zero_time_budget_reports_initial_counts() {
    let mut cfg = base_config();
    cfg.run.simulation_time = 0.0;
    cfg.population.initial_humans = 3;
    cfg.population.initial_zombies = 1;

    let mut engine = Engine::new(cfg, 0.5, rng(7)).unwrap();
    let finish = engine.run();

    assert_eq!(finish.time, 0.0);
    assert_eq!(finish.num_humans, 3);
    assert_eq!(finish.num_zombies, 1);
}

#[test]
fn radius_relaxes_monotonically_toward_max() {
    let mut cfg = base_config();
    cfg.population.human_speed = 0.0;
    let mut agent = Agent::new(0, AgentType::Human, Vec2::new(2.0, 0.0), &cfg);
    agent.radius = cfg.body.min_radius;

    let mut engine = Engine::with_population(cfg.clone(), 0.5, vec![agent], rng(8)).unwrap();
    let mut previous = cfg.body.min_radius;
    for _ in 0..100 {
        engine.step();
        let radius = engine.agents()[0].radius;
        if previous < cfg.body.max_radius {
            assert!(radius > previous, "radius did not grow: {radius} <= {previous}");
        }
        assert!(radius <= cfg.body.max_radius);
        previous = radius;
    }
}

#[test]
fn separated_agents_have_empty_contact_sets() {
    let mut cfg = base_config();
    cfg.population.human_speed = 0.0;
    let agents = vec![
        Agent::new(0, AgentType::Human, Vec2::new(-3.0, 0.0), &cfg),
        Agent::new(1, AgentType::Human, Vec2::new(3.0, 0.0), &cfg),
    ];

    let mut engine = Engine::with_population(cfg.clone(), 0.5, agents, rng(9)).unwrap();
    for _ in 0..10 {
        engine.step();
        for agent in engine.agents() {
            assert!(agent.contacts.is_empty());
            assert!(agent.contact.is_none());
            assert_eq!(agent.radius, cfg.body.max_radius);
        }
    }
}

#[test]
fn average_velocity_is_the_magnitude_of_the_mean_vector() {
    let cfg = base_config();
    let mut left = Agent::new(0, AgentType::Human, Vec2::ZERO, &cfg);
    let mut right = Agent::new(1, AgentType::Human, Vec2::ZERO, &cfg);

    left.velocity = Vec2::new(-1.0, 0.0);
    right.velocity = Vec2::new(1.0, 0.0);
    assert!(average_velocity(&[left.clone(), right.clone()]).abs() < 1e-12);

    left.velocity = Vec2::new(1.0, 0.0);
    assert!((average_velocity(&[left, right]) - 1.0).abs() < 1e-12);

    assert_eq!(average_velocity(&[]), 0.0);
}

#[test]
fn initial_placement_keeps_agents_apart() {
    let mut cfg = base_config();
    cfg.arena.radius = 20.0;
    cfg.population.initial_humans = 20;
    cfg.population.initial_zombies = 2;

    let engine = Engine::new(cfg.clone(), 0.5, rng(10)).unwrap();
    let agents = engine.agents();
    assert_eq!(agents.len(), 22);

    for (i, a) in agents.iter().enumerate() {
        assert!(a.position.magnitude() <= cfg.arena.radius);
        for b in &agents[i + 1..] {
            assert!(
                a.position.distance_to(b.position) >= 2.0 * cfg.body.max_radius,
                "agents {} and {} overlap",
                a.id,
                b.id
            );
        }
    }

    // Multiple zombies are biased toward the inner third of the arena.
    for zombie in &agents[..2] {
        assert_eq!(zombie.kind, AgentType::Zombie);
        assert!(zombie.position.magnitude() <= cfg.arena.radius / 3.0);
    }
}

#[test]
fn ids_are_sequential_and_zombies_come_first() {
    let cfg = base_config();
    let engine = Engine::new(cfg.clone(), 0.5, rng(11)).unwrap();

    for (idx, agent) in engine.agents().iter().enumerate() {
        assert_eq!(agent.id, idx);
        let expected = if idx < cfg.population.initial_zombies {
            AgentType::Zombie
        } else {
            AgentType::Human
        };
        assert_eq!(agent.kind, expected);
        assert_eq!(agent.speed, agent.kind.speed(&cfg));
    }
}

#[test]
fn invalid_configs_are_rejected() {
    let mut cfg = base_config();
    cfg.body.max_radius = cfg.body.min_radius;
    assert!(cfg.validate().is_err());
    assert!(Engine::new(cfg, 0.5, rng(12)).is_err());

    let mut cfg = base_config();
    cfg.body.relaxation_time = 0.0;
    assert!(cfg.validate().is_err());

    let mut cfg = base_config();
    cfg.run.time_step = 0.0;
    assert!(cfg.validate().is_err());

    let mut cfg = base_config();
    cfg.infection.probabilities = vec![1.5];
    assert!(cfg.validate().is_err());

    let mut cfg = base_config();
    cfg.infection.probabilities.clear();
    assert!(cfg.validate().is_err());
}

#[test]
fn vector_primitives() {
    assert_eq!(Vec2::ZERO.normalize(), Vec2::ZERO);

    let rotated = Vec2::new(1.0, 0.0).rotate(std::f64::consts::FRAC_PI_2);
    assert!((rotated.x - 0.0).abs() < 1e-12);
    assert!((rotated.y - 1.0).abs() < 1e-12);

    let reflected = Vec2::new(1.0, -1.0).reflect(Vec2::new(0.0, 1.0));
    assert_eq!(reflected, Vec2::new(1.0, 1.0));

    let projected = Vec2::new(2.0, 3.0).project_onto(Vec2::new(1.0, 0.0));
    assert_eq!(projected, Vec2::new(2.0, 0.0));
    assert_eq!(Vec2::new(2.0, 3.0).project_onto(Vec2::ZERO), Vec2::ZERO);

    assert!((Vec2::from_angle(0.0) - Vec2::new(1.0, 0.0)).magnitude() < 1e-12);
    assert!((Vec2::new(3.0, 4.0).magnitude() - 5.0).abs() < 1e-12);
}
