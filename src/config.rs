use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::{fmt::Debug, fs, ops::RangeBounds, path::Path};

/// Simulation configuration parameters.
///
/// Loaded from a TOML file and validated before use.
/// See [`Config::from_file`] for loading.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct Config {
    pub arena: Arena,
    pub population: Population,
    pub body: Body,
    pub infection: Infection,
    pub avoidance: Avoidance,
    pub run: Run,
    pub output: Output,
}

/// Circular domain bounding all agent positions.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct Arena {
    /// Arena radius.
    pub radius: f64,
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct Population {
    /// Number of humans at the start of each realization.
    pub initial_humans: usize,
    /// Number of zombies at the start of each realization.
    pub initial_zombies: usize,
    /// Speed of a human agent.
    pub human_speed: f64,
    /// Speed of a zombie agent.
    pub zombie_speed: f64,
}

/// Personal-space (radius) dynamics.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct Body {
    /// Radius an agent contracts to on contact.
    pub min_radius: f64,
    /// Radius an agent relaxes back to when free.
    pub max_radius: f64,
    /// Time constant of the exponential radius relaxation.
    pub relaxation_time: f64,
    /// Exponent coupling the normalized radius to the free-movement speed.
    pub cpm_beta: f64,
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct Infection {
    /// Time a differing-type contact must last before it resolves.
    pub contact_duration: f64,
    /// Infection probabilities to sweep over, one batch of realizations each.
    pub probabilities: Vec<f64>,
}

/// Social-force weights and decay lengths.
///
/// Each `a_*`/`b_*` pair sets the strength and the exponential decay length of
/// one repulsion term in the human desired-direction model.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct Avoidance {
    pub a_human: f64,
    pub b_human: f64,
    pub a_zombie: f64,
    pub b_zombie: f64,
    pub a_wall: f64,
    pub b_wall: f64,
    /// Number of nearest humans a human reacts to.
    pub n_humans: usize,
    /// Number of nearest zombies a human reacts to.
    pub n_zombies: usize,
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct Run {
    /// Integration time step.
    pub time_step: f64,
    /// Simulated time budget of one realization.
    pub simulation_time: f64,
    /// Number of realizations per infection probability.
    pub realizations: usize,
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct Output {
    /// Directory (relative to the sim dir) where CSV files are written.
    pub directory: String,
    /// Capture per-tick snapshots of the population.
    pub save_snapshots: bool,
    /// Write per-agent position files from the captured snapshots.
    pub save_positions: bool,
    /// Write zombie-percentage/average-velocity series from the snapshots.
    pub save_series: bool,
    /// Write one aggregate finish-state file per infection probability.
    pub save_finish_states: bool,
    /// Finish states earlier than this time are excluded from the aggregate.
    pub min_finish_time: f64,
}

impl Config {
    /// Load a [`Config`] from a TOML file.
    ///
    /// Performs validation on all parameters before returning.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read, deserialized,
    /// or if the configuration values are invalid.
    pub fn from_file<P: AsRef<Path>>(file: P) -> Result<Self> {
        let file = file.as_ref();
        let contents =
            fs::read_to_string(file).with_context(|| format!("failed to read {file:?}"))?;

        let config: Config = toml::from_str(&contents).context("failed to deserialize config")?;

        config.validate().context("failed to validate config")?;

        Ok(config)
    }

    /// Check that all parameters are within their allowed ranges.
    ///
    /// Also enforced at engine construction, so hand-built configs cannot
    /// drive the model into division-by-zero territory.
    pub fn validate(&self) -> Result<()> {
        check_num(self.arena.radius, 1.0..10_000.0).context("invalid arena radius")?;

        check_num(self.population.initial_humans, 0..100_000)
            .context("invalid initial number of humans")?;
        check_num(self.population.initial_zombies, 0..100_000)
            .context("invalid initial number of zombies")?;
        check_num(self.population.human_speed, 0.0..1_000.0).context("invalid human speed")?;
        check_num(self.population.zombie_speed, 0.0..1_000.0).context("invalid zombie speed")?;

        check_num(self.body.min_radius, 1e-6..1_000.0).context("invalid minimum radius")?;
        if self.body.max_radius <= self.body.min_radius {
            bail!(
                "maximum radius must be greater than minimum radius, but {} <= {}",
                self.body.max_radius,
                self.body.min_radius
            );
        }
        check_num(self.body.relaxation_time, 1e-9..1_000_000.0)
            .context("invalid relaxation time")?;
        check_num(self.body.cpm_beta, 0.0..100.0).context("invalid CPM exponent")?;

        check_num(self.infection.contact_duration, 0.0..1_000_000.0)
            .context("invalid contact duration")?;
        check_probs(&self.infection.probabilities).context("invalid infection probabilities")?;

        check_num(self.avoidance.n_humans, 0..10_000).context("invalid human neighbor count")?;
        check_num(self.avoidance.n_zombies, 0..10_000).context("invalid zombie neighbor count")?;
        for (name, val) in [
            ("a_human", self.avoidance.a_human),
            ("b_human", self.avoidance.b_human),
            ("a_zombie", self.avoidance.a_zombie),
            ("b_zombie", self.avoidance.b_zombie),
            ("a_wall", self.avoidance.a_wall),
            ("b_wall", self.avoidance.b_wall),
        ] {
            check_num(val, 1e-9..1_000_000.0)
                .with_context(|| format!("invalid avoidance parameter {name}"))?;
        }

        check_num(self.run.time_step, 1e-9..1_000.0).context("invalid time step")?;
        check_num(self.run.simulation_time, 0.0..1_000_000.0).context("invalid simulation time")?;
        check_num(self.run.realizations, 1..10_000).context("invalid number of realizations")?;

        check_num(self.output.min_finish_time, 0.0..1_000_000.0)
            .context("invalid minimum finish time")?;
        if (self.output.save_positions || self.output.save_series) && !self.output.save_snapshots {
            bail!("position and series output require save_snapshots to be enabled");
        }

        Ok(())
    }
}

fn check_num<T, R>(num: T, range: R) -> Result<()>
where
    T: PartialOrd + Debug,
    R: RangeBounds<T> + Debug,
{
    if !range.contains(&num) {
        bail!("number must be in the range {range:?}, but is {num:?}");
    }
    Ok(())
}

fn check_probs(probs: &[f64]) -> Result<()> {
    if probs.is_empty() {
        bail!("at least one probability is required");
    }
    for &prob in probs {
        if !(0.0..=1.0).contains(&prob) {
            bail!("probability must be in the range [0, 1], but is {prob}");
        }
    }
    Ok(())
}
