use crate::config::Config;
use crate::engine::Engine;
use crate::model::FinishState;
use crate::output;
use anyhow::{Context, Result};
use glob::glob;
use rand::SeedableRng;
use rand_chacha::ChaCha12Rng;
use rayon::prelude::*;
use std::{
    fs,
    path::{Path, PathBuf},
};

/// Orchestrates the probability sweep for one simulation directory.
///
/// The sim dir holds a `config.toml`; everything the sweep produces goes into
/// the configured output directory underneath it. Realizations within a sweep
/// point are independent tasks: each owns its engine and RNG, and their finish
/// states are joined before the aggregate file is written.
pub struct Manager {
    sim_dir: PathBuf,
    cfg: Config,
}

impl Manager {
    pub fn new<P: AsRef<Path>>(sim_dir: P) -> Result<Self> {
        let sim_dir = sim_dir.as_ref().to_path_buf();

        let cfg =
            Config::from_file(sim_dir.join("config.toml")).context("failed to construct cfg")?;
        log::info!("{cfg:#?}");

        Ok(Self { sim_dir, cfg })
    }

    /// Run every configured infection probability, each with the configured
    /// number of realizations.
    pub fn run_sweep(&self) -> Result<()> {
        let out_dir = self.out_dir();
        fs::create_dir_all(&out_dir).with_context(|| format!("failed to create {out_dir:?}"))?;

        for &probability in &self.cfg.infection.probabilities {
            let finish_states: Vec<FinishState> = (0..self.cfg.run.realizations)
                .into_par_iter()
                .map(|realization_idx| self.run_realization(probability, realization_idx))
                .collect::<Result<_>>()?;

            if self.cfg.output.save_finish_states {
                output::write_finish_states(
                    self.finish_states_file(probability),
                    &finish_states,
                    self.cfg.output.min_finish_time,
                )
                .context("failed to write finish states")?;
            }

            log::info!("completed sweep point p = {probability}");
        }

        Ok(())
    }

    fn run_realization(&self, probability: f64, realization_idx: usize) -> Result<FinishState> {
        let rng = ChaCha12Rng::try_from_os_rng()?;
        let mut engine = Engine::new(self.cfg.clone(), probability, rng)
            .context("failed to construct engine")?;

        let finish_state = engine.run();

        if self.cfg.output.save_positions {
            output::write_positions(
                self.positions_file(probability, realization_idx),
                engine.snapshots(),
            )
            .context("failed to write positions")?;
        }
        if self.cfg.output.save_series {
            output::write_series(
                self.series_file(probability, realization_idx),
                engine.snapshots(),
            )
            .context("failed to write series")?;
        }

        log::info!(
            "realization {realization_idx} at p = {probability} finished at t = {:.2} \
             with {} humans and {} zombies",
            finish_state.time,
            finish_state.num_humans,
            finish_state.num_zombies,
        );

        Ok(finish_state)
    }

    /// Remove every generated CSV file and, if it is then empty, the output
    /// directory itself.
    pub fn clean_sim(&self) -> Result<()> {
        let pattern = self.out_dir().join("*.csv");
        let pattern = pattern.to_str().context("pattern is not valid UTF-8")?;
        for entry in glob(pattern).context("failed to glob output files")? {
            let file = entry.context("failed to read glob entry")?;
            fs::remove_file(&file).with_context(|| format!("failed to remove {file:?}"))?;
            log::info!("removed {file:?}");
        }
        fs::remove_dir(self.out_dir()).ok();
        Ok(())
    }

    fn out_dir(&self) -> PathBuf {
        self.sim_dir.join(&self.cfg.output.directory)
    }

    fn finish_states_file(&self, probability: f64) -> PathBuf {
        self.out_dir()
            .join(format!("finish_states_{probability}.csv"))
    }

    fn positions_file(&self, probability: f64, realization_idx: usize) -> PathBuf {
        self.out_dir()
            .join(format!("realization_{probability}_{realization_idx}.csv"))
    }

    fn series_file(&self, probability: f64, realization_idx: usize) -> PathBuf {
        self.out_dir()
            .join(format!("realization_{probability}_{realization_idx}_vel.csv"))
    }
}
