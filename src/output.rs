//! CSV persistence of snapshots and finish states.
//!
//! Column layouts are fixed interfaces consumed by the external analysis
//! scripts; the serde renames below are deliberate.

use crate::model::{AgentType, FinishState, Snapshot};
use anyhow::{Context, Result};
use serde::Serialize;
use std::path::Path;

#[derive(Serialize)]
struct PositionRow {
    #[serde(rename = "Time")]
    time: f64,
    #[serde(rename = "AgentID")]
    agent_id: usize,
    #[serde(rename = "AgentType")]
    agent_type: AgentType,
    #[serde(rename = "PosX")]
    pos_x: f64,
    #[serde(rename = "PosY")]
    pos_y: f64,
    #[serde(rename = "Radius")]
    radius: f64,
}

#[derive(Serialize)]
struct SeriesRow {
    #[serde(rename = "Time")]
    time: f64,
    #[serde(rename = "zombiePercentage")]
    zombie_percentage: f64,
    #[serde(rename = "averageVelocity")]
    average_velocity: f64,
}

#[derive(Serialize)]
struct FinishRow {
    #[serde(rename = "Id")]
    id: usize,
    #[serde(rename = "Time")]
    time: f64,
    #[serde(rename = "NumZombies")]
    num_zombies: usize,
    #[serde(rename = "NumHumans")]
    num_humans: usize,
    #[serde(rename = "averageVelocity")]
    average_velocity: f64,
}

/// Write one row per agent per snapshot.
pub fn write_positions<P: AsRef<Path>>(file: P, snapshots: &[Snapshot]) -> Result<()> {
    let file = file.as_ref();
    let mut writer =
        csv::Writer::from_path(file).with_context(|| format!("failed to create {file:?}"))?;

    for snapshot in snapshots {
        for agent in snapshot.agents() {
            writer.serialize(PositionRow {
                time: snapshot.time(),
                agent_id: agent.id,
                agent_type: agent.kind,
                pos_x: agent.position.x,
                pos_y: agent.position.y,
                radius: agent.radius,
            })?;
        }
    }

    writer.flush().context("failed to flush writer stream")?;
    Ok(())
}

/// Write the zombie-percentage and average-velocity series, one row per
/// snapshot.
pub fn write_series<P: AsRef<Path>>(file: P, snapshots: &[Snapshot]) -> Result<()> {
    let file = file.as_ref();
    let mut writer =
        csv::Writer::from_path(file).with_context(|| format!("failed to create {file:?}"))?;

    for snapshot in snapshots {
        writer.serialize(SeriesRow {
            time: snapshot.time(),
            zombie_percentage: snapshot.zombie_percentage(),
            average_velocity: snapshot.average_velocity(),
        })?;
    }

    writer.flush().context("failed to flush writer stream")?;
    Ok(())
}

/// Write the aggregate finish states of one sweep point, skipping
/// realizations that finished before `min_finish_time`.
pub fn write_finish_states<P: AsRef<Path>>(
    file: P,
    finish_states: &[FinishState],
    min_finish_time: f64,
) -> Result<()> {
    let file = file.as_ref();
    let mut writer =
        csv::Writer::from_path(file).with_context(|| format!("failed to create {file:?}"))?;

    let mut id = 1;
    for state in finish_states {
        if state.time < min_finish_time {
            continue;
        }
        writer.serialize(FinishRow {
            id,
            time: state.time,
            num_zombies: state.num_zombies,
            num_humans: state.num_humans,
            average_velocity: state.average_velocity,
        })?;
        id += 1;
    }

    writer.flush().context("failed to flush writer stream")?;
    Ok(())
}
