//! Agent-based model of a zombie outbreak in a circular arena.
//!
//! Humans avoid zombies with a social-force heading model, zombies pursue the
//! nearest human, and a contact that lasts long enough resolves into a joint
//! type conversion decided by a single coin flip. Personal space follows a
//! cellular-Potts-like rule: instantaneous contraction on contact, exponential
//! relaxation when free.

pub mod config;
pub mod engine;
pub mod manager;
pub mod model;
pub mod output;
pub mod spawn;
pub mod vec2;
