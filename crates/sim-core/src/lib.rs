//! Core simulation model: a grid of squares plus zones and actors.
//!
//! This crate holds the simulation the renderer observes. It tracks which
//! agents were added or removed during each tick so that a renderer can
//! update its scene incrementally instead of rebuilding it.

pub mod agent;
pub mod error;
pub mod grid;
pub mod simulation;

pub use agent::{Agent, AgentId, AgentKind};
pub use error::SimError;
pub use grid::{Bounds, CellRect, GridSettings};
pub use simulation::{Deltas, SimSnapshot, Simulation, StepFn};
