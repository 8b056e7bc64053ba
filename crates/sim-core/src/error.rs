//! Simulation errors.

use thiserror::Error;

use crate::agent::{AgentId, AgentKind};
use crate::grid::CellRect;

/// Errors raised when building or mutating a simulation.
#[derive(Debug, Error)]
pub enum SimError {
    /// Width/height are not a positive whole number of grid steps.
    #[error("grid of {width}x{height} cannot be divided into squares of {grid_step}")]
    InvalidGrid {
        width: f64,
        height: f64,
        grid_step: f64,
    },
    /// Zone cells fall outside the grid or are inverted.
    #[error("zone cells {0:?} fall outside the grid")]
    ZoneOutOfBounds(CellRect),
    /// Actor radius must be positive and finite.
    #[error("invalid actor radius {0}")]
    InvalidRadius(f64),
    /// No agent of that kind with that id.
    #[error("no {kind} with id {id}")]
    UnknownAgent { kind: AgentKind, id: AgentId },
    /// Squares make up the grid and are never removed.
    #[error("squares are fixed by the grid and cannot be removed ({0})")]
    FixedSquare(AgentId),
}
