//! Agents: squares, zones and actors.
//!
//! All three kinds share one struct so that style callbacks can take a
//! single `&Agent` regardless of kind.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::grid::Bounds;

/// Unique identifier for an agent, stable for the agent's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AgentId(pub u64);

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "agent_{:06}", self.0)
    }
}

/// The three kinds of agent a simulation holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentKind {
    /// A single grid cell.
    Square,
    /// A rectangular block of grid cells.
    Zone,
    /// A circular body that moves freely.
    Actor,
}

impl AgentKind {
    /// All kinds, in the order they are created and reconciled.
    pub const ALL: [AgentKind; 3] = [AgentKind::Square, AgentKind::Zone, AgentKind::Actor];

    /// Position of this kind in [`AgentKind::ALL`].
    pub fn index(self) -> usize {
        match self {
            AgentKind::Square => 0,
            AgentKind::Zone => 1,
            AgentKind::Actor => 2,
        }
    }

    /// Lowercase name, used in logs.
    pub fn as_str(self) -> &'static str {
        match self {
            AgentKind::Square => "square",
            AgentKind::Zone => "zone",
            AgentKind::Actor => "actor",
        }
    }
}

impl fmt::Display for AgentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A simulated entity.
///
/// Squares and zones are boxes (`bounds`); actors are circles centred on
/// `(x, y)` with `bounds` tracking their bounding box.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Agent {
    pub id: AgentId,
    pub kind: AgentKind,
    /// Centre x.
    pub x: f64,
    /// Centre y.
    pub y: f64,
    pub bounds: Bounds,
    /// Actor radius; zero for squares and zones.
    pub radius: f64,
    /// Velocity, only integrated for actors.
    pub vx: f64,
    pub vy: f64,
    /// Explicit facing angle in radians. Overrides the velocity heading.
    pub pointing: Option<f64>,
    /// Draw-order key. `None` or NaN keeps the agent out of the scene.
    pub z_index: Option<f64>,
    /// Grid cell `(column, row)` for squares.
    pub cell: Option<(usize, usize)>,
    /// Free-form numeric state read by style callbacks.
    #[serde(default)]
    pub vars: BTreeMap<String, f64>,
}

impl Agent {
    pub(crate) fn square(id: AgentId, column: usize, row: usize, grid_step: f64) -> Self {
        let bounds = Bounds::new(
            column as f64 * grid_step,
            (column + 1) as f64 * grid_step,
            row as f64 * grid_step,
            (row + 1) as f64 * grid_step,
        );
        let (x, y) = bounds.center();
        Self {
            id,
            kind: AgentKind::Square,
            x,
            y,
            bounds,
            radius: 0.0,
            vx: 0.0,
            vy: 0.0,
            pointing: None,
            z_index: Some(f64::NEG_INFINITY),
            cell: Some((column, row)),
            vars: BTreeMap::new(),
        }
    }

    pub(crate) fn zone(id: AgentId, bounds: Bounds) -> Self {
        let (x, y) = bounds.center();
        Self {
            id,
            kind: AgentKind::Zone,
            x,
            y,
            bounds,
            radius: 0.0,
            vx: 0.0,
            vy: 0.0,
            pointing: None,
            z_index: Some(f64::NEG_INFINITY),
            cell: None,
            vars: BTreeMap::new(),
        }
    }

    pub(crate) fn actor(id: AgentId, x: f64, y: f64, radius: f64) -> Self {
        Self {
            id,
            kind: AgentKind::Actor,
            x,
            y,
            bounds: Bounds::around(x, y, radius),
            radius,
            vx: 0.0,
            vy: 0.0,
            pointing: None,
            z_index: Some(0.0),
            cell: None,
            vars: BTreeMap::new(),
        }
    }

    /// Direction of travel in radians; zero when stationary.
    pub fn heading(&self) -> f64 {
        if self.vx == 0.0 && self.vy == 0.0 {
            0.0
        } else {
            self.vy.atan2(self.vx)
        }
    }

    /// Rotation to draw the agent with: `pointing` if set, else heading.
    pub fn rotation(&self) -> f64 {
        self.pointing.unwrap_or_else(|| self.heading())
    }

    /// Speed (length of the velocity).
    pub fn speed(&self) -> f64 {
        self.vx.hypot(self.vy)
    }

    /// Read a state variable, defaulting to zero.
    pub fn var(&self, name: &str) -> f64 {
        self.vars.get(name).copied().unwrap_or(0.0)
    }

    /// Set a state variable.
    pub fn set_var(&mut self, name: impl Into<String>, value: f64) {
        self.vars.insert(name.into(), value);
    }

    /// Move an actor to a new centre, keeping its bounding box in step.
    pub fn set_position(&mut self, x: f64, y: f64) {
        self.x = x;
        self.y = y;
        if self.kind == AgentKind::Actor {
            self.bounds = Bounds::around(x, y, self.radius);
        }
    }

    /// Change an actor's radius.
    pub fn set_radius(&mut self, radius: f64) {
        self.radius = radius;
        self.bounds = Bounds::around(self.x, self.y, radius);
    }
}
