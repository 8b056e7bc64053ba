//! The simulation: agent collections, per-tick deltas and lifecycle flags.

use rand::rngs::SmallRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::agent::{Agent, AgentId, AgentKind};
use crate::error::SimError;
use crate::grid::{Bounds, CellRect, GridSettings};

/// User logic run once per tick, before actors are moved.
pub type StepFn = Box<dyn FnMut(&mut Simulation) + Send + Sync>;

/// Agents added and removed over one tick.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Deltas {
    /// Ids added, in insertion order.
    pub added: Vec<AgentId>,
    /// Ids removed, in removal order.
    pub removed: Vec<AgentId>,
}

impl Deltas {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

/// A grid simulation of squares, zones and actors.
///
/// Squares are created with the grid and never change in number. Zones and
/// actors are added and removed freely. Changes accumulate in a pending
/// [`Deltas`] per kind and are published at the end of each [`tick`], so a
/// change made between ticks shows up in the next tick's deltas.
///
/// [`tick`]: Simulation::tick
pub struct Simulation {
    settings: GridSettings,
    collections: [BTreeMap<AgentId, Agent>; 3],
    /// Published by the last tick.
    deltas: [Deltas; 3],
    /// Accumulating since the last tick.
    pending: [Deltas; 3],
    /// Row-major square ids, for cell lookups.
    square_ids: Vec<AgentId>,
    next_id: u64,
    tick_index: u64,
    max_ticks: Option<u64>,
    paused: bool,
    finished: bool,
    rng: SmallRng,
    step: Option<StepFn>,
    /// Simulation-wide numeric state, read by background style callbacks.
    pub vars: BTreeMap<String, f64>,
}

impl std::fmt::Debug for Simulation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Simulation")
            .field("settings", &self.settings)
            .field("tick_index", &self.tick_index)
            .field("squares", &self.collections[0].len())
            .field("zones", &self.collections[1].len())
            .field("actors", &self.collections[2].len())
            .field("paused", &self.paused)
            .field("finished", &self.finished)
            .finish()
    }
}

impl Simulation {
    /// Create a simulation and fill the grid with squares.
    pub fn new(settings: GridSettings) -> Result<Self, SimError> {
        if !settings.is_valid() {
            return Err(SimError::InvalidGrid {
                width: settings.width,
                height: settings.height,
                grid_step: settings.grid_step,
            });
        }

        let mut sim = Self {
            settings,
            collections: Default::default(),
            deltas: Default::default(),
            pending: Default::default(),
            square_ids: Vec::with_capacity(settings.columns() * settings.rows()),
            next_id: 1,
            tick_index: 0,
            max_ticks: None,
            paused: false,
            finished: false,
            rng: SmallRng::seed_from_u64(0),
            step: None,
            vars: BTreeMap::new(),
        };

        for row in 0..settings.rows() {
            for column in 0..settings.columns() {
                let id = sim.allocate_id();
                let square = Agent::square(id, column, row, settings.grid_step);
                sim.square_ids.push(id);
                sim.insert(square);
            }
        }
        sim.pending = Default::default();

        tracing::debug!(
            "Created {}x{} grid ({} squares)",
            settings.columns(),
            settings.rows(),
            sim.square_ids.len()
        );
        Ok(sim)
    }

    /// Reseed the simulation's random number generator.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = SmallRng::seed_from_u64(seed);
        self
    }

    /// Finish automatically once this many ticks have run.
    pub fn with_max_ticks(mut self, max_ticks: u64) -> Self {
        self.max_ticks = Some(max_ticks);
        self
    }

    /// Install the per-tick step function, replacing any previous one.
    pub fn on_tick(&mut self, step: impl FnMut(&mut Simulation) + Send + Sync + 'static) {
        self.step = Some(Box::new(step));
    }

    pub fn settings(&self) -> GridSettings {
        self.settings
    }

    pub fn width(&self) -> f64 {
        self.settings.width
    }

    pub fn height(&self) -> f64 {
        self.settings.height
    }

    pub fn grid_step(&self) -> f64 {
        self.settings.grid_step
    }

    /// Number of completed ticks.
    pub fn tick_index(&self) -> u64 {
        self.tick_index
    }

    pub fn rng(&mut self) -> &mut SmallRng {
        &mut self.rng
    }

    // --- collections -------------------------------------------------------

    /// All live agents of a kind, in creation order.
    pub fn collection(&self, kind: AgentKind) -> &BTreeMap<AgentId, Agent> {
        &self.collections[kind.index()]
    }

    pub fn squares(&self) -> impl Iterator<Item = &Agent> {
        self.collection(AgentKind::Square).values()
    }

    pub fn zones(&self) -> impl Iterator<Item = &Agent> {
        self.collection(AgentKind::Zone).values()
    }

    pub fn actors(&self) -> impl Iterator<Item = &Agent> {
        self.collection(AgentKind::Actor).values()
    }

    /// Look up a live agent.
    pub fn get(&self, kind: AgentKind, id: AgentId) -> Option<&Agent> {
        self.collections[kind.index()].get(&id)
    }

    /// Look up a live agent for mutation.
    pub fn get_mut(&mut self, kind: AgentKind, id: AgentId) -> Option<&mut Agent> {
        self.collections[kind.index()].get_mut(&id)
    }

    /// Mutable access to every agent of a kind.
    pub fn agents_mut(&mut self, kind: AgentKind) -> impl Iterator<Item = &mut Agent> {
        self.collections[kind.index()].values_mut()
    }

    /// The square containing a point, if the point is on the grid.
    pub fn square_at(&self, x: f64, y: f64) -> Option<&Agent> {
        if x < 0.0 || y < 0.0 {
            return None;
        }
        let column = (x / self.settings.grid_step).floor() as usize;
        let row = (y / self.settings.grid_step).floor() as usize;
        if column >= self.settings.columns() || row >= self.settings.rows() {
            return None;
        }
        let id = self.square_ids[row * self.settings.columns() + column];
        self.get(AgentKind::Square, id)
    }

    /// Add a zone covering a block of cells.
    pub fn add_zone(&mut self, cells: CellRect) -> Result<AgentId, SimError> {
        let fits = cells.first_column <= cells.last_column
            && cells.first_row <= cells.last_row
            && cells.last_column < self.settings.columns()
            && cells.last_row < self.settings.rows();
        if !fits {
            return Err(SimError::ZoneOutOfBounds(cells));
        }
        let id = self.allocate_id();
        self.insert(Agent::zone(id, cells.bounds(self.settings.grid_step)));
        Ok(id)
    }

    /// Add an actor centred on `(x, y)`.
    pub fn add_actor(&mut self, x: f64, y: f64, radius: f64) -> Result<AgentId, SimError> {
        if !(radius > 0.0 && radius.is_finite()) {
            return Err(SimError::InvalidRadius(radius));
        }
        let id = self.allocate_id();
        self.insert(Agent::actor(id, x, y, radius));
        Ok(id)
    }

    /// Remove a zone or actor.
    ///
    /// Removing an agent added during the same tick cancels the addition
    /// instead of recording a removal.
    pub fn remove(&mut self, kind: AgentKind, id: AgentId) -> Result<Agent, SimError> {
        if kind == AgentKind::Square {
            return Err(SimError::FixedSquare(id));
        }
        let agent = self.collections[kind.index()]
            .remove(&id)
            .ok_or(SimError::UnknownAgent { kind, id })?;

        let deltas = &mut self.pending[kind.index()];
        if let Some(pos) = deltas.added.iter().position(|added| *added == id) {
            deltas.added.remove(pos);
        } else {
            deltas.removed.push(id);
        }
        Ok(agent)
    }

    /// Changes published by the most recent tick.
    pub fn deltas(&self, kind: AgentKind) -> &Deltas {
        &self.deltas[kind.index()]
    }

    pub fn added(&self, kind: AgentKind) -> &[AgentId] {
        &self.deltas[kind.index()].added
    }

    pub fn removed(&self, kind: AgentKind) -> &[AgentId] {
        &self.deltas[kind.index()].removed
    }

    /// Changes made since the last tick, published by the next one.
    pub fn pending(&self, kind: AgentKind) -> &Deltas {
        &self.pending[kind.index()]
    }

    // --- lifecycle ---------------------------------------------------------

    pub fn pause(&mut self) {
        self.paused = true;
    }

    pub fn resume(&mut self) {
        self.paused = false;
    }

    pub fn toggle_pause(&mut self) {
        self.paused = !self.paused;
    }

    /// Mark the simulation as finished. Renderers stop on their next frame.
    pub fn finish(&mut self) {
        self.finished = true;
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Advance one step.
    ///
    /// Runs the step function, moves actors by their velocity (bouncing off
    /// the grid edges), publishes the accumulated deltas and checks the tick
    /// limit.
    pub fn tick(&mut self) {
        if let Some(mut step) = self.step.take() {
            step(self);
            // The step may have installed a replacement.
            if self.step.is_none() {
                self.step = Some(step);
            }
        }

        self.move_actors();
        self.deltas = std::mem::take(&mut self.pending);
        self.tick_index += 1;

        if let Some(max) = self.max_ticks {
            if self.tick_index >= max && !self.finished {
                tracing::info!("Simulation finished at tick {}", self.tick_index);
                self.finished = true;
            }
        }
    }

    /// Serializable summary of the current state.
    pub fn snapshot(&self) -> SimSnapshot {
        SimSnapshot {
            tick: self.tick_index,
            paused: self.paused,
            finished: self.finished,
            settings: self.settings,
            squares: self.collection(AgentKind::Square).len(),
            zones: self.zones().cloned().collect(),
            actors: self.actors().cloned().collect(),
            vars: self.vars.clone(),
        }
    }

    fn allocate_id(&mut self) -> AgentId {
        let id = AgentId(self.next_id);
        self.next_id += 1;
        id
    }

    fn insert(&mut self, agent: Agent) {
        let kind = agent.kind;
        self.pending[kind.index()].added.push(agent.id);
        self.collections[kind.index()].insert(agent.id, agent);
    }

    fn move_actors(&mut self) {
        let area = Bounds::new(0.0, self.settings.width, 0.0, self.settings.height);
        for actor in self.collections[AgentKind::Actor.index()].values_mut() {
            if actor.vx == 0.0 && actor.vy == 0.0 {
                continue;
            }
            let r = actor.radius;
            let mut x = actor.x + actor.vx;
            let mut y = actor.y + actor.vy;

            if x - r < area.x_min {
                x = area.x_min + r;
                actor.vx = actor.vx.abs();
            } else if x + r > area.x_max {
                x = area.x_max - r;
                actor.vx = -actor.vx.abs();
            }
            if y - r < area.y_min {
                y = area.y_min + r;
                actor.vy = actor.vy.abs();
            } else if y + r > area.y_max {
                y = area.y_max - r;
                actor.vy = -actor.vy.abs();
            }

            actor.set_position(x, y);
        }
    }
}

/// Serializable view of a simulation, written by the headless runner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimSnapshot {
    pub tick: u64,
    pub paused: bool,
    pub finished: bool,
    pub settings: GridSettings,
    /// Square count; squares themselves are implied by the grid.
    pub squares: usize,
    pub zones: Vec<Agent>,
    pub actors: Vec<Agent>,
    pub vars: BTreeMap<String, f64>,
}
