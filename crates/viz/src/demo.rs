//! A small self-running simulation to visualize.
//!
//! Squares carry a `heat` variable that actors raise as they pass over and
//! that decays every tick. Actors wander and bounce; now and then one is
//! retired and a fresh one spawned, so the scene sees additions and
//! removals while running.

use rand::Rng;

use scene::{colors, Attr, TextPosition, VisOptions, ZIndexUpdate};
use sim_core::{Agent, AgentId, AgentKind, CellRect, GridSettings, SimError, Simulation};

/// Heat decay per tick.
const COOLING: f64 = 0.96;
/// Chance per tick that one actor is replaced.
const TURNOVER: f64 = 0.05;

/// Shape of the demo world.
#[derive(Debug, Clone)]
pub struct DemoSettings {
    pub width: f64,
    pub height: f64,
    pub grid_step: f64,
    pub actors: usize,
    pub zones: usize,
    pub seed: u64,
    pub max_ticks: Option<u64>,
}

impl Default for DemoSettings {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 600.0,
            grid_step: 20.0,
            actors: 40,
            zones: 3,
            seed: 42,
            max_ticks: None,
        }
    }
}

/// Build the demo simulation with its tick behaviour installed.
pub fn build_simulation(settings: &DemoSettings) -> Result<Simulation, SimError> {
    let grid = GridSettings::new(settings.width, settings.height, settings.grid_step);
    let mut sim = Simulation::new(grid)?.with_seed(settings.seed);
    if let Some(max_ticks) = settings.max_ticks {
        sim = sim.with_max_ticks(max_ticks);
    }

    let (columns, rows) = (grid.columns(), grid.rows());
    for _ in 0..settings.zones {
        let cells = random_cells(&mut sim, columns, rows);
        sim.add_zone(cells)?;
    }
    for _ in 0..settings.actors {
        spawn_actor(&mut sim)?;
    }

    sim.on_tick(|sim| {
        cool_and_heat(sim);
        if sim.rng().gen_bool(TURNOVER) {
            turn_over(sim);
        }
        for actor in sim.agents_mut(AgentKind::Actor) {
            actor.z_index = Some(actor.y);
        }
    });

    tracing::info!(
        columns,
        rows,
        zones = settings.zones,
        actors = settings.actors,
        seed = settings.seed,
        "Demo simulation built"
    );
    Ok(sim)
}

/// Layer the demo's callbacks over configured options.
pub fn apply_demo_styles(options: &mut VisOptions) {
    options.square.tint = Attr::derived(|square: &Agent| {
        colors::mix(colors::BLUE, colors::RED, square.var("heat"))
    });

    options.zone.alpha = 0.25.into();
    options.zone.tint = Attr::derived(|zone: &Agent| colors::palette(zone.id.0 as usize));
    options.zone.text = Attr::derived(|zone: &Agent| Some(format!("zone {}", zone.id.0)));
    options.zone.text_position = TextPosition::TopLeft.into();

    options.actor.tint = Attr::derived(|actor: &Agent| colors::palette(actor.id.0 as usize));
    options.actor.text = Attr::derived(|actor: &Agent| Some(actor.id.0.to_string()));
    options.actor.text_rotate = false.into();
    options.actor.font_size = 10.0.into();

    options.update.tint = true;
    options.update.pointing = true;
    options.update.z_index = ZIndexUpdate::Always;
}

fn random_cells(sim: &mut Simulation, columns: usize, rows: usize) -> CellRect {
    let rng = sim.rng();
    let width = rng.gen_range(1..=(columns / 3).max(1));
    let height = rng.gen_range(1..=(rows / 3).max(1));
    let first_column = rng.gen_range(0..=columns - width);
    let first_row = rng.gen_range(0..=rows - height);
    CellRect::new(first_column, first_column + width - 1, first_row, first_row + height - 1)
}

fn spawn_actor(sim: &mut Simulation) -> Result<AgentId, SimError> {
    let (width, height, step) = (sim.width(), sim.height(), sim.grid_step());
    let rng = sim.rng();
    let radius = rng.gen_range(step * 0.2..=step * 0.5);
    let x = rng.gen_range(radius..=(width - radius).max(radius));
    let y = rng.gen_range(radius..=(height - radius).max(radius));
    let angle = rng.gen_range(0.0..std::f64::consts::TAU);
    let speed = rng.gen_range(0.5..2.0);

    let id = sim.add_actor(x, y, radius)?;
    if let Some(actor) = sim.get_mut(AgentKind::Actor, id) {
        actor.vx = speed * angle.cos();
        actor.vy = speed * angle.sin();
        actor.z_index = Some(y);
    }
    Ok(id)
}

fn cool_and_heat(sim: &mut Simulation) {
    for square in sim.agents_mut(AgentKind::Square) {
        let heat = square.var("heat") * COOLING;
        square.set_var("heat", heat);
    }

    let warmed: Vec<AgentId> = sim
        .actors()
        .filter_map(|actor| sim.square_at(actor.x, actor.y).map(|square| square.id))
        .collect();
    for id in warmed {
        if let Some(square) = sim.get_mut(AgentKind::Square, id) {
            let heat = (square.var("heat") + 0.3).min(1.0);
            square.set_var("heat", heat);
        }
    }
}

fn turn_over(sim: &mut Simulation) {
    let count = sim.actors().count();
    if count == 0 {
        return;
    }
    let index = sim.rng().gen_range(0..count);
    let Some(id) = sim.actors().nth(index).map(|actor| actor.id) else {
        return;
    };
    if let Err(err) = sim.remove(AgentKind::Actor, id) {
        tracing::warn!(error = %err, "Could not retire actor");
        return;
    }
    if let Err(err) = spawn_actor(sim) {
        tracing::warn!(error = %err, "Could not spawn actor");
    }
}
