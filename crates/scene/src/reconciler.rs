//! Incremental reconciliation of a simulation into a scene graph.
//!
//! The reconciler owns the per-kind index from agent id to display record.
//! Each frame it ticks the simulation, applies the tick's removals and
//! additions, refreshes dynamic attributes and keeps the middle layer sorted.
//! Records are only ever created for agents that are not yet tracked, so
//! repeated reconciliation of the same state is a no-op for the scene's
//! node set.

use std::collections::BTreeMap;
use std::hash::Hash;
use std::fmt;

use serde::{Deserialize, Serialize};
use sim_core::{Agent, AgentId, AgentKind, Simulation};

use crate::graph::{NodeProp, SceneGraph, SpriteDesc};
use crate::hooks::{run_hook, Hooks};
use crate::layers::{DrawLayer, Layers};
use crate::options::VisOptions;
use crate::record::{DisplayRecord, DynamicAttrs, Painter, ShapeCache};

/// Lifecycle of a reconciler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Status {
    /// Created, not yet set up.
    Pending,
    Running,
    /// The finished hook has run; frames do nothing.
    Finished,
}

/// What a call to [`Reconciler::frame`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FrameOutcome {
    /// Not set up, or not running.
    Idle,
    /// The simulation is paused; nothing was touched.
    Paused,
    Ticked,
    /// The simulation is finished.
    Finished,
}

/// Running totals, mostly for logging and tests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconcileStats {
    pub frames: u64,
    pub created: u64,
    pub removed: u64,
    /// Records dropped because their agent vanished without a removal.
    pub pruned: u64,
    /// Records dropped because their draw-order key became NaN or absent.
    pub excluded: u64,
    pub sorts: u64,
}

/// The background sprite.
#[derive(Debug, Clone)]
struct Background<N, T> {
    node: N,
    texture: T,
}

pub struct Reconciler<N, T> {
    options: VisOptions,
    hooks: Hooks<N, T>,
    status: Status,
    layers: Option<Layers<N>>,
    background: Option<Background<N, T>>,
    index: [BTreeMap<AgentId, DisplayRecord<N, T>>; 3],
    shapes: ShapeCache<T>,
    /// The middle layer gained children since its last sort.
    middle_dirty: bool,
    stats: ReconcileStats,
}

impl<N, T> fmt::Debug for Reconciler<N, T>
where
    N: fmt::Debug,
    T: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reconciler")
            .field("status", &self.status)
            .field("layers", &self.layers)
            .field("squares", &self.index[0].len())
            .field("zones", &self.index[1].len())
            .field("actors", &self.index[2].len())
            .field("stats", &self.stats)
            .finish()
    }
}

impl<N, T> Reconciler<N, T>
where
    N: Copy + Eq + Hash + fmt::Debug,
    T: Clone + PartialEq + fmt::Debug,
{
    pub fn new(options: VisOptions) -> Self {
        Self {
            options,
            hooks: Hooks::default(),
            status: Status::Pending,
            layers: None,
            background: None,
            index: [BTreeMap::new(), BTreeMap::new(), BTreeMap::new()],
            shapes: ShapeCache::default(),
            middle_dirty: false,
            stats: ReconcileStats::default(),
        }
    }

    pub fn with_hooks(mut self, hooks: Hooks<N, T>) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn options(&self) -> &VisOptions {
        &self.options
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn stats(&self) -> ReconcileStats {
        self.stats
    }

    pub fn layers(&self) -> Option<Layers<N>> {
        self.layers
    }

    pub fn background_node(&self) -> Option<N> {
        self.background.as_ref().map(|background| background.node)
    }

    /// Number of distinct generated shape textures.
    pub fn shape_textures(&self) -> usize {
        self.shapes.len()
    }

    pub fn record(&self, kind: AgentKind, id: AgentId) -> Option<&DisplayRecord<N, T>> {
        self.index[kind.index()].get(&id)
    }

    pub fn records(&self, kind: AgentKind) -> impl Iterator<Item = (&AgentId, &DisplayRecord<N, T>)> {
        self.index[kind.index()].iter()
    }

    /// Number of tracked agents of a kind.
    pub fn tracked(&self, kind: AgentKind) -> usize {
        self.index[kind.index()].len()
    }

    /// Build the scene for the simulation's current state.
    ///
    /// Calling this more than once is a no-op.
    pub fn setup<G>(&mut self, sim: &mut Simulation, scene: &mut G)
    where
        G: SceneGraph<Node = N, Texture = T>,
    {
        if self.status != Status::Pending {
            tracing::warn!("Reconciler already set up, ignoring setup");
            return;
        }

        run_hook(&mut self.hooks.before_setup, sim, scene);

        let root = scene.root();
        if self.options.background.enabled {
            let background = self.create_background(sim, scene);
            scene.attach(root, background.node);
            self.background = Some(background);
        }

        let layers = Layers {
            back: scene.create_layer(DrawLayer::Back, self.options.back_batching),
            middle: scene.create_layer(DrawLayer::Middle, self.options.middle_batching),
            front: scene.create_layer(DrawLayer::Front, self.options.front_batching),
        };
        for layer in DrawLayer::ALL {
            scene.attach(root, layers.get(layer));
        }
        self.layers = Some(layers);

        for kind in AgentKind::ALL {
            for agent in sim.collection(kind).values() {
                self.track(agent, sim, scene);
            }
        }

        run_hook(&mut self.hooks.after_setup, sim, scene);

        scene.sort_children(layers.middle);
        self.middle_dirty = false;
        self.status = Status::Running;

        tracing::info!(
            "Scene set up: {} squares, {} zones, {} actors",
            self.tracked(AgentKind::Square),
            self.tracked(AgentKind::Zone),
            self.tracked(AgentKind::Actor)
        );
    }

    /// Advance the simulation one tick and bring the scene up to date.
    pub fn frame<G>(&mut self, sim: &mut Simulation, scene: &mut G) -> FrameOutcome
    where
        G: SceneGraph<Node = N, Texture = T>,
    {
        match self.status {
            Status::Pending => return FrameOutcome::Idle,
            Status::Finished => return FrameOutcome::Finished,
            Status::Running => {}
        }
        if !self.options.run {
            return FrameOutcome::Idle;
        }
        if sim.is_finished() {
            self.finish(sim, scene);
            return FrameOutcome::Finished;
        }
        if sim.is_paused() {
            return FrameOutcome::Paused;
        }

        run_hook(&mut self.hooks.before_tick, sim, scene);
        sim.tick();
        self.reconcile(sim, scene);
        run_hook(&mut self.hooks.after_tick, sim, scene);
        self.sort_middle(sim, scene);

        self.stats.frames += 1;
        tracing::trace!("Frame {} reconciled at tick {}", self.stats.frames, sim.tick_index());
        FrameOutcome::Ticked
    }

    /// Apply the simulation's current deltas and dynamic attributes without
    /// ticking.
    pub fn reconcile<G>(&mut self, sim: &Simulation, scene: &mut G)
    where
        G: SceneGraph<Node = N, Texture = T>,
    {
        if self.layers.is_none() {
            return;
        }
        self.refresh_background(sim, scene);
        for kind in AgentKind::ALL {
            self.apply_removals(kind, sim, scene);
            self.apply_additions(kind, sim, scene);
            self.refresh_kind(kind, sim, scene);
        }
    }

    /// Re-key and re-sort the middle layer if due this frame.
    ///
    /// Runs when the z-index update fires, or when middle-layer agents were
    /// added since the last sort.
    pub fn sort_middle<G>(&mut self, sim: &Simulation, scene: &mut G)
    where
        G: SceneGraph<Node = N, Texture = T>,
    {
        let Some(layers) = self.layers else {
            return;
        };
        let rekey = self.options.update.z_index.fires(sim);
        if rekey {
            self.rekey(sim, layers, scene);
        }
        if rekey || self.middle_dirty {
            scene.sort_children(layers.middle);
            self.middle_dirty = false;
            self.stats.sorts += 1;
        }
    }

    /// Destroy every display object and forget all records.
    pub fn teardown<G>(&mut self, scene: &mut G)
    where
        G: SceneGraph<Node = N, Texture = T>,
    {
        scene.teardown();
        for records in &mut self.index {
            records.clear();
        }
        self.layers = None;
        self.background = None;
        self.shapes.clear();
        self.middle_dirty = false;
        tracing::info!("Scene torn down");
    }

    fn finish<G>(&mut self, sim: &mut Simulation, scene: &mut G)
    where
        G: SceneGraph<Node = N, Texture = T>,
    {
        run_hook(&mut self.hooks.finished, sim, scene);
        self.status = Status::Finished;
        tracing::info!(
            "Simulation finished after {} frames at tick {}",
            self.stats.frames,
            sim.tick_index()
        );
        if self.options.cleanup {
            self.teardown(scene);
        }
    }

    /// Create and attach a record for an untracked, included agent.
    fn track<G>(&mut self, agent: &Agent, sim: &Simulation, scene: &mut G) -> bool
    where
        G: SceneGraph<Node = N, Texture = T>,
    {
        let Some(layers) = self.layers else {
            return false;
        };
        let records = &mut self.index[agent.kind.index()];
        if records.contains_key(&agent.id) {
            return false;
        }
        let Some(layer) = DrawLayer::for_key(agent.z_index) else {
            return false;
        };

        let mut painter = Painter::new(&self.options, &mut self.shapes, sim);
        let record = painter.create(agent, layer, scene);
        scene.attach(layers.get(layer), record.node);
        records.insert(agent.id, record);

        if layer == DrawLayer::Middle {
            self.middle_dirty = true;
        }
        self.stats.created += 1;
        true
    }

    fn apply_removals<G>(&mut self, kind: AgentKind, sim: &Simulation, scene: &mut G)
    where
        G: SceneGraph<Node = N, Texture = T>,
    {
        for id in sim.removed(kind) {
            if let Some(record) = self.index[kind.index()].remove(id) {
                scene.remove(record.node);
                self.shapes.release(record.shape.as_ref());
                self.stats.removed += 1;
            }
        }
    }

    fn apply_additions<G>(&mut self, kind: AgentKind, sim: &Simulation, scene: &mut G)
    where
        G: SceneGraph<Node = N, Texture = T>,
    {
        for id in sim.added(kind) {
            if let Some(agent) = sim.get(kind, *id) {
                self.track(agent, sim, scene);
            }
        }
    }

    fn refresh_kind<G>(&mut self, kind: AgentKind, sim: &Simulation, scene: &mut G)
    where
        G: SceneGraph<Node = N, Texture = T>,
    {
        let dynamic = DynamicAttrs::for_kind(kind, &self.options);
        let mut painter = Painter::new(&self.options, &mut self.shapes, sim);
        let records = &mut self.index[kind.index()];

        let mut missing = Vec::new();
        for (id, record) in records.iter_mut() {
            match sim.get(kind, *id) {
                Some(agent) if dynamic.any() => painter.refresh(&dynamic, record, agent, scene),
                Some(_) => {}
                None => missing.push(*id),
            }
        }

        for id in missing {
            if let Some(record) = records.remove(&id) {
                tracing::debug!("Pruning {} {} missing from the simulation", kind, id);
                scene.remove(record.node);
                painter.shapes.release(record.shape.as_ref());
                self.stats.pruned += 1;
            }
        }
    }

    /// Move records whose draw-order key changed layer, drop those that
    /// became excluded and write fresh keys for the middle layer.
    fn rekey<G>(&mut self, sim: &Simulation, layers: Layers<N>, scene: &mut G)
    where
        G: SceneGraph<Node = N, Texture = T>,
    {
        for kind in AgentKind::ALL {
            let records = &mut self.index[kind.index()];
            let mut dropped = Vec::new();
            for (id, record) in records.iter_mut() {
                let key = sim.get(kind, *id).and_then(|agent| agent.z_index);
                let Some(layer) = DrawLayer::for_key(key) else {
                    dropped.push(*id);
                    continue;
                };
                if layer != record.layer {
                    scene.attach(layers.get(layer), record.node);
                    record.layer = layer;
                }
                if let (DrawLayer::Middle, Some(key)) = (layer, key) {
                    scene.set(record.node, NodeProp::DrawKey(key));
                }
            }
            for id in dropped {
                if let Some(record) = records.remove(&id) {
                    tracing::debug!("Dropping {} {} with no draw-order key", kind, id);
                    scene.remove(record.node);
                    self.shapes.release(record.shape.as_ref());
                    self.stats.excluded += 1;
                }
            }
        }
    }

    fn create_background<G>(&mut self, sim: &Simulation, scene: &mut G) -> Background<N, T>
    where
        G: SceneGraph<Node = N, Texture = T>,
    {
        let style = &self.options.background;
        let texture = match style.image.resolve(sim) {
            Some(path) => scene.image_texture(&path),
            None => scene.white_texture(),
        };
        let node = scene.create_sprite(&SpriteDesc {
            texture: texture.clone(),
            x: 0.0,
            y: 0.0,
            width: sim.width() as f32,
            height: sim.height() as f32,
            anchor: (0.0, 0.0),
            rotation: 0.0,
            tint: style.tint.resolve(sim),
            alpha: style.alpha.resolve(sim),
            tile: style.tile.then_some(sim.grid_step() as f32),
            draw_key: f64::NEG_INFINITY,
        });
        Background { node, texture }
    }

    fn refresh_background<G>(&mut self, sim: &Simulation, scene: &mut G)
    where
        G: SceneGraph<Node = N, Texture = T>,
    {
        let style = &self.options.background;
        let update = &self.options.update;
        let Some(background) = self.background.as_mut() else {
            return;
        };
        if update.image && style.image.is_dynamic() {
            let texture = match style.image.resolve(sim) {
                Some(path) => scene.image_texture(&path),
                None => scene.white_texture(),
            };
            if texture != background.texture {
                scene.set(background.node, NodeProp::Texture(texture.clone()));
                background.texture = texture;
            }
        }
        if update.tint && style.tint.is_dynamic() {
            scene.set(background.node, NodeProp::Tint(style.tint.resolve(sim)));
        }
        if update.alpha && style.alpha.is_dynamic() {
            scene.set(background.node, NodeProp::Alpha(style.alpha.resolve(sim)));
        }
    }
}
