//! The simulation and reconciler as a Bevy resource, and the exclusive
//! systems that drive them.

use bevy::prelude::*;

use scene::{FrameOutcome, Reconciler, VisOptions};
use sim_core::Simulation;

use crate::backend::{spawn_root, to_color, BevyScene};
use crate::camera::PlayPauseEvent;

/// Reconciler specialised to Bevy entities and image handles.
pub type BevyReconciler = Reconciler<Entity, Handle<Image>>;

/// Everything the frame loop owns.
#[derive(Resource)]
pub struct VisRuntime {
    pub sim: Simulation,
    pub reconciler: BevyReconciler,
    /// Close the app once the simulation finishes.
    pub exit_on_finish: bool,
    /// Last frame result, for the HUD and tests.
    pub last_outcome: FrameOutcome,
}

impl VisRuntime {
    pub fn new(sim: Simulation, reconciler: BevyReconciler) -> Self {
        Self {
            sim,
            reconciler,
            exit_on_finish: false,
            last_outcome: FrameOutcome::Idle,
        }
    }

    pub fn with_exit_on_finish(mut self, exit_on_finish: bool) -> Self {
        self.exit_on_finish = exit_on_finish;
        self
    }

    pub fn options(&self) -> &VisOptions {
        self.reconciler.options()
    }
}

/// The entity the scene is built under.
#[derive(Resource, Debug, Clone, Copy)]
pub struct SceneRootEntity(pub Entity);

/// Clear color from the configured base color.
pub fn apply_clear_color(mut commands: Commands, runtime: Res<VisRuntime>) {
    let options = runtime.options();
    commands.insert_resource(ClearColor(to_color(options.base_color, options.base_alpha)));
}

/// Spawn the scene root and build the initial scene.
pub fn setup_scene(world: &mut World) {
    world.resource_scope(|world, mut runtime: Mut<VisRuntime>| {
        let width = runtime.sim.width() as f32;
        let height = runtime.sim.height() as f32;
        let root = spawn_root(world, width, height);
        world.insert_resource(SceneRootEntity(root));

        let VisRuntime { sim, reconciler, .. } = &mut *runtime;
        let mut scene = BevyScene::new(world, root);
        reconciler.setup(sim, &mut scene);
    });
}

/// Run one reconciler frame.
pub fn run_frame(world: &mut World) {
    let Some(root) = world.get_resource::<SceneRootEntity>().map(|root| root.0) else {
        return;
    };
    let exit = world.resource_scope(|world, mut runtime: Mut<VisRuntime>| {
        let VisRuntime {
            sim,
            reconciler,
            exit_on_finish,
            last_outcome,
        } = &mut *runtime;
        let mut scene = BevyScene::new(world, root);
        let outcome = reconciler.frame(sim, &mut scene);
        let first_finish = outcome == FrameOutcome::Finished && *last_outcome != FrameOutcome::Finished;
        *last_outcome = outcome;
        first_finish && *exit_on_finish
    });

    if exit {
        tracing::info!("Exiting after simulation finished");
        world.send_event(AppExit::Success);
    }
}

/// Flip the simulation's pause flag on each play/pause request.
pub fn toggle_pause(mut events: EventReader<PlayPauseEvent>, mut runtime: ResMut<VisRuntime>) {
    for _ in events.read() {
        runtime.sim.toggle_pause();
        tracing::info!("Simulation {}", if runtime.sim.is_paused() { "paused" } else { "resumed" });
    }
}
