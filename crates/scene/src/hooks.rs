//! Caller-supplied callbacks around setup and each frame.

use sim_core::Simulation;

use crate::graph::SceneGraph;

/// A callback given the simulation and the scene graph.
pub type Hook<N, T> =
    Box<dyn FnMut(&mut Simulation, &mut dyn SceneGraph<Node = N, Texture = T>) + Send + Sync>;

/// The only points where caller logic runs inside the frame loop.
pub struct Hooks<N, T> {
    pub before_setup: Option<Hook<N, T>>,
    pub after_setup: Option<Hook<N, T>>,
    pub before_tick: Option<Hook<N, T>>,
    pub after_tick: Option<Hook<N, T>>,
    /// Runs once, on the first frame that sees the simulation finished.
    pub finished: Option<Hook<N, T>>,
}

impl<N, T> Default for Hooks<N, T> {
    fn default() -> Self {
        Self {
            before_setup: None,
            after_setup: None,
            before_tick: None,
            after_tick: None,
            finished: None,
        }
    }
}

impl<N, T> Hooks<N, T> {
    pub fn before_setup(
        mut self,
        f: impl FnMut(&mut Simulation, &mut dyn SceneGraph<Node = N, Texture = T>) + Send + Sync + 'static,
    ) -> Self {
        self.before_setup = Some(Box::new(f));
        self
    }

    pub fn after_setup(
        mut self,
        f: impl FnMut(&mut Simulation, &mut dyn SceneGraph<Node = N, Texture = T>) + Send + Sync + 'static,
    ) -> Self {
        self.after_setup = Some(Box::new(f));
        self
    }

    pub fn before_tick(
        mut self,
        f: impl FnMut(&mut Simulation, &mut dyn SceneGraph<Node = N, Texture = T>) + Send + Sync + 'static,
    ) -> Self {
        self.before_tick = Some(Box::new(f));
        self
    }

    pub fn after_tick(
        mut self,
        f: impl FnMut(&mut Simulation, &mut dyn SceneGraph<Node = N, Texture = T>) + Send + Sync + 'static,
    ) -> Self {
        self.after_tick = Some(Box::new(f));
        self
    }

    pub fn finished(
        mut self,
        f: impl FnMut(&mut Simulation, &mut dyn SceneGraph<Node = N, Texture = T>) + Send + Sync + 'static,
    ) -> Self {
        self.finished = Some(Box::new(f));
        self
    }
}

impl<N, T> std::fmt::Debug for Hooks<N, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Hooks")
            .field("before_setup", &self.before_setup.is_some())
            .field("after_setup", &self.after_setup.is_some())
            .field("before_tick", &self.before_tick.is_some())
            .field("after_tick", &self.after_tick.is_some())
            .field("finished", &self.finished.is_some())
            .finish()
    }
}

/// Run a hook if one is set.
pub(crate) fn run_hook<G>(hook: &mut Option<Hook<G::Node, G::Texture>>, sim: &mut Simulation, scene: &mut G)
where
    G: SceneGraph,
{
    if let Some(hook) = hook.as_mut() {
        let scene: &mut dyn SceneGraph<Node = G::Node, Texture = G::Texture> = scene;
        hook(sim, scene);
    }
}
