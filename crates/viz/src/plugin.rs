//! Main visualization plugin that ties all systems together.

use std::time::Duration;

use bevy::asset::LoadState;
use bevy::log::LogPlugin;
use bevy::prelude::*;
use bevy::time::common_conditions::on_timer;

use crate::camera::CameraPlugin;
use crate::runtime::{apply_clear_color, run_frame, setup_scene, toggle_pause, VisRuntime};

/// App lifecycle: preload configured images, then build and run the scene.
#[derive(States, Default, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VisState {
    #[default]
    Loading,
    Running,
}

/// Handles requested by `VisOptions::images`, kept until they settle.
#[derive(Resource, Default)]
pub struct PendingImages(pub Vec<Handle<Image>>);

/// Main plugin for the scene visualization.
///
/// A [`VisRuntime`] resource must be inserted before this plugin is added;
/// window size and frame rate are taken from it. Bevy's log plugin is left
/// out, so install a `tracing` subscriber first.
pub struct VisPlugin {
    pub title: String,
}

impl Default for VisPlugin {
    fn default() -> Self {
        Self {
            title: "Scene Reconciler".into(),
        }
    }
}

impl Plugin for VisPlugin {
    fn build(&self, app: &mut App) {
        let Some(runtime) = app.world().get_resource::<VisRuntime>() else {
            tracing::error!("VisRuntime must be inserted before VisPlugin");
            return;
        };
        let max_fps = runtime.options().max_fps;
        let resolution = window_resolution(runtime.sim.width() as f32, runtime.sim.height() as f32);

        app.add_plugins(
            DefaultPlugins
                .set(WindowPlugin {
                    primary_window: Some(Window {
                        title: self.title.clone(),
                        resolution: resolution.into(),
                        ..default()
                    }),
                    ..default()
                })
                .disable::<LogPlugin>(),
        )
        .add_plugins(CameraPlugin)
        .init_state::<VisState>()
        .init_resource::<PendingImages>()
        .add_systems(Startup, (apply_clear_color, preload_images))
        .add_systems(Update, wait_for_images.run_if(in_state(VisState::Loading)))
        .add_systems(OnEnter(VisState::Running), setup_scene)
        .add_systems(Update, toggle_pause.run_if(in_state(VisState::Running)));

        if max_fps > 0.0 {
            tracing::info!(max_fps, "Frame rate capped");
            app.add_systems(
                Update,
                run_frame
                    .run_if(in_state(VisState::Running))
                    .run_if(on_timer(Duration::from_secs_f32(1.0 / max_fps))),
            );
        } else {
            app.add_systems(Update, run_frame.run_if(in_state(VisState::Running)));
        }
    }
}

/// Window size for a grid: the grid itself, kept within sensible bounds.
pub fn window_resolution(width: f32, height: f32) -> (f32, f32) {
    (width.clamp(480.0, 1600.0), height.clamp(360.0, 1000.0))
}

fn preload_images(
    asset_server: Res<AssetServer>,
    runtime: Res<VisRuntime>,
    mut pending: ResMut<PendingImages>,
) {
    let images = &runtime.options().images;
    tracing::info!(count = images.len(), "Preloading images");
    pending.0 = images.iter().map(|path| asset_server.load(path.clone())).collect();
}

/// True once no handle is still loading.
pub fn all_settled(states: impl IntoIterator<Item = Option<LoadState>>) -> bool {
    states
        .into_iter()
        .all(|state| matches!(state, Some(LoadState::Loaded) | Some(LoadState::Failed(_))))
}

fn wait_for_images(
    asset_server: Res<AssetServer>,
    pending: Res<PendingImages>,
    mut next_state: ResMut<NextState<VisState>>,
) {
    let states = pending.0.iter().map(|handle| asset_server.get_load_state(handle.id()));
    if !all_settled(states) {
        return;
    }
    for handle in &pending.0 {
        if let Some(LoadState::Failed(err)) = asset_server.get_load_state(handle.id()) {
            tracing::warn!(error = %err, "Image failed to load");
        }
    }
    tracing::info!("Images ready, starting scene");
    next_state.set(VisState::Running);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_resolution_clamped() {
        assert_eq!(window_resolution(800.0, 600.0), (800.0, 600.0));
        assert_eq!(window_resolution(100.0, 5000.0), (480.0, 1000.0));
    }

    #[test]
    fn test_all_settled() {
        assert!(all_settled(Vec::new()));
        assert!(all_settled(vec![Some(LoadState::Loaded)]));
        assert!(!all_settled(vec![Some(LoadState::Loaded), Some(LoadState::Loading)]));
        assert!(!all_settled(vec![None]));
    }
}
