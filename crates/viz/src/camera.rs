//! Camera: fits the grid on startup, then pans, zooms and glides home.

use bevy::input::mouse::{MouseMotion, MouseWheel};
use bevy::prelude::*;

use crate::runtime::VisRuntime;

/// Keyboard pan speed in screen pixels per second; doubled with Shift.
const KEY_PAN_SPEED: f32 = 480.0;
/// Zoom factor per `=`/`-` press and per wheel line.
const ZOOM_STEP: f32 = 1.25;
const HOME_GLIDE_SECONDS: f32 = 0.4;

pub struct CameraPlugin;

impl Plugin for CameraPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<CameraController>()
            .add_event::<PlayPauseEvent>()
            .add_systems(Startup, setup_camera)
            .add_systems(
                Update,
                (mouse_input, keyboard_input, advance_glide, sync_transform).chain(),
            );
    }
}

/// Sent when Space is pressed.
#[derive(Event)]
pub struct PlayPauseEvent;

/// Zoom range and the area the camera centre may roam.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewLimits {
    pub min_zoom: f32,
    pub max_zoom: f32,
    /// Half the grid size; the centre stays within it when set.
    pub half_extent: Option<Vec2>,
}

impl Default for ViewLimits {
    fn default() -> Self {
        Self {
            min_zoom: 0.25,
            max_zoom: 4.0,
            half_extent: None,
        }
    }
}

impl ViewLimits {
    fn zoom(&self, zoom: f32) -> f32 {
        zoom.clamp(self.min_zoom, self.max_zoom)
    }

    fn position(&self, position: Vec2) -> Vec2 {
        match self.half_extent {
            Some(half) => position.clamp(-half, half),
            None => position,
        }
    }
}

/// Eased move from one view to another.
#[derive(Clone, Debug)]
pub struct Glide {
    from: (Vec2, f32),
    to: (Vec2, f32),
    elapsed: f32,
    duration: f32,
}

impl Glide {
    /// Advance by `dt` seconds; returns the view and whether the glide is done.
    fn step(&mut self, dt: f32) -> (Vec2, f32, bool) {
        self.elapsed += dt;
        if self.duration <= 0.0 || self.elapsed >= self.duration {
            return (self.to.0, self.to.1, true);
        }
        let t = smoothstep(self.elapsed / self.duration);
        let position = self.from.0.lerp(self.to.0, t);
        let zoom = self.from.1 + (self.to.1 - self.from.1) * t;
        (position, zoom, false)
    }
}

fn smoothstep(t: f32) -> f32 {
    t * t * (3.0 - 2.0 * t)
}

/// View state of the main camera. Zoom is screen pixels per world unit.
#[derive(Resource, Clone, Debug)]
pub struct CameraController {
    pub position: Vec2,
    pub zoom: f32,
    /// Zoom at which the whole grid fits the window.
    pub home_zoom: f32,
    pub limits: ViewLimits,
    pub glide: Option<Glide>,
}

impl Default for CameraController {
    fn default() -> Self {
        Self {
            position: Vec2::ZERO,
            zoom: 1.0,
            home_zoom: 1.0,
            limits: ViewLimits::default(),
            glide: None,
        }
    }
}

impl CameraController {
    /// Centre on a `grid` sized area and zoom so it fills `window`.
    pub fn fit_to_grid(&mut self, grid: Vec2, window: Vec2) {
        let zoom = if grid.x > 0.0 && grid.y > 0.0 {
            (window.x / grid.x).min(window.y / grid.y)
        } else {
            1.0
        };
        self.position = Vec2::ZERO;
        self.zoom = zoom;
        self.home_zoom = zoom;
        self.limits = ViewLimits {
            min_zoom: zoom * 0.5,
            max_zoom: zoom * 8.0,
            half_extent: Some(grid / 2.0),
        };
        self.glide = None;
    }

    /// Move by `pixels` of screen distance, y up.
    pub fn pan(&mut self, pixels: Vec2) {
        self.glide = None;
        self.position = self.limits.position(self.position + pixels / self.zoom);
    }

    /// Multiply the zoom by `factor`, keeping `anchor` at the same screen spot.
    pub fn zoom_about(&mut self, factor: f32, anchor: Vec2) {
        self.glide = None;
        let zoom = self.limits.zoom(self.zoom * factor);
        let position = anchor - (anchor - self.position) * (self.zoom / zoom);
        self.zoom = zoom;
        self.position = self.limits.position(position);
    }

    /// Start an eased return to the fitted view.
    pub fn glide_home(&mut self, seconds: f32) {
        self.glide = Some(Glide {
            from: (self.position, self.zoom),
            to: (Vec2::ZERO, self.home_zoom),
            elapsed: 0.0,
            duration: seconds,
        });
    }

    /// Step a running glide by `dt` seconds.
    pub fn advance(&mut self, dt: f32) {
        let Some(glide) = self.glide.as_mut() else {
            return;
        };
        let (position, zoom, done) = glide.step(dt);
        self.position = position;
        self.zoom = zoom;
        if done {
            self.glide = None;
        }
    }
}

#[derive(Component)]
pub struct MainCamera;

fn setup_camera(
    mut commands: Commands,
    mut controller: ResMut<CameraController>,
    runtime: Option<Res<VisRuntime>>,
    windows: Query<&Window>,
) {
    commands.spawn((Camera2dBundle::default(), MainCamera));

    let (Some(runtime), Ok(window)) = (runtime, windows.get_single()) else {
        return;
    };
    let grid = Vec2::new(runtime.sim.width() as f32, runtime.sim.height() as f32);
    controller.fit_to_grid(grid, Vec2::new(window.width(), window.height()));
    tracing::debug!(zoom = controller.zoom, "Camera fitted to grid");
}

/// Drag with the right or middle button to pan; the wheel zooms about the cursor.
fn mouse_input(
    mut controller: ResMut<CameraController>,
    buttons: Res<ButtonInput<MouseButton>>,
    mut motion: EventReader<MouseMotion>,
    mut wheel: EventReader<MouseWheel>,
    windows: Query<&Window>,
    cameras: Query<(&Camera, &GlobalTransform), With<MainCamera>>,
) {
    if buttons.any_pressed([MouseButton::Right, MouseButton::Middle]) {
        let drag: Vec2 = motion.read().map(|event| event.delta).sum();
        if drag != Vec2::ZERO {
            controller.pan(Vec2::new(-drag.x, drag.y));
        }
    } else {
        motion.clear();
    }

    let lines: f32 = wheel.read().map(|event| event.y).sum();
    if lines == 0.0 {
        return;
    }
    let cursor = windows
        .get_single()
        .ok()
        .and_then(Window::cursor_position)
        .and_then(|cursor| {
            let (camera, transform) = cameras.get_single().ok()?;
            camera.viewport_to_world_2d(transform, cursor)
        });
    let anchor = cursor.unwrap_or(controller.position);
    controller.zoom_about(ZOOM_STEP.powf(lines), anchor);
}

/// Unit direction from the held arrow keys.
fn arrow_direction(keyboard: &ButtonInput<KeyCode>) -> Vec2 {
    let axis = |negative, positive| {
        keyboard.pressed(positive) as i8 as f32 - keyboard.pressed(negative) as i8 as f32
    };
    Vec2::new(
        axis(KeyCode::ArrowLeft, KeyCode::ArrowRight),
        axis(KeyCode::ArrowDown, KeyCode::ArrowUp),
    )
    .normalize_or_zero()
}

/// Arrows pan, `=`/`-` zoom, Home glides back, Space toggles pause.
fn keyboard_input(
    mut controller: ResMut<CameraController>,
    keyboard: Res<ButtonInput<KeyCode>>,
    time: Res<Time>,
    mut play_pause: EventWriter<PlayPauseEvent>,
) {
    let direction = arrow_direction(&keyboard);
    if direction != Vec2::ZERO {
        let fast = keyboard.any_pressed([KeyCode::ShiftLeft, KeyCode::ShiftRight]);
        let speed = if fast { KEY_PAN_SPEED * 2.0 } else { KEY_PAN_SPEED };
        controller.pan(direction * speed * time.delta_seconds());
    }

    let centre = controller.position;
    if keyboard.just_pressed(KeyCode::Equal) {
        controller.zoom_about(ZOOM_STEP, centre);
    }
    if keyboard.just_pressed(KeyCode::Minus) {
        controller.zoom_about(ZOOM_STEP.recip(), centre);
    }
    if keyboard.just_pressed(KeyCode::Home) {
        controller.glide_home(HOME_GLIDE_SECONDS);
    }
    if keyboard.just_pressed(KeyCode::Space) {
        play_pause.send(PlayPauseEvent);
    }
}

fn advance_glide(mut controller: ResMut<CameraController>, time: Res<Time>) {
    if controller.glide.is_some() {
        controller.advance(time.delta_seconds());
    }
}

fn sync_transform(
    controller: Res<CameraController>,
    mut cameras: Query<&mut Transform, With<MainCamera>>,
) {
    let scale = controller.zoom.recip();
    for mut transform in cameras.iter_mut() {
        transform.translation.x = controller.position.x;
        transform.translation.y = controller.position.y;
        transform.scale = Vec3::new(scale, scale, 1.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fitted() -> CameraController {
        let mut controller = CameraController::default();
        controller.fit_to_grid(Vec2::new(400.0, 100.0), Vec2::new(800.0, 600.0));
        controller
    }

    #[test]
    fn test_fit_to_grid_uses_tighter_axis() {
        let controller = fitted();
        assert_eq!(controller.zoom, 2.0);
        assert_eq!(controller.home_zoom, 2.0);
        assert_eq!(controller.limits.min_zoom, 1.0);
        assert_eq!(controller.limits.max_zoom, 16.0);
        assert_eq!(controller.limits.half_extent, Some(Vec2::new(200.0, 50.0)));

        let mut empty = CameraController::default();
        empty.fit_to_grid(Vec2::ZERO, Vec2::new(800.0, 600.0));
        assert_eq!(empty.zoom, 1.0);
    }

    #[test]
    fn test_pan_scales_by_zoom_and_stays_on_grid() {
        let mut controller = fitted();
        controller.pan(Vec2::new(20.0, -10.0));
        assert_eq!(controller.position, Vec2::new(10.0, -5.0));

        controller.pan(Vec2::new(5000.0, -5000.0));
        assert_eq!(controller.position, Vec2::new(200.0, -50.0));
    }

    #[test]
    fn test_zoom_about_keeps_anchor_on_screen() {
        let mut controller = fitted();
        let anchor = Vec2::new(40.0, 10.0);
        let before = (anchor - controller.position) * controller.zoom;

        controller.zoom_about(2.0, anchor);
        let after = (anchor - controller.position) * controller.zoom;
        assert_eq!(controller.zoom, 4.0);
        assert!((before - after).length() < 1e-4);

        controller.zoom_about(100.0, anchor);
        assert_eq!(controller.zoom, 16.0);
        controller.zoom_about(0.001, anchor);
        assert_eq!(controller.zoom, 1.0);
    }

    #[test]
    fn test_glide_home_lands_on_fitted_view() {
        let mut controller = fitted();
        controller.pan(Vec2::new(100.0, 40.0));
        controller.zoom_about(2.0, controller.position);
        let start = controller.position;

        controller.glide_home(1.0);
        controller.advance(0.5);
        assert!((controller.position - start / 2.0).length() < 1e-4);
        assert_eq!(controller.zoom, 3.0);

        controller.advance(0.6);
        assert_eq!(controller.position, Vec2::ZERO);
        assert_eq!(controller.zoom, 2.0);
        assert!(controller.glide.is_none());
    }

    #[test]
    fn test_manual_input_cancels_glide() {
        let mut controller = fitted();
        controller.pan(Vec2::new(100.0, 0.0));
        controller.glide_home(1.0);
        controller.advance(0.1);
        controller.pan(Vec2::new(2.0, 0.0));
        assert!(controller.glide.is_none());

        let resting = controller.position;
        controller.advance(1.0);
        assert_eq!(controller.position, resting);
    }
}
