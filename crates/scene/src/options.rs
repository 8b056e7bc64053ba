//! Visual options: how each agent kind and the background are drawn.
//!
//! Every style field is an [`Attr`], so any option can be a constant or a
//! callback. Constants usually come from a [`VisConfig`](crate::VisConfig);
//! callbacks are layered on in code.

use std::fmt;
use std::sync::Arc;

use sim_core::{Agent, AgentKind, Simulation};

use crate::attr::Attr;
use crate::colors;
use crate::layers::LayerBatching;
use crate::text::{TextAlign, TextPosition};

/// Attribute evaluated against an agent.
pub type AgentAttr<T> = Attr<Agent, T>;
/// Attribute evaluated against the simulation.
pub type SimAttr<T> = Attr<Simulation, T>;

/// Style of one agent kind.
///
/// Fields that only make sense for some kinds are ignored elsewhere:
/// `text_position`/`text_padding` apply to squares and zones,
/// `text_rotate`/`text_max_width` to actors, `tile` to zones.
#[derive(Debug, Clone)]
pub struct AgentStyle {
    pub tint: AgentAttr<u32>,
    pub alpha: AgentAttr<f32>,
    /// Image asset path; `None` falls back to a shape texture.
    pub image: AgentAttr<Option<String>>,
    /// Label content; `None` or empty means no label.
    pub text: AgentAttr<Option<String>>,
    pub text_position: AgentAttr<TextPosition>,
    pub text_padding: AgentAttr<f32>,
    pub text_align: AgentAttr<TextAlign>,
    pub text_tint: AgentAttr<u32>,
    pub text_alpha: AgentAttr<f32>,
    pub font_name: AgentAttr<Option<String>>,
    pub font_size: AgentAttr<f32>,
    /// Keep actor labels rotating with the actor instead of upright.
    pub text_rotate: AgentAttr<bool>,
    pub text_max_width: AgentAttr<f32>,
    /// Draw a filled, outlined shape instead of a plain white one.
    pub advanced: AgentAttr<bool>,
    pub line_color: AgentAttr<u32>,
    pub line_alpha: AgentAttr<f32>,
    pub line_width: AgentAttr<f32>,
    pub line_align: AgentAttr<f32>,
    pub fill_color: AgentAttr<u32>,
    pub fill_alpha: AgentAttr<f32>,
    /// Tile the zone texture at grid-step size instead of stretching it.
    pub tile: AgentAttr<bool>,
}

impl Default for AgentStyle {
    fn default() -> Self {
        Self {
            tint: Attr::Constant(colors::WHITE),
            alpha: Attr::Constant(1.0),
            image: Attr::Constant(None),
            text: Attr::Constant(None),
            text_position: Attr::Constant(TextPosition::Center),
            text_padding: Attr::Constant(3.0),
            text_align: Attr::Constant(TextAlign::Center),
            text_tint: Attr::Constant(colors::BLACK),
            text_alpha: Attr::Constant(1.0),
            font_name: Attr::Constant(None),
            font_size: Attr::Constant(16.0),
            text_rotate: Attr::Constant(false),
            text_max_width: Attr::Constant(0.0),
            advanced: Attr::Constant(false),
            line_color: Attr::Constant(colors::BLACK),
            line_alpha: Attr::Constant(1.0),
            line_width: Attr::Constant(1.0),
            line_align: Attr::Constant(0.5),
            fill_color: Attr::Constant(colors::WHITE),
            fill_alpha: Attr::Constant(1.0),
            tile: Attr::Constant(false),
        }
    }
}

impl AgentStyle {
    /// Whether any attribute that shapes the generated texture is a callback.
    pub fn has_dynamic_shape(&self) -> bool {
        self.advanced.is_dynamic()
            || self.line_color.is_dynamic()
            || self.line_alpha.is_dynamic()
            || self.line_width.is_dynamic()
            || self.line_align.is_dynamic()
            || self.fill_color.is_dynamic()
            || self.fill_alpha.is_dynamic()
    }
}

/// Style of the optional full-scene background sprite.
#[derive(Debug, Clone)]
pub struct BackgroundStyle {
    pub enabled: bool,
    pub tint: SimAttr<u32>,
    pub alpha: SimAttr<f32>,
    pub image: SimAttr<Option<String>>,
    /// Tile the image at grid-step size.
    pub tile: bool,
}

impl Default for BackgroundStyle {
    fn default() -> Self {
        Self {
            enabled: false,
            tint: Attr::Constant(colors::WHITE),
            alpha: Attr::Constant(1.0),
            image: Attr::Constant(None),
            tile: false,
        }
    }
}

/// When the middle layer is re-keyed and re-sorted after a frame.
#[derive(Clone, Default)]
pub enum ZIndexUpdate {
    #[default]
    Never,
    Always,
    /// Re-sort on frames where the predicate holds.
    When(Arc<dyn Fn(&Simulation) -> bool + Send + Sync>),
}

impl ZIndexUpdate {
    pub fn when(f: impl Fn(&Simulation) -> bool + Send + Sync + 'static) -> Self {
        ZIndexUpdate::When(Arc::new(f))
    }

    /// Whether draw-order keys may change at all.
    pub fn is_enabled(&self) -> bool {
        !matches!(self, ZIndexUpdate::Never)
    }

    /// Whether to re-key on this frame.
    pub fn fires(&self, sim: &Simulation) -> bool {
        match self {
            ZIndexUpdate::Never => false,
            ZIndexUpdate::Always => true,
            ZIndexUpdate::When(f) => f(sim),
        }
    }
}

impl fmt::Debug for ZIndexUpdate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ZIndexUpdate::Never => f.write_str("Never"),
            ZIndexUpdate::Always => f.write_str("Always"),
            ZIndexUpdate::When(_) => f.write_str("When(..)"),
        }
    }
}

/// Which callback-valued attributes are re-evaluated every frame.
///
/// A callback whose toggle is off is still evaluated once at creation.
#[derive(Debug, Clone)]
pub struct UpdateToggles {
    pub tint: bool,
    pub alpha: bool,
    pub image: bool,
    pub text: bool,
    pub text_tint: bool,
    pub text_alpha: bool,
    pub font_name: bool,
    pub font_size: bool,
    /// Refresh actor size from its radius.
    pub radius: bool,
    /// Refresh actor rotation from its pointing/heading.
    pub pointing: bool,
    /// Regenerate shape textures when advanced styling callbacks change.
    pub shape: bool,
    pub z_index: ZIndexUpdate,
}

impl Default for UpdateToggles {
    fn default() -> Self {
        Self {
            tint: true,
            alpha: true,
            image: true,
            text: false,
            text_tint: false,
            text_alpha: false,
            font_name: false,
            font_size: false,
            radius: false,
            pointing: false,
            shape: false,
            z_index: ZIndexUpdate::Never,
        }
    }
}

/// Complete set of options for a [`Reconciler`](crate::Reconciler).
#[derive(Debug, Clone)]
pub struct VisOptions {
    /// Start ticking once set up.
    pub run: bool,
    /// Frame rate cap for the driver; zero means uncapped.
    pub max_fps: f32,
    /// Tear the scene down when the simulation finishes.
    pub cleanup: bool,
    /// Image assets to load before setup.
    pub images: Vec<String>,
    /// Clear color behind everything.
    pub base_color: u32,
    pub base_alpha: f32,
    /// Radius of the shared circle texture for basic actors.
    pub basic_circle_radius: f32,
    /// Oversampling factor for advanced actor circles.
    pub advanced_circle_scale: f32,
    pub back_batching: LayerBatching,
    pub middle_batching: LayerBatching,
    pub front_batching: LayerBatching,
    pub background: BackgroundStyle,
    pub square: AgentStyle,
    pub zone: AgentStyle,
    pub actor: AgentStyle,
    pub update: UpdateToggles,
}

impl Default for VisOptions {
    fn default() -> Self {
        Self {
            run: true,
            max_fps: 0.0,
            cleanup: false,
            images: Vec::new(),
            base_color: 0x808080,
            base_alpha: 1.0,
            basic_circle_radius: 64.0,
            advanced_circle_scale: 5.0,
            back_batching: LayerBatching::Standard,
            middle_batching: LayerBatching::Standard,
            front_batching: LayerBatching::Standard,
            background: BackgroundStyle::default(),
            square: AgentStyle::default(),
            zone: AgentStyle::default(),
            actor: AgentStyle::default(),
            update: UpdateToggles::default(),
        }
    }
}

impl VisOptions {
    /// Style for an agent kind.
    pub fn style(&self, kind: AgentKind) -> &AgentStyle {
        match kind {
            AgentKind::Square => &self.square,
            AgentKind::Zone => &self.zone,
            AgentKind::Actor => &self.actor,
        }
    }
}
