//! Scene reconciliation: keeps a retained-mode 2D scene graph in step with
//! a grid simulation.
//!
//! The [`Reconciler`] drives any [`SceneGraph`] implementation. Styles are
//! [`VisOptions`], usually loaded from a [`VisConfig`] TOML file and then
//! extended with callbacks in code. [`RetainedScene`] is an in-memory graph
//! for headless runs and tests.

pub mod attr;
pub mod colors;
pub mod config;
pub mod graph;
pub mod hooks;
pub mod layers;
pub mod options;
pub mod reconciler;
pub mod record;
pub mod retained;
pub mod shape;
pub mod text;

pub use attr::Attr;
pub use config::{default_config_toml, ConfigError, TomlSerializeError, VisConfig};
pub use graph::{LabelDesc, NodeProp, PropKind, SceneGraph, SpriteDesc};
pub use hooks::{Hook, Hooks};
pub use layers::{DrawLayer, LayerBatching, Layers};
pub use options::{AgentAttr, AgentStyle, BackgroundStyle, SimAttr, UpdateToggles, VisOptions, ZIndexUpdate};
pub use reconciler::{FrameOutcome, ReconcileStats, Reconciler, Status};
pub use record::{CachedShape, DisplayRecord, Label, RecordHints};
pub use retained::{NodeId, NodeKind, RetainedScene, TextureId, TextureSource};
pub use shape::{rasterize, Outline, RgbaImage, ShapeKey, ShapeSpec};
pub use text::{TextAlign, TextPosition};
