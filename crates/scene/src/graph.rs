//! The retained-mode scene graph the reconciler drives.
//!
//! Rendering libraries implement [`SceneGraph`]; the reconciler only ever
//! talks to the scene through this trait. Coordinates are simulation units
//! with y growing downward. Children are positioned relative to their
//! parent's origin.

use std::fmt;
use std::hash::Hash;

use crate::layers::{DrawLayer, LayerBatching};
use crate::shape::ShapeSpec;
use crate::text::TextAlign;

/// Parameters for a new sprite.
#[derive(Debug, Clone, PartialEq)]
pub struct SpriteDesc<T> {
    pub texture: T,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    /// Fraction of the sprite's size placed at `(x, y)`; `(0, 0)` = top-left.
    pub anchor: (f32, f32),
    pub rotation: f32,
    pub tint: u32,
    pub alpha: f32,
    /// Repeat the texture every `tile` units instead of stretching it.
    pub tile: Option<f32>,
    pub draw_key: f64,
}

/// Parameters for a new text label.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelDesc {
    pub content: String,
    pub font_name: Option<String>,
    pub font_size: f32,
    pub align: TextAlign,
    pub tint: u32,
    pub alpha: f32,
    pub x: f32,
    pub y: f32,
    pub anchor: (f32, f32),
    /// Wrap width; zero means no wrapping.
    pub max_width: f32,
    pub rotation: f32,
}

/// A single property write on an existing node.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeProp<T> {
    Texture(T),
    Tint(u32),
    Alpha(f32),
    Position { x: f32, y: f32 },
    Size { width: f32, height: f32 },
    Rotation(f32),
    /// Sort key within the parent, applied by [`SceneGraph::sort_children`].
    DrawKey(f64),
    Text(String),
    TextTint(u32),
    TextAlpha(f32),
    FontName(Option<String>),
    FontSize(f32),
}

/// Discriminant of a [`NodeProp`], for bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PropKind {
    Texture,
    Tint,
    Alpha,
    Position,
    Size,
    Rotation,
    DrawKey,
    Text,
    TextTint,
    TextAlpha,
    FontName,
    FontSize,
}

impl<T> NodeProp<T> {
    pub fn kind(&self) -> PropKind {
        match self {
            NodeProp::Texture(_) => PropKind::Texture,
            NodeProp::Tint(_) => PropKind::Tint,
            NodeProp::Alpha(_) => PropKind::Alpha,
            NodeProp::Position { .. } => PropKind::Position,
            NodeProp::Size { .. } => PropKind::Size,
            NodeProp::Rotation(_) => PropKind::Rotation,
            NodeProp::DrawKey(_) => PropKind::DrawKey,
            NodeProp::Text(_) => PropKind::Text,
            NodeProp::TextTint(_) => PropKind::TextTint,
            NodeProp::TextAlpha(_) => PropKind::TextAlpha,
            NodeProp::FontName(_) => PropKind::FontName,
            NodeProp::FontSize(_) => PropKind::FontSize,
        }
    }
}

/// A retained-mode 2D scene graph.
///
/// Nodes are created detached and become visible once attached under the
/// root (directly or through a layer).
pub trait SceneGraph {
    /// Handle to a display object.
    type Node: Copy + Eq + Hash + fmt::Debug;
    /// Handle to a texture.
    type Texture: Clone + PartialEq + fmt::Debug;

    /// The node everything else hangs from.
    fn root(&self) -> Self::Node;

    /// Create an empty container for one draw layer.
    fn create_layer(&mut self, layer: DrawLayer, batching: LayerBatching) -> Self::Node;

    /// The library's plain white texture.
    fn white_texture(&mut self) -> Self::Texture;

    /// Texture for an image asset. Repeated paths may share a handle.
    fn image_texture(&mut self, path: &str) -> Self::Texture;

    /// Generate a texture for a shape.
    fn shape_texture(&mut self, shape: &ShapeSpec) -> Self::Texture;

    fn create_sprite(&mut self, sprite: &SpriteDesc<Self::Texture>) -> Self::Node;

    fn create_label(&mut self, label: &LabelDesc) -> Self::Node;

    /// Attach `child` under `parent`, moving it if already attached elsewhere.
    fn attach(&mut self, parent: Self::Node, child: Self::Node);

    /// Detach a node from its parent and destroy it with its children.
    fn remove(&mut self, node: Self::Node);

    fn set(&mut self, node: Self::Node, prop: NodeProp<Self::Texture>);

    /// Reorder `parent`'s children by draw key, keeping ties in order.
    fn sort_children(&mut self, parent: Self::Node);

    /// Destroy everything under the root.
    fn teardown(&mut self);
}
