//! In-memory scene graph for tests and headless runs.
//!
//! Keeps every node's properties and a log of property writes so callers can
//! check exactly what the reconciler touched.

use std::collections::HashMap;

use crate::graph::{LabelDesc, NodeProp, PropKind, SceneGraph, SpriteDesc};
use crate::layers::{DrawLayer, LayerBatching};
use crate::shape::ShapeSpec;
use crate::text::TextAlign;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureId(pub usize);

/// What a texture was made from.
#[derive(Debug, Clone, PartialEq)]
pub enum TextureSource {
    White,
    Image(String),
    Shape(ShapeSpec),
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Root,
    Layer(DrawLayer, LayerBatching),
    Sprite,
    Label,
}

/// Text state of a label node.
#[derive(Debug, Clone, PartialEq)]
pub struct TextState {
    pub content: String,
    pub font_name: Option<String>,
    pub font_size: f32,
    pub align: TextAlign,
    pub tint: u32,
    pub alpha: f32,
    pub max_width: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RetainedNode {
    pub kind: NodeKind,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    pub texture: Option<TextureId>,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub anchor: (f32, f32),
    pub rotation: f32,
    pub tint: u32,
    pub alpha: f32,
    pub tile: Option<f32>,
    pub draw_key: f64,
    pub text: Option<TextState>,
}

impl RetainedNode {
    fn empty(kind: NodeKind) -> Self {
        Self {
            kind,
            parent: None,
            children: Vec::new(),
            texture: None,
            x: 0.0,
            y: 0.0,
            width: 0.0,
            height: 0.0,
            anchor: (0.0, 0.0),
            rotation: 0.0,
            tint: 0xffffff,
            alpha: 1.0,
            tile: None,
            draw_key: 0.0,
            text: None,
        }
    }
}

/// A scene graph that only stores state.
#[derive(Debug)]
pub struct RetainedScene {
    nodes: Vec<Option<RetainedNode>>,
    textures: Vec<TextureSource>,
    image_cache: HashMap<String, TextureId>,
    writes: Vec<(NodeId, PropKind)>,
    generated_shapes: usize,
}

impl Default for RetainedScene {
    fn default() -> Self {
        Self::new()
    }
}

impl RetainedScene {
    pub fn new() -> Self {
        Self {
            nodes: vec![Some(RetainedNode::empty(NodeKind::Root))],
            textures: vec![TextureSource::White],
            image_cache: HashMap::new(),
            writes: Vec::new(),
            generated_shapes: 0,
        }
    }

    /// A live node.
    pub fn node(&self, id: NodeId) -> Option<&RetainedNode> {
        self.nodes.get(id.0).and_then(|n| n.as_ref())
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.node(id).is_some()
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).and_then(|n| n.parent)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.node(id).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    pub fn texture(&self, id: TextureId) -> &TextureSource {
        &self.textures[id.0]
    }

    /// Number of live nodes, root included.
    pub fn live_nodes(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_some()).count()
    }

    /// Number of shape textures generated so far.
    pub fn generated_shapes(&self) -> usize {
        self.generated_shapes
    }

    /// Sprites in the order they would be drawn.
    pub fn draw_order(&self) -> Vec<NodeId> {
        let mut out = Vec::new();
        self.collect_sprites(self.root(), &mut out);
        out
    }

    fn collect_sprites(&self, id: NodeId, out: &mut Vec<NodeId>) {
        for &child in self.children(id) {
            if matches!(self.node(child).map(|n| &n.kind), Some(NodeKind::Sprite)) {
                out.push(child);
            }
            self.collect_sprites(child, out);
        }
    }

    /// Every property write since the last [`clear_writes`](Self::clear_writes).
    pub fn writes(&self) -> &[(NodeId, PropKind)] {
        &self.writes
    }

    /// How many times a property was written on a node.
    pub fn write_count(&self, id: NodeId, kind: PropKind) -> usize {
        self.writes
            .iter()
            .filter(|(node, prop)| *node == id && *prop == kind)
            .count()
    }

    pub fn clear_writes(&mut self) {
        self.writes.clear();
    }

    fn push(&mut self, node: RetainedNode) -> NodeId {
        self.nodes.push(Some(node));
        NodeId(self.nodes.len() - 1)
    }

    fn node_mut(&mut self, id: NodeId) -> Option<&mut RetainedNode> {
        self.nodes.get_mut(id.0).and_then(|n| n.as_mut())
    }

    fn detach(&mut self, id: NodeId) {
        if let Some(parent) = self.parent(id) {
            if let Some(p) = self.node_mut(parent) {
                p.children.retain(|c| *c != id);
            }
        }
        if let Some(node) = self.node_mut(id) {
            node.parent = None;
        }
    }

    fn destroy(&mut self, id: NodeId) {
        let children = match self.nodes.get_mut(id.0).and_then(|n| n.take()) {
            Some(node) => node.children,
            None => return,
        };
        for child in children {
            self.destroy(child);
        }
    }
}

impl SceneGraph for RetainedScene {
    type Node = NodeId;
    type Texture = TextureId;

    fn root(&self) -> NodeId {
        NodeId(0)
    }

    fn create_layer(&mut self, layer: DrawLayer, batching: LayerBatching) -> NodeId {
        self.push(RetainedNode::empty(NodeKind::Layer(layer, batching)))
    }

    fn white_texture(&mut self) -> TextureId {
        TextureId(0)
    }

    fn image_texture(&mut self, path: &str) -> TextureId {
        if let Some(&id) = self.image_cache.get(path) {
            return id;
        }
        self.textures.push(TextureSource::Image(path.to_owned()));
        let id = TextureId(self.textures.len() - 1);
        self.image_cache.insert(path.to_owned(), id);
        id
    }

    fn shape_texture(&mut self, shape: &ShapeSpec) -> TextureId {
        self.generated_shapes += 1;
        self.textures.push(TextureSource::Shape(*shape));
        TextureId(self.textures.len() - 1)
    }

    fn create_sprite(&mut self, sprite: &SpriteDesc<TextureId>) -> NodeId {
        let mut node = RetainedNode::empty(NodeKind::Sprite);
        node.texture = Some(sprite.texture);
        node.x = sprite.x;
        node.y = sprite.y;
        node.width = sprite.width;
        node.height = sprite.height;
        node.anchor = sprite.anchor;
        node.rotation = sprite.rotation;
        node.tint = sprite.tint;
        node.alpha = sprite.alpha;
        node.tile = sprite.tile;
        node.draw_key = sprite.draw_key;
        self.push(node)
    }

    fn create_label(&mut self, label: &LabelDesc) -> NodeId {
        let mut node = RetainedNode::empty(NodeKind::Label);
        node.x = label.x;
        node.y = label.y;
        node.anchor = label.anchor;
        node.rotation = label.rotation;
        node.text = Some(TextState {
            content: label.content.clone(),
            font_name: label.font_name.clone(),
            font_size: label.font_size,
            align: label.align,
            tint: label.tint,
            alpha: label.alpha,
            max_width: label.max_width,
        });
        self.push(node)
    }

    fn attach(&mut self, parent: NodeId, child: NodeId) {
        if !self.contains(parent) || !self.contains(child) {
            return;
        }
        self.detach(child);
        if let Some(p) = self.node_mut(parent) {
            p.children.push(child);
        }
        if let Some(c) = self.node_mut(child) {
            c.parent = Some(parent);
        }
    }

    fn remove(&mut self, node: NodeId) {
        if node == self.root() {
            return;
        }
        self.detach(node);
        self.destroy(node);
    }

    fn set(&mut self, id: NodeId, prop: NodeProp<TextureId>) {
        let kind = prop.kind();
        let Some(node) = self.node_mut(id) else {
            return;
        };
        match prop {
            NodeProp::Texture(t) => node.texture = Some(t),
            NodeProp::Tint(v) => node.tint = v,
            NodeProp::Alpha(v) => node.alpha = v,
            NodeProp::Position { x, y } => {
                node.x = x;
                node.y = y;
            }
            NodeProp::Size { width, height } => {
                node.width = width;
                node.height = height;
            }
            NodeProp::Rotation(r) => node.rotation = r,
            NodeProp::DrawKey(k) => node.draw_key = k,
            NodeProp::Text(s) => {
                if let Some(text) = node.text.as_mut() {
                    text.content = s;
                }
            }
            NodeProp::TextTint(v) => {
                if let Some(text) = node.text.as_mut() {
                    text.tint = v;
                }
            }
            NodeProp::TextAlpha(v) => {
                if let Some(text) = node.text.as_mut() {
                    text.alpha = v;
                }
            }
            NodeProp::FontName(name) => {
                if let Some(text) = node.text.as_mut() {
                    text.font_name = name;
                }
            }
            NodeProp::FontSize(size) => {
                if let Some(text) = node.text.as_mut() {
                    text.font_size = size;
                }
            }
        }
        self.writes.push((id, kind));
    }

    fn sort_children(&mut self, parent: NodeId) {
        let Some(children) = self.node(parent).map(|n| n.children.clone()) else {
            return;
        };
        let mut keyed: Vec<(f64, NodeId)> = children
            .into_iter()
            .map(|c| (self.node(c).map(|n| n.draw_key).unwrap_or(0.0), c))
            .collect();
        keyed.sort_by(|a, b| a.0.total_cmp(&b.0));
        if let Some(p) = self.node_mut(parent) {
            p.children = keyed.into_iter().map(|(_, c)| c).collect();
        }
    }

    fn teardown(&mut self) {
        let root = self.root();
        for child in self.children(root).to_vec() {
            self.remove(child);
        }
    }
}
