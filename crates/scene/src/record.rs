//! Display records: what the reconciler keeps per tracked agent, and how
//! records are built and refreshed from agent styles.

use std::collections::HashMap;

use sim_core::{Agent, AgentKind, Simulation};

use crate::graph::{LabelDesc, NodeProp, SceneGraph, SpriteDesc};
use crate::layers::DrawLayer;
use crate::options::{AgentStyle, VisOptions};
use crate::shape::{LineStyle, Outline, ShapeKey, ShapeSpec};
use crate::text::{place_actor_label, place_box_label};

/// A text label attached to an agent's sprite.
#[derive(Debug, Clone, PartialEq)]
pub struct Label<N> {
    pub node: N,
    /// Last content written; empty when blanked.
    pub content: String,
}

/// Per-record flags fixed at creation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecordHints {
    /// Actor label rotates with the actor.
    pub text_rotate: bool,
    /// Zone texture is tiled at grid-step size.
    pub tiled: bool,
}

/// A shape texture in use by a record. `key` is `None` for the library's
/// white texture.
#[derive(Debug, Clone, PartialEq)]
pub struct CachedShape<T> {
    pub key: Option<ShapeKey>,
    pub texture: T,
}

/// The display object tracked for one agent.
#[derive(Debug, Clone)]
pub struct DisplayRecord<N, T> {
    pub node: N,
    pub layer: DrawLayer,
    /// Texture currently on the sprite.
    pub texture: T,
    pub image: Option<T>,
    /// Shape fallback, present when there is no image or the image may
    /// change.
    pub shape: Option<CachedShape<T>>,
    pub label: Option<Label<N>>,
    /// Rotation last written to the sprite.
    pub rotation: f32,
    pub hints: RecordHints,
}

impl<N, T> DisplayRecord<N, T> {
    /// Whether a non-empty label is shown.
    pub fn has_text(&self) -> bool {
        self.label.as_ref().is_some_and(|label| !label.content.is_empty())
    }
}

/// A generated texture and the number of records using it.
#[derive(Debug)]
struct SharedTexture<T> {
    texture: T,
    users: usize,
}

/// Generated shape textures shared between records with identical specs.
///
/// Entries are counted per user and dropped with their last user, which
/// releases the texture in backends whose handles are reference counted.
#[derive(Debug)]
pub(crate) struct ShapeCache<T> {
    textures: HashMap<ShapeKey, SharedTexture<T>>,
    white: Option<T>,
}

impl<T> Default for ShapeCache<T> {
    fn default() -> Self {
        Self {
            textures: HashMap::new(),
            white: None,
        }
    }
}

impl<T: Clone> ShapeCache<T> {
    /// Texture for a spec, generating it on first use. `None` is the white
    /// texture.
    pub fn fetch<G>(&mut self, spec: Option<&ShapeSpec>, scene: &mut G) -> CachedShape<T>
    where
        G: SceneGraph<Texture = T> + ?Sized,
    {
        match spec {
            None => {
                let texture = match &self.white {
                    Some(texture) => texture.clone(),
                    None => {
                        let texture = scene.white_texture();
                        self.white = Some(texture.clone());
                        texture
                    }
                };
                CachedShape { key: None, texture }
            }
            Some(spec) => {
                let key = spec.key();
                let shared = self.textures.entry(key).or_insert_with(|| {
                    tracing::debug!("Generating shape texture {:?}", spec.outline);
                    SharedTexture {
                        texture: scene.shape_texture(spec),
                        users: 0,
                    }
                });
                shared.users += 1;
                CachedShape {
                    key: Some(key),
                    texture: shared.texture.clone(),
                }
            }
        }
    }

    /// Give back a shape obtained from [`ShapeCache::fetch`].
    pub fn release(&mut self, shape: Option<&CachedShape<T>>) {
        let Some(key) = shape.and_then(|shape| shape.key) else {
            return;
        };
        let Some(shared) = self.textures.get_mut(&key) else {
            return;
        };
        shared.users = shared.users.saturating_sub(1);
        if shared.users == 0 {
            self.textures.remove(&key);
        }
    }

    pub fn len(&self) -> usize {
        self.textures.len()
    }

    pub fn clear(&mut self) {
        self.textures.clear();
        self.white = None;
    }
}

/// Which attributes of a kind are refreshed every frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct DynamicAttrs {
    pub position: bool,
    pub radius: bool,
    pub pointing: bool,
    pub image: bool,
    pub shape: bool,
    pub tint: bool,
    pub alpha: bool,
    pub text: bool,
    pub text_tint: bool,
    pub text_alpha: bool,
    pub font_name: bool,
    pub font_size: bool,
}

impl DynamicAttrs {
    pub fn for_kind(kind: AgentKind, options: &VisOptions) -> Self {
        let style = options.style(kind);
        let update = &options.update;
        let actor = kind == AgentKind::Actor;
        Self {
            position: actor,
            radius: actor && update.radius,
            pointing: actor && update.pointing,
            image: update.image && style.image.is_dynamic(),
            shape: update.shape && style.has_dynamic_shape(),
            tint: update.tint && style.tint.is_dynamic(),
            alpha: update.alpha && style.alpha.is_dynamic(),
            text: update.text && style.text.is_dynamic(),
            text_tint: update.text_tint && style.text_tint.is_dynamic(),
            text_alpha: update.text_alpha && style.text_alpha.is_dynamic(),
            font_name: update.font_name && style.font_name.is_dynamic(),
            font_size: update.font_size && style.font_size.is_dynamic(),
        }
    }

    pub fn any(&self) -> bool {
        *self != Self::default()
    }
}

/// Builds and refreshes records for one frame.
pub(crate) struct Painter<'a, T> {
    pub options: &'a VisOptions,
    pub shapes: &'a mut ShapeCache<T>,
    pub grid_step: f32,
}

impl<'a, T: Clone + PartialEq> Painter<'a, T> {
    pub fn new(options: &'a VisOptions, shapes: &'a mut ShapeCache<T>, sim: &Simulation) -> Self {
        Self {
            options,
            shapes,
            grid_step: sim.grid_step() as f32,
        }
    }

    /// Shape texture spec for an agent; `None` means the white texture.
    fn shape_spec(&self, agent: &Agent, tiled: bool) -> Option<ShapeSpec> {
        let style = self.options.style(agent.kind);
        let advanced = style.advanced.resolve(agent);
        match agent.kind {
            AgentKind::Square | AgentKind::Zone => {
                if !advanced {
                    return None;
                }
                let (width, height) = if agent.kind == AgentKind::Zone && !tiled {
                    (agent.bounds.width() as f32, agent.bounds.height() as f32)
                } else {
                    (self.grid_step, self.grid_step)
                };
                Some(advanced_spec(style, agent, Outline::Rect { width, height }, 1.0))
            }
            AgentKind::Actor => {
                if !advanced {
                    return Some(ShapeSpec::basic_circle(self.options.basic_circle_radius));
                }
                let scale = self.options.advanced_circle_scale;
                let radius = agent.radius as f32 * scale;
                Some(advanced_spec(style, agent, Outline::Circle { radius }, scale))
            }
        }
    }

    /// Create a detached sprite (and label) for an agent.
    pub fn create<G>(&mut self, agent: &Agent, layer: DrawLayer, scene: &mut G) -> DisplayRecord<G::Node, T>
    where
        G: SceneGraph<Texture = T>,
    {
        let options = self.options;
        let style = options.style(agent.kind);
        let update = &options.update;
        let hints = RecordHints {
            text_rotate: agent.kind == AgentKind::Actor && style.text_rotate.resolve(agent),
            tiled: agent.kind == AgentKind::Zone && style.tile.resolve(agent),
        };

        let image = style.image.resolve(agent).map(|path| scene.image_texture(&path));
        let shape = if image.is_none() || (update.image && style.image.is_dynamic()) {
            let spec = self.shape_spec(agent, hints.tiled);
            Some(self.shapes.fetch(spec.as_ref(), scene))
        } else {
            None
        };
        let texture = match (&image, &shape) {
            (Some(image), _) => image.clone(),
            (None, Some(shape)) => shape.texture.clone(),
            (None, None) => scene.white_texture(),
        };

        let bounds = &agent.bounds;
        let rotation = if agent.kind == AgentKind::Actor {
            agent.rotation() as f32
        } else {
            0.0
        };
        let sprite = match agent.kind {
            AgentKind::Square | AgentKind::Zone => SpriteDesc {
                texture: texture.clone(),
                x: bounds.x_min as f32,
                y: bounds.y_min as f32,
                width: bounds.width() as f32,
                height: bounds.height() as f32,
                anchor: (0.0, 0.0),
                rotation,
                tint: style.tint.resolve(agent),
                alpha: style.alpha.resolve(agent),
                tile: hints.tiled.then_some(self.grid_step),
                draw_key: agent.z_index.unwrap_or(f64::NAN),
            },
            AgentKind::Actor => SpriteDesc {
                texture: texture.clone(),
                x: agent.x as f32,
                y: agent.y as f32,
                width: 2.0 * agent.radius as f32,
                height: 2.0 * agent.radius as f32,
                anchor: (0.5, 0.5),
                rotation,
                tint: style.tint.resolve(agent),
                alpha: style.alpha.resolve(agent),
                tile: None,
                draw_key: agent.z_index.unwrap_or(f64::NAN),
            },
        };
        let node = scene.create_sprite(&sprite);

        let label = style
            .text
            .resolve(agent)
            .filter(|content| !content.is_empty())
            .map(|content| self.create_label(agent, content, node, rotation, hints, scene));

        DisplayRecord {
            node,
            layer,
            texture,
            image,
            shape,
            label,
            rotation,
            hints,
        }
    }

    fn create_label<G>(
        &self,
        agent: &Agent,
        content: String,
        parent: G::Node,
        sprite_rotation: f32,
        hints: RecordHints,
        scene: &mut G,
    ) -> Label<G::Node>
    where
        G: SceneGraph<Texture = T>,
    {
        let options = self.options;
        let style = options.style(agent.kind);
        let (placement, rotation) = match agent.kind {
            AgentKind::Actor => {
                let rotation = if hints.text_rotate { 0.0 } else { -sprite_rotation };
                (place_actor_label(style.text_max_width.resolve(agent)), rotation)
            }
            AgentKind::Square | AgentKind::Zone => {
                let placement = place_box_label(
                    &agent.bounds,
                    (agent.x, agent.y),
                    style.text_position.resolve(agent),
                    style.text_padding.resolve(agent),
                );
                (placement, 0.0)
            }
        };
        let node = scene.create_label(&LabelDesc {
            content: content.clone(),
            font_name: style.font_name.resolve(agent),
            font_size: style.font_size.resolve(agent),
            align: style.text_align.resolve(agent),
            tint: style.text_tint.resolve(agent),
            alpha: style.text_alpha.resolve(agent),
            x: placement.x,
            y: placement.y,
            anchor: placement.anchor,
            max_width: placement.max_width,
            rotation,
        });
        scene.attach(parent, node);
        Label { node, content }
    }

    /// Push the dynamic attributes of an agent to its record.
    pub fn refresh<G>(&mut self, dynamic: &DynamicAttrs, record: &mut DisplayRecord<G::Node, T>, agent: &Agent, scene: &mut G)
    where
        G: SceneGraph<Texture = T>,
    {
        let options = self.options;
        let style = options.style(agent.kind);
        let node = record.node;

        if dynamic.position {
            scene.set(node, NodeProp::Position { x: agent.x as f32, y: agent.y as f32 });
        }
        if dynamic.radius {
            let diameter = 2.0 * agent.radius as f32;
            scene.set(node, NodeProp::Size { width: diameter, height: diameter });
        }
        if dynamic.pointing {
            let rotation = agent.rotation() as f32;
            scene.set(node, NodeProp::Rotation(rotation));
            record.rotation = rotation;
            if !record.hints.text_rotate {
                if let Some(label) = record.label.as_ref().filter(|label| !label.content.is_empty()) {
                    scene.set(label.node, NodeProp::Rotation(-rotation));
                }
            }
        }

        let mut texture_dirty = false;
        if dynamic.shape {
            if let Some(current) = record.shape.as_ref().map(|shape| shape.key) {
                let spec = self.shape_spec(agent, record.hints.tiled);
                if current != spec.as_ref().map(ShapeSpec::key) {
                    let fresh = self.shapes.fetch(spec.as_ref(), scene);
                    let previous = record.shape.replace(fresh);
                    self.shapes.release(previous.as_ref());
                    texture_dirty = true;
                }
            }
        }
        if dynamic.image {
            record.image = style.image.resolve(agent).map(|path| scene.image_texture(&path));
            texture_dirty = true;
        }
        if texture_dirty {
            let texture = match (&record.image, &record.shape) {
                (Some(image), _) => Some(image.clone()),
                (None, Some(shape)) => Some(shape.texture.clone()),
                (None, None) => None,
            };
            if let Some(texture) = texture.filter(|texture| *texture != record.texture) {
                scene.set(node, NodeProp::Texture(texture.clone()));
                record.texture = texture;
            }
        }

        if dynamic.tint {
            scene.set(node, NodeProp::Tint(style.tint.resolve(agent)));
        }
        if dynamic.alpha {
            scene.set(node, NodeProp::Alpha(style.alpha.resolve(agent)));
        }

        if dynamic.text {
            let content = style.text.resolve_or(agent, String::new());
            match record.label.as_mut() {
                Some(label) => {
                    scene.set(label.node, NodeProp::Text(content.clone()));
                    label.content = content;
                }
                None if !content.is_empty() => {
                    let label = self.create_label(agent, content, node, record.rotation, record.hints, scene);
                    record.label = Some(label);
                }
                None => {}
            }
        }

        let Some(label) = record.label.as_ref().filter(|label| !label.content.is_empty()) else {
            return;
        };
        if dynamic.text_tint {
            scene.set(label.node, NodeProp::TextTint(style.text_tint.resolve(agent)));
        }
        if dynamic.text_alpha {
            scene.set(label.node, NodeProp::TextAlpha(style.text_alpha.resolve(agent)));
        }
        if dynamic.font_name {
            scene.set(label.node, NodeProp::FontName(style.font_name.resolve(agent)));
        }
        if dynamic.font_size {
            scene.set(label.node, NodeProp::FontSize(style.font_size.resolve(agent)));
        }
    }
}

fn advanced_spec(style: &AgentStyle, agent: &Agent, outline: Outline, scale: f32) -> ShapeSpec {
    let line_width = style.line_width.resolve(agent) * scale;
    ShapeSpec {
        outline,
        fill_color: style.fill_color.resolve(agent),
        fill_alpha: style.fill_alpha.resolve(agent),
        line: (line_width > 0.0).then(|| LineStyle {
            color: style.line_color.resolve(agent),
            alpha: style.line_alpha.resolve(agent),
            width: line_width,
            align: style.line_align.resolve(agent),
        }),
    }
}
