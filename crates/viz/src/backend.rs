//! [`SceneGraph`] implementation over a Bevy [`World`].
//!
//! Every display object is an entity. The scene root sits so that simulation
//! `(0, 0)` is the top-left corner of the grid, centred on the world origin;
//! children take simulation coordinates with y flipped. Draw order comes from
//! each entity's local z, assigned on attach and rewritten when a layer is
//! sorted.

use bevy::color::Alpha;
use bevy::prelude::*;
use bevy::render::render_asset::RenderAssetUsages;
use bevy::render::render_resource::{Extent3d, TextureDimension, TextureFormat};
use bevy::render::texture::ImageSampler;
use bevy::sprite::{Anchor, ImageScaleMode};
use bevy::text::Text2dBounds;

use scene::{
    colors, rasterize, DrawLayer, LabelDesc, LayerBatching, NodeProp, SceneGraph, ShapeSpec,
    SpriteDesc, TextAlign,
};

/// Local z of a freshly created sprite, and of the background.
pub const BACKGROUND_Z: f32 = 0.0;
/// Local z of each layer container, in draw order.
pub const LAYER_Z: [f32; 3] = [100.0, 400.0, 700.0];
/// Z distance between consecutive children of a layer.
pub const CHILD_Z_STEP: f32 = 1e-3;
/// Labels sit just above their sprite.
pub const LABEL_Z: f32 = CHILD_Z_STEP * 0.5;

/// Marks the entity every scene node hangs from.
#[derive(Component, Debug)]
pub struct SceneRoot;

/// A layer container.
#[derive(Component, Debug, Clone, Copy)]
pub struct SceneLayer {
    pub layer: DrawLayer,
    pub batching: LayerBatching,
    /// Attachments so far, used to stack children in arrival order.
    pub cursor: u32,
}

/// Sort key of a sprite within its layer.
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct DrawKey(pub f64);

/// A text label node.
#[derive(Component, Debug)]
pub struct SceneLabel;

/// Bevy anchor for a `(0, 0)` = top-left fraction.
pub fn to_anchor((x, y): (f32, f32)) -> Anchor {
    if x == 0.5 && y == 0.5 {
        Anchor::Center
    } else if x == 0.0 && y == 0.0 {
        Anchor::TopLeft
    } else {
        Anchor::Custom(Vec2::new(x - 0.5, 0.5 - y))
    }
}

/// Local translation for simulation coordinates.
pub fn to_local(x: f32, y: f32, z: f32) -> Vec3 {
    Vec3::new(x, -y, z)
}

/// Rotation for a clockwise angle in y-down simulation space.
pub fn to_rotation(angle: f32) -> Quat {
    Quat::from_rotation_z(-angle)
}

pub fn to_color(tint: u32, alpha: f32) -> Color {
    let [r, g, b] = colors::rgb_f32(tint);
    Color::srgba(r, g, b, alpha)
}

fn to_justify(align: TextAlign) -> JustifyText {
    match align {
        TextAlign::Left => JustifyText::Left,
        TextAlign::Center => JustifyText::Center,
        TextAlign::Right => JustifyText::Right,
    }
}

/// Spawn the scene root for a `width` x `height` grid.
pub fn spawn_root(world: &mut World, width: f32, height: f32) -> Entity {
    world
        .spawn((
            SpatialBundle::from_transform(Transform::from_xyz(-width / 2.0, height / 2.0, 0.0)),
            SceneRoot,
            Name::new("scene_root"),
        ))
        .id()
}

/// A scene graph borrowing the Bevy world for one setup or frame.
pub struct BevyScene<'w> {
    world: &'w mut World,
    root: Entity,
}

impl<'w> BevyScene<'w> {
    pub fn new(world: &'w mut World, root: Entity) -> Self {
        Self { world, root }
    }

    pub fn world(&self) -> &World {
        self.world
    }

    fn font(&self, name: Option<&str>) -> Handle<Font> {
        match name {
            Some(path) => self.world.resource::<AssetServer>().load(path.to_owned()),
            None => Handle::default(),
        }
    }

    /// Tile scale so one repeat covers `tile` world units.
    fn tile_stretch(&self, texture: &Handle<Image>, tile: f32) -> f32 {
        self.world
            .get_resource::<Assets<Image>>()
            .and_then(|images| images.get(texture))
            .map(|image| image.width() as f32)
            .filter(|width| *width > 0.0)
            .map_or(1.0, |width| tile / width)
    }

    fn with_text(&mut self, node: Entity, f: impl FnOnce(&mut TextSection)) {
        if let Some(mut text) = self.world.get_mut::<Text>(node) {
            if let Some(section) = text.sections.first_mut() {
                f(section);
            }
        }
    }
}

impl SceneGraph for BevyScene<'_> {
    type Node = Entity;
    type Texture = Handle<Image>;

    fn root(&self) -> Entity {
        self.root
    }

    fn create_layer(&mut self, layer: DrawLayer, batching: LayerBatching) -> Entity {
        if let LayerBatching::Particles { capacity } = batching {
            tracing::debug!("{:?} layer batching hint ({} sprites) left to the renderer", layer, capacity);
        }
        self.world
            .spawn((
                SpatialBundle::from_transform(Transform::from_xyz(0.0, 0.0, LAYER_Z[layer.index()])),
                SceneLayer {
                    layer,
                    batching,
                    cursor: 0,
                },
                Name::new(format!("{:?}_layer", layer).to_lowercase()),
            ))
            .id()
    }

    fn white_texture(&mut self) -> Handle<Image> {
        Handle::default()
    }

    fn image_texture(&mut self, path: &str) -> Handle<Image> {
        self.world.resource::<AssetServer>().load(path.to_owned())
    }

    fn shape_texture(&mut self, shape: &ShapeSpec) -> Handle<Image> {
        let raster = rasterize(shape);
        let mut image = Image::new(
            Extent3d {
                width: raster.width.max(1),
                height: raster.height.max(1),
                depth_or_array_layers: 1,
            },
            TextureDimension::D2,
            raster.pixels,
            TextureFormat::Rgba8UnormSrgb,
            RenderAssetUsages::RENDER_WORLD | RenderAssetUsages::MAIN_WORLD,
        );
        image.sampler = ImageSampler::linear();
        self.world.resource_mut::<Assets<Image>>().add(image)
    }

    fn create_sprite(&mut self, sprite: &SpriteDesc<Handle<Image>>) -> Entity {
        let mut transform = Transform::from_translation(to_local(sprite.x, sprite.y, BACKGROUND_Z));
        transform.rotation = to_rotation(sprite.rotation);

        let tiling = sprite.tile.map(|tile| ImageScaleMode::Tiled {
            tile_x: true,
            tile_y: true,
            stretch_value: self.tile_stretch(&sprite.texture, tile),
        });

        let mut entity = self.world.spawn((
            SpriteBundle {
                sprite: Sprite {
                    color: to_color(sprite.tint, sprite.alpha),
                    custom_size: Some(Vec2::new(sprite.width, sprite.height)),
                    anchor: to_anchor(sprite.anchor),
                    ..default()
                },
                texture: sprite.texture.clone(),
                transform,
                ..default()
            },
            DrawKey(sprite.draw_key),
        ));
        if let Some(tiling) = tiling {
            entity.insert(tiling);
        }
        entity.id()
    }

    fn create_label(&mut self, label: &LabelDesc) -> Entity {
        let style = TextStyle {
            font: self.font(label.font_name.as_deref()),
            font_size: label.font_size,
            color: to_color(label.tint, label.alpha),
        };
        let bounds = if label.max_width > 0.0 {
            Text2dBounds {
                size: Vec2::new(label.max_width, f32::INFINITY),
            }
        } else {
            Text2dBounds::UNBOUNDED
        };
        let mut transform = Transform::from_translation(to_local(label.x, label.y, LABEL_Z));
        transform.rotation = to_rotation(label.rotation);

        self.world
            .spawn((
                Text2dBundle {
                    text: Text::from_section(label.content.clone(), style)
                        .with_justify(to_justify(label.align)),
                    text_anchor: to_anchor(label.anchor),
                    text_2d_bounds: bounds,
                    transform,
                    ..default()
                },
                SceneLabel,
            ))
            .id()
    }

    fn attach(&mut self, parent: Entity, child: Entity) {
        if self.world.get_entity(parent).is_none() || self.world.get_entity(child).is_none() {
            return;
        }
        self.world.entity_mut(parent).add_child(child);

        // Layer children stack in arrival order until the next sort.
        let z = self.world.get_mut::<SceneLayer>(parent).map(|mut layer| {
            layer.cursor += 1;
            layer.cursor as f32 * CHILD_Z_STEP
        });
        if let (Some(z), Some(mut transform)) = (z, self.world.get_mut::<Transform>(child)) {
            transform.translation.z = z;
        }
    }

    fn remove(&mut self, node: Entity) {
        if node == self.root {
            return;
        }
        if let Some(entity) = self.world.get_entity_mut(node) {
            entity.despawn_recursive();
        }
    }

    fn set(&mut self, node: Entity, prop: NodeProp<Handle<Image>>) {
        match prop {
            NodeProp::Texture(texture) => {
                if let Some(mut handle) = self.world.get_mut::<Handle<Image>>(node) {
                    *handle = texture;
                }
            }
            NodeProp::Tint(tint) => {
                if let Some(mut sprite) = self.world.get_mut::<Sprite>(node) {
                    let alpha = sprite.color.alpha();
                    sprite.color = to_color(tint, alpha);
                }
            }
            NodeProp::Alpha(alpha) => {
                if let Some(mut sprite) = self.world.get_mut::<Sprite>(node) {
                    sprite.color.set_alpha(alpha);
                }
            }
            NodeProp::Position { x, y } => {
                if let Some(mut transform) = self.world.get_mut::<Transform>(node) {
                    let z = transform.translation.z;
                    transform.translation = to_local(x, y, z);
                }
            }
            NodeProp::Size { width, height } => {
                if let Some(mut sprite) = self.world.get_mut::<Sprite>(node) {
                    sprite.custom_size = Some(Vec2::new(width, height));
                }
            }
            NodeProp::Rotation(angle) => {
                if let Some(mut transform) = self.world.get_mut::<Transform>(node) {
                    transform.rotation = to_rotation(angle);
                }
            }
            NodeProp::DrawKey(key) => {
                if let Some(mut draw_key) = self.world.get_mut::<DrawKey>(node) {
                    draw_key.0 = key;
                }
            }
            NodeProp::Text(content) => self.with_text(node, |section| section.value = content),
            NodeProp::TextTint(tint) => self.with_text(node, |section| {
                let alpha = section.style.color.alpha();
                section.style.color = to_color(tint, alpha);
            }),
            NodeProp::TextAlpha(alpha) => self.with_text(node, |section| section.style.color.set_alpha(alpha)),
            NodeProp::FontName(name) => {
                let font = self.font(name.as_deref());
                self.with_text(node, |section| section.style.font = font);
            }
            NodeProp::FontSize(size) => self.with_text(node, |section| section.style.font_size = size),
        }
    }

    fn sort_children(&mut self, parent: Entity) {
        let Some(children) = self.world.get::<Children>(parent) else {
            return;
        };
        let mut keyed: Vec<(f64, Entity)> = children
            .iter()
            .map(|&child| {
                let key = self.world.get::<DrawKey>(child).map_or(0.0, |key| key.0);
                (key, child)
            })
            .collect();
        keyed.sort_by(|a, b| a.0.total_cmp(&b.0));

        for (i, (_, child)) in keyed.iter().enumerate() {
            if let Some(mut transform) = self.world.get_mut::<Transform>(*child) {
                transform.translation.z = (i + 1) as f32 * CHILD_Z_STEP;
            }
        }
        if let Some(mut layer) = self.world.get_mut::<SceneLayer>(parent) {
            layer.cursor = keyed.len() as u32;
        }
    }

    fn teardown(&mut self) {
        self.world.entity_mut(self.root).despawn_descendants();
    }
}
