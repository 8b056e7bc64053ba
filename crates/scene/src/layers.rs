//! Draw layers and the inclusion rule for agents.

use serde::{Deserialize, Serialize};

/// Default particle capacity when batching is requested without a size.
pub const DEFAULT_PARTICLE_CAPACITY: u32 = 10_000;

/// One of the three containers agents are drawn into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DrawLayer {
    /// Key `-inf`; unordered, drawn first.
    Back,
    /// Finite keys; kept sorted by key.
    Middle,
    /// Key `+inf`; unordered, drawn last.
    Front,
}

impl DrawLayer {
    /// All layers in draw order.
    pub const ALL: [DrawLayer; 3] = [DrawLayer::Back, DrawLayer::Middle, DrawLayer::Front];

    /// Layer for a draw-order key, or `None` if the agent is excluded.
    pub fn for_key(z_index: Option<f64>) -> Option<DrawLayer> {
        match z_index {
            None => None,
            Some(z) if z.is_nan() => None,
            Some(z) if z == f64::NEG_INFINITY => Some(DrawLayer::Back),
            Some(z) if z == f64::INFINITY => Some(DrawLayer::Front),
            Some(_) => Some(DrawLayer::Middle),
        }
    }

    pub fn index(self) -> usize {
        match self {
            DrawLayer::Back => 0,
            DrawLayer::Middle => 1,
            DrawLayer::Front => 2,
        }
    }
}

/// How a layer's children are batched by the rendering library.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LayerBatching {
    /// A plain container.
    #[default]
    Standard,
    /// A particle container holding up to `capacity` sprites.
    Particles { capacity: u32 },
}

impl LayerBatching {
    /// Build from the config form, where a capacity of zero means standard.
    pub fn from_capacity(capacity: Option<u32>) -> Self {
        match capacity {
            None | Some(0) => LayerBatching::Standard,
            Some(capacity) => LayerBatching::Particles { capacity },
        }
    }
}

/// The three layer nodes, created once at setup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layers<N> {
    pub back: N,
    pub middle: N,
    pub front: N,
}

impl<N: Copy> Layers<N> {
    pub fn get(&self, layer: DrawLayer) -> N {
        match layer {
            DrawLayer::Back => self.back,
            DrawLayer::Middle => self.middle,
            DrawLayer::Front => self.front,
        }
    }
}
