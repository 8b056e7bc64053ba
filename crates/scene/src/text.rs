//! Label placement inside agent boxes and on actors.

use serde::{Deserialize, Serialize};
use sim_core::Bounds;

/// Where a square or zone label sits inside its box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TextPosition {
    #[default]
    Center,
    Top,
    Bottom,
    Left,
    Right,
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl TextPosition {
    fn vertical(self) -> Edge {
        match self {
            TextPosition::Top | TextPosition::TopLeft | TextPosition::TopRight => Edge::Start,
            TextPosition::Bottom | TextPosition::BottomLeft | TextPosition::BottomRight => Edge::End,
            _ => Edge::Middle,
        }
    }

    fn horizontal(self) -> Edge {
        match self {
            TextPosition::Left | TextPosition::TopLeft | TextPosition::BottomLeft => Edge::Start,
            TextPosition::Right | TextPosition::TopRight | TextPosition::BottomRight => Edge::End,
            _ => Edge::Middle,
        }
    }
}

#[derive(Clone, Copy)]
enum Edge {
    Start,
    Middle,
    End,
}

/// Justification of multi-line labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextAlign {
    Left,
    #[default]
    Center,
    Right,
}

/// Label position relative to its sprite's origin, plus anchor and wrap width.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LabelPlacement {
    pub x: f32,
    pub y: f32,
    /// Fraction of the label's own size, `(0, 0)` = top-left.
    pub anchor: (f32, f32),
    /// Wrap width; zero means no wrapping.
    pub max_width: f32,
}

/// Place a label inside a box whose sprite origin is the box's top-left.
///
/// The centred case uses the agent's centre point, which for squares and
/// zones is the middle of the box.
pub fn place_box_label(
    bounds: &Bounds,
    center: (f64, f64),
    position: TextPosition,
    padding: f32,
) -> LabelPlacement {
    let width = bounds.width() as f32;
    let height = bounds.height() as f32;

    let (x, anchor_x) = match position.horizontal() {
        Edge::Start => (padding, 0.0),
        Edge::Middle => ((center.0 - bounds.x_min) as f32, 0.5),
        Edge::End => (width - padding, 1.0),
    };
    let (y, anchor_y) = match position.vertical() {
        Edge::Start => (padding, 0.0),
        Edge::Middle => ((center.1 - bounds.y_min) as f32, 0.5),
        Edge::End => (height - padding, 1.0),
    };

    LabelPlacement {
        x,
        y,
        anchor: (anchor_x, anchor_y),
        max_width: (width - 2.0 * padding).max(0.0),
    }
}

/// Actor labels sit on the actor's centre.
pub fn place_actor_label(max_width: f32) -> LabelPlacement {
    LabelPlacement {
        x: 0.0,
        y: 0.0,
        anchor: (0.5, 0.5),
        max_width: max_width.max(0.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn zone() -> Bounds {
        Bounds::new(10.0, 110.0, 20.0, 70.0)
    }

    #[test]
    fn test_center_label() {
        let placement = place_box_label(&zone(), (60.0, 45.0), TextPosition::Center, 3.0);
        assert_eq!(placement.x, 50.0);
        assert_eq!(placement.y, 25.0);
        assert_eq!(placement.anchor, (0.5, 0.5));
        assert_eq!(placement.max_width, 94.0);
    }

    #[test]
    fn test_corner_labels() {
        let top_left = place_box_label(&zone(), (60.0, 45.0), TextPosition::TopLeft, 3.0);
        assert_eq!((top_left.x, top_left.y), (3.0, 3.0));
        assert_eq!(top_left.anchor, (0.0, 0.0));

        let bottom_right = place_box_label(&zone(), (60.0, 45.0), TextPosition::BottomRight, 3.0);
        assert_eq!((bottom_right.x, bottom_right.y), (97.0, 47.0));
        assert_eq!(bottom_right.anchor, (1.0, 1.0));
    }

    #[test]
    fn test_edge_label_keeps_other_axis_centered() {
        let top = place_box_label(&zone(), (60.0, 45.0), TextPosition::Top, 5.0);
        assert_eq!((top.x, top.y), (50.0, 5.0));
        assert_eq!(top.anchor, (0.5, 0.0));
    }

    #[test]
    fn test_position_parses_from_kebab_case() {
        #[derive(Deserialize)]
        struct Wrapper {
            position: TextPosition,
        }
        let w: Wrapper = toml::from_str(r#"position = "bottom-left""#).unwrap();
        assert_eq!(w.position, TextPosition::BottomLeft);
    }
}
