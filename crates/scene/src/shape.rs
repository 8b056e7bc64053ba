//! Procedural shape textures: rectangles and circles with optional outline.
//!
//! The reconciler describes shapes with a [`ShapeSpec`]; rendering backends
//! turn specs into textures, either natively or via [`rasterize`].

use crate::colors;

/// Outline of a generated shape, in texture pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Outline {
    Rect { width: f32, height: f32 },
    Circle { radius: f32 },
}

/// Stroke drawn along the outline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineStyle {
    pub color: u32,
    pub alpha: f32,
    pub width: f32,
    /// 0 = inside the outline, 0.5 = centred on it, 1 = outside.
    pub align: f32,
}

/// Everything needed to generate a shape texture.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShapeSpec {
    pub outline: Outline,
    pub fill_color: u32,
    pub fill_alpha: f32,
    pub line: Option<LineStyle>,
}

/// Hashable identity of a [`ShapeSpec`], used to share textures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ShapeKey([u32; 10]);

impl ShapeSpec {
    /// Plain white circle, used for actors without advanced styling.
    pub fn basic_circle(radius: f32) -> Self {
        Self {
            outline: Outline::Circle { radius },
            fill_color: colors::WHITE,
            fill_alpha: 1.0,
            line: None,
        }
    }

    pub fn key(&self) -> ShapeKey {
        let (tag, a, b) = match self.outline {
            Outline::Rect { width, height } => (0, width, height),
            Outline::Circle { radius } => (1, radius, 0.0),
        };
        let line = self.line.unwrap_or(LineStyle {
            color: u32::MAX,
            alpha: 0.0,
            width: 0.0,
            align: 0.0,
        });
        ShapeKey([
            tag,
            a.to_bits(),
            b.to_bits(),
            self.fill_color,
            self.fill_alpha.to_bits(),
            self.line.is_some() as u32,
            line.color,
            line.alpha.to_bits(),
            line.width.to_bits(),
            line.align.to_bits(),
        ])
    }

    /// How far the stroke reaches outside the outline.
    fn outer_stroke(&self) -> f32 {
        self.line
            .map(|line| line.width.max(0.0) * line.align.clamp(0.0, 1.0))
            .unwrap_or(0.0)
    }

    /// Texture size in whole pixels, including any outer stroke.
    pub fn texture_size(&self) -> (u32, u32) {
        let pad = 2.0 * self.outer_stroke();
        let (w, h) = match self.outline {
            Outline::Rect { width, height } => (width, height),
            Outline::Circle { radius } => (2.0 * radius, 2.0 * radius),
        };
        ((w + pad).ceil().max(1.0) as u32, (h + pad).ceil().max(1.0) as u32)
    }

    /// Signed distance from a point (texture space) to the outline.
    /// Negative inside.
    fn distance(&self, x: f32, y: f32) -> f32 {
        let o = self.outer_stroke();
        match self.outline {
            Outline::Rect { width, height } => {
                let dx = (o - x).max(x - (o + width));
                let dy = (o - y).max(y - (o + height));
                if dx <= 0.0 && dy <= 0.0 {
                    dx.max(dy)
                } else {
                    dx.max(0.0).hypot(dy.max(0.0))
                }
            }
            Outline::Circle { radius } => {
                let c = o + radius;
                (x - c).hypot(y - c) - radius
            }
        }
    }
}

/// Straight-alpha RGBA8 pixels, row-major from the top-left.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RgbaImage {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl RgbaImage {
    /// RGBA of the pixel at `(x, y)`.
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let i = ((y * self.width + x) * 4) as usize;
        [
            self.pixels[i],
            self.pixels[i + 1],
            self.pixels[i + 2],
            self.pixels[i + 3],
        ]
    }
}

/// Render a shape by sampling each pixel centre.
pub fn rasterize(spec: &ShapeSpec) -> RgbaImage {
    let (width, height) = spec.texture_size();
    let mut pixels = Vec::with_capacity((width * height * 4) as usize);

    let fill = colors::rgb_f32(spec.fill_color);
    let stroke = spec.line.filter(|line| line.width > 0.0);

    for py in 0..height {
        for px in 0..width {
            let d = spec.distance(px as f32 + 0.5, py as f32 + 0.5);

            let mut rgb = [0.0f32; 3];
            let mut alpha = 0.0f32;
            if d <= 0.0 {
                rgb = fill;
                alpha = spec.fill_alpha.clamp(0.0, 1.0);
            }
            if let Some(line) = stroke {
                let inner = -line.width * (1.0 - line.align.clamp(0.0, 1.0));
                let outer = line.width * line.align.clamp(0.0, 1.0);
                if d >= inner && d <= outer {
                    let src = colors::rgb_f32(line.color);
                    let sa = line.alpha.clamp(0.0, 1.0);
                    let out_a = sa + alpha * (1.0 - sa);
                    if out_a > 0.0 {
                        for c in 0..3 {
                            rgb[c] = (src[c] * sa + rgb[c] * alpha * (1.0 - sa)) / out_a;
                        }
                    }
                    alpha = out_a;
                }
            }

            let to_byte = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
            pixels.extend_from_slice(&[to_byte(rgb[0]), to_byte(rgb[1]), to_byte(rgb[2]), to_byte(alpha)]);
        }
    }

    RgbaImage {
        width,
        height,
        pixels,
    }
}
