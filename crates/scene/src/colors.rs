//! Categorical palette and `0xRRGGBB` tint helpers.
//!
//! The palette is d3's category10 with the gray removed.

pub const BLUE: u32 = 0x1f77b4;
pub const ORANGE: u32 = 0xff7f0e;
pub const GREEN: u32 = 0x2ca02c;
pub const RED: u32 = 0xd62728;
pub const PURPLE: u32 = 0x9467bd;
pub const BROWN: u32 = 0x8c564b;
pub const PINK: u32 = 0xe377c2;
pub const KIWI: u32 = 0xbcbd22;
pub const TURQUOISE: u32 = 0x17becf;

pub const WHITE: u32 = 0xffffff;
pub const BLACK: u32 = 0x000000;

/// The nine palette colors in order.
pub const PALETTE: [u32; 9] = [BLUE, ORANGE, GREEN, RED, PURPLE, BROWN, PINK, KIWI, TURQUOISE];

/// Palette color for an index, wrapping around.
pub fn palette(index: usize) -> u32 {
    PALETTE[index % PALETTE.len()]
}

/// Split a tint into 8-bit channels.
pub fn rgb8(tint: u32) -> [u8; 3] {
    [(tint >> 16) as u8, (tint >> 8) as u8, tint as u8]
}

/// Split a tint into channels in `0.0..=1.0`.
pub fn rgb_f32(tint: u32) -> [f32; 3] {
    let [r, g, b] = rgb8(tint);
    [r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0]
}

/// Linear blend between two tints, `t` clamped to `0.0..=1.0`.
pub fn mix(from: u32, to: u32, t: f64) -> u32 {
    let t = t.clamp(0.0, 1.0);
    let [r0, g0, b0] = rgb8(from);
    let [r1, g1, b1] = rgb8(to);
    let lerp = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * t).round() as u32;
    (lerp(r0, r1) << 16) | (lerp(g0, g1) << 8) | lerp(b0, b1)
}
