use serde::Serialize;

use crate::error::InvalidBlendRatio;

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// `RRGGBB`, alpha dropped.
    pub fn to_hex_rgb(self) -> String {
        format!(
            "{:02X}{:02X}{:02X}",
            channel_to_u8(self.r),
            channel_to_u8(self.g),
            channel_to_u8(self.b)
        )
    }
}

fn channel_to_u8(value: f32) -> u8 {
    (value.clamp(0.0, 1.0) * 255.0).round() as u8
}

fn lerp(from: f32, to: f32, ratio: f32) -> f32 {
    from * (1.0 - ratio) + to * ratio
}

/// Linear blend from `from` (ratio 0) to `to` (ratio 1). The ratio must lie in
/// `[0, 1]`; anything else, NaN included, is rejected.
pub fn mix_colors(from: Color, to: Color, ratio: f32) -> Result<Color, InvalidBlendRatio> {
    if !(0.0..=1.0).contains(&ratio) {
        return Err(InvalidBlendRatio { ratio });
    }
    Ok(Color {
        r: lerp(from.r, to.r, ratio),
        g: lerp(from.g, to.g, ratio),
        b: lerp(from.b, to.b, ratio),
        a: lerp(from.a, to.a, ratio),
    })
}
