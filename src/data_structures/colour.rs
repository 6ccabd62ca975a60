//! Colour helpers.
//!
//! Scene colours are authored as sRGB hex triplets (`0xrrggbb`). Shaders work
//! in linear space and the surface format re-encodes to sRGB on output, so
//! every authored colour passes through [`linear_rgb`] before it reaches a
//! uniform buffer.

/// Convert one sRGB encoded channel in `0.0..=1.0` to linear light.
pub fn srgb_to_linear(channel: f32) -> f32 {
    if channel <= 0.04045 {
        channel / 12.92
    } else {
        ((channel + 0.055) / 1.055).powf(2.4)
    }
}

/// Split a `0xrrggbb` value into its sRGB channels.
pub fn srgb_rgb(hex: u32) -> [f32; 3] {
    let r = ((hex >> 16) & 0xff) as f32 / 255.0;
    let g = ((hex >> 8) & 0xff) as f32 / 255.0;
    let b = (hex & 0xff) as f32 / 255.0;
    [r, g, b]
}

/// A `0xrrggbb` value as linear RGB.
pub fn linear_rgb(hex: u32) -> [f32; 3] {
    srgb_rgb(hex).map(srgb_to_linear)
}

/// A `0xrrggbb` value as linear RGBA with the given alpha.
pub fn linear_rgba(hex: u32, alpha: f32) -> [f32; 4] {
    let [r, g, b] = linear_rgb(hex);
    [r, g, b, alpha]
}
