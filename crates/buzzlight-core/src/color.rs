//! Color values for the 7-bit control channel range
//!
//! Routines produce colors with unconstrained integer components; values are
//! only brought into `[0, CHANNEL_MAX]` by the sink when they are written.

use serde::{Deserialize, Serialize};

/// Highest value a single color channel can carry on the wire
pub const CHANNEL_MAX: u8 = 127;

/// An RGB request for one zone
///
/// Components may be out of range (negative or above [`CHANNEL_MAX`]); they
/// are clamped, never rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Color {
    /// Red component
    pub r: i32,
    /// Green component
    pub g: i32,
    /// Blue component
    pub b: i32,
}

impl Color {
    /// All channels off
    pub const OFF: Color = Color::new(0, 0, 0);
    /// Full white in channel range
    pub const WHITE: Color = Color::new(127, 127, 127);

    /// Create a color from integer components
    pub const fn new(r: i32, g: i32, b: i32) -> Self {
        Self { r, g, b }
    }

    /// Create a color from float components, flooring each one
    pub fn floor(r: f32, g: f32, b: f32) -> Self {
        Self::new(r.floor() as i32, g.floor() as i32, b.floor() as i32)
    }

    /// Multiply every component by `factor`, flooring the result
    pub fn scaled(self, factor: f32) -> Self {
        Self::floor(
            self.r as f32 * factor,
            self.g as f32 * factor,
            self.b as f32 * factor,
        )
    }

    /// Linear interpolation between two colors, rounded and clamped per channel
    pub fn lerp(from: Color, to: Color, t: f32) -> Self {
        Self::new(
            clamp_level(lerp(from.r as f32, to.r as f32, t)),
            clamp_level(lerp(from.g as f32, to.g as f32, t)),
            clamp_level(lerp(from.b as f32, to.b as f32, t)),
        )
    }

    /// Apply a brightness factor and clamp into wire range
    ///
    /// Each channel is `clamp(round(component * factor), 0, CHANNEL_MAX)`.
    pub fn to_wire(self, factor: f32) -> [u8; 3] {
        [
            scale_channel(self.r, factor),
            scale_channel(self.g, factor),
            scale_channel(self.b, factor),
        ]
    }
}

impl From<[i32; 3]> for Color {
    fn from(value: [i32; 3]) -> Self {
        Self::new(value[0], value[1], value[2])
    }
}

fn scale_channel(component: i32, factor: f32) -> u8 {
    let scaled = (component as f32 * factor).round();
    scaled.clamp(0.0, f32::from(CHANNEL_MAX)) as u8
}

/// Round and clamp a float level into channel range
pub fn clamp_level(value: f32) -> i32 {
    value.round().clamp(0.0, f32::from(CHANNEL_MAX)) as i32
}

/// Linear interpolation between two scalars
pub fn lerp(start: f32, end: f32, t: f32) -> f32 {
    start + (end - start) * t
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_wire_clamps_and_scales() {
        let color = Color::new(300, -10, 64);
        assert_eq!(color.to_wire(0.5), [127, 0, 32]);
        assert_eq!(color.to_wire(1.0), [127, 0, 64]);
        assert_eq!(color.to_wire(0.0), [0, 0, 0]);
    }

    #[test]
    fn test_to_wire_rounds_half_up() {
        // 25 * 0.5 = 12.5 -> 13
        assert_eq!(Color::new(25, 25, 25).to_wire(0.5), [13, 13, 13]);
    }

    #[test]
    fn test_clamp_level() {
        assert_eq!(clamp_level(-3.2), 0);
        assert_eq!(clamp_level(63.5), 64);
        assert_eq!(clamp_level(500.0), 127);
    }

    #[test]
    fn test_lerp_color() {
        let from = Color::new(90, 0, 127);
        assert_eq!(Color::lerp(from, Color::OFF, 0.0), from);
        assert_eq!(Color::lerp(from, Color::OFF, 1.0), Color::OFF);
        assert_eq!(Color::lerp(from, Color::OFF, 0.5), Color::new(45, 0, 64));
    }

    #[test]
    fn test_scaled_floors() {
        assert_eq!(Color::new(127, 100, 70).scaled(0.5), Color::new(63, 50, 35));
    }
}
