//! Named color palettes for the heatmap
//!
//! Each palette is a short sequence of equally spaced RGB stops that the
//! renderer interpolates over the shared `vmin..vmax` color scale. The
//! registry is looked up by name so an unrecognized palette surfaces as a
//! reportable error instead of a panic deep inside rendering.

use plotters::style::RGBColor;

use crate::{Error, Result};

/// Diverging blue-to-red, the conventional choice for metric deltas.
const COOLWARM: [(u8, u8, u8); 5] = [
    (59, 76, 192),
    (144, 178, 254),
    (221, 221, 221),
    (245, 156, 125),
    (180, 4, 38),
];

/// Perceptually uniform dark-purple-to-yellow.
const VIRIDIS: [(u8, u8, u8); 5] = [
    (68, 1, 84),
    (59, 82, 139),
    (33, 145, 140),
    (94, 201, 98),
    (253, 231, 37),
];

/// Perceptually uniform black-to-light.
const MAGMA: [(u8, u8, u8); 5] = [
    (0, 0, 4),
    (81, 18, 124),
    (183, 55, 121),
    (252, 137, 97),
    (252, 253, 191),
];

const GRAYSCALE: [(u8, u8, u8); 2] = [(32, 32, 32), (232, 232, 232)];

/// A named, interpolatable color palette.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    name: &'static str,
    stops: &'static [(u8, u8, u8)],
}

impl Palette {
    /// Look up a palette by name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownPalette`] for names outside the registry.
    pub fn by_name(name: &str) -> Result<Self> {
        match name {
            "coolwarm" => Ok(Self { name: "coolwarm", stops: &COOLWARM }),
            "viridis" => Ok(Self { name: "viridis", stops: &VIRIDIS }),
            "magma" => Ok(Self { name: "magma", stops: &MAGMA }),
            "grayscale" => Ok(Self { name: "grayscale", stops: &GRAYSCALE }),
            _ => Err(Error::UnknownPalette(name.to_string())),
        }
    }

    /// The palette's registry name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// The color at position `t` on the scale, `t` clamped to `0.0..=1.0`.
    #[must_use]
    pub fn color(&self, t: f64) -> RGBColor {
        let t = t.clamp(0.0, 1.0);
        let segments = self.stops.len() - 1;
        #[allow(clippy::cast_precision_loss)]
        let scaled = t * segments as f64;
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let lo = (scaled.floor() as usize).min(segments - 1);
        let frac = scaled - lo as f64;

        let (r0, g0, b0) = self.stops[lo];
        let (r1, g1, b1) = self.stops[lo + 1];
        RGBColor(
            lerp(r0, r1, frac),
            lerp(g0, g1, frac),
            lerp(b0, b1, frac),
        )
    }

    /// Whether cell text on top of the color at `t` should be light.
    #[must_use]
    pub fn needs_light_text(&self, t: f64) -> bool {
        let RGBColor(r, g, b) = self.color(t);
        // Rec. 601 luma.
        let luma = 0.299 * f64::from(r) + 0.587 * f64::from(g) + 0.114 * f64::from(b);
        luma < 128.0
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn lerp(a: u8, b: u8, frac: f64) -> u8 {
    (f64::from(a) + (f64::from(b) - f64::from(a)) * frac).round() as u8
}
