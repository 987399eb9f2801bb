//! Height-to-hue color mapping
//!
//! Colors are specified in HSL space (hue in degrees, saturation and lightness
//! in percent, alpha in percent), then converted to 8-bit RGBA for drawing.

/// Hue at the bottom of the height range (blue)
pub const HUE_LOW: f64 = 220.0;

/// Hue at the top of the height range (red)
pub const HUE_HIGH: f64 = 0.0;

/// Linearly maps `value` from `[lo, hi]` into `[hue_lo, hue_hi]`
///
/// `value` is clamped to the input range first, so out-of-range values pin to
/// the nearest endpoint hue instead of extrapolating.  The input range may be
/// reversed (`lo > hi`).  If the range is empty (`lo == hi`) or the value is
/// `NaN`, `hue_lo` is returned.
///
/// ```
/// # use zslice::color::map_hue;
/// assert_eq!(map_hue(0.0, -5.0, 5.0, 220.0, 0.0), 110.0);
/// assert_eq!(map_hue(100.0, -5.0, 5.0, 220.0, 0.0), 0.0);
/// assert_eq!(map_hue(-100.0, -5.0, 5.0, 220.0, 0.0), 220.0);
/// ```
pub fn map_hue(value: f64, lo: f64, hi: f64, hue_lo: f64, hue_hi: f64) -> f64 {
    if lo == hi || value.is_nan() {
        return hue_lo;
    }
    let t = (value - lo) / (hi - lo);
    if t.is_nan() {
        return hue_lo;
    }
    let t = t.clamp(0.0, 1.0);
    if t == 0.0 {
        hue_lo
    } else if t == 1.0 {
        hue_hi
    } else {
        hue_lo + t * (hue_hi - hue_lo)
    }
}

/// Color in HSL space, with alpha
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Hsl {
    /// Hue, in degrees (`0..360`)
    pub h: f64,
    /// Saturation, in percent (`0..=100`)
    pub s: f64,
    /// Lightness, in percent (`0..=100`)
    pub l: f64,
    /// Opacity, in percent (`0..=100`)
    pub a: f64,
}

impl Hsl {
    /// Builds an opaque color
    pub const fn new(h: f64, s: f64, l: f64) -> Self {
        Self { h, s, l, a: 100.0 }
    }

    /// Builds a color with the given opacity (in percent)
    pub const fn with_alpha(self, a: f64) -> Self {
        Self { a, ..self }
    }

    /// Color of a frozen trace at the given height
    pub fn for_level(level: f64, min_z: f64, max_z: f64) -> Self {
        Self::new(map_hue(level, min_z, max_z, HUE_LOW, HUE_HIGH), 70.0, 70.0)
    }

    /// Converts to non-premultiplied 8-bit RGBA
    pub fn to_rgba(&self) -> Rgba {
        let h = self.h.rem_euclid(360.0);
        let s = (self.s / 100.0).clamp(0.0, 1.0);
        let l = (self.l / 100.0).clamp(0.0, 1.0);

        let c = (1.0 - (2.0 * l - 1.0).abs()) * s;
        let x = c * (1.0 - ((h / 60.0) % 2.0 - 1.0).abs());
        let m = l - c / 2.0;

        let (r, g, b) = if h < 60.0 {
            (c, x, 0.0)
        } else if h < 120.0 {
            (x, c, 0.0)
        } else if h < 180.0 {
            (0.0, c, x)
        } else if h < 240.0 {
            (0.0, x, c)
        } else if h < 300.0 {
            (x, 0.0, c)
        } else {
            (c, 0.0, x)
        };
        let to_u8 = |v: f64| (v * 255.0).round().clamp(0.0, 255.0) as u8;
        Rgba([
            to_u8(r + m),
            to_u8(g + m),
            to_u8(b + m),
            to_u8((self.a / 100.0).clamp(0.0, 1.0)),
        ])
    }
}

/// 8-bit RGBA color (not premultiplied)
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct Rgba(pub [u8; 4]);

impl Rgba {
    /// Builds an opaque color from a packed `0xRRGGBB` value
    pub const fn hex(v: u32) -> Self {
        Self([(v >> 16) as u8, (v >> 8) as u8, v as u8, u8::MAX])
    }

    /// Returns the same color with a different alpha
    pub const fn with_alpha(self, a: u8) -> Self {
        let [r, g, b, _] = self.0;
        Self([r, g, b, a])
    }

    /// Returns the red channel
    pub fn r(&self) -> u8 {
        self.0[0]
    }
    /// Returns the green channel
    pub fn g(&self) -> u8 {
        self.0[1]
    }
    /// Returns the blue channel
    pub fn b(&self) -> u8 {
        self.0[2]
    }
    /// Returns the alpha channel
    pub fn a(&self) -> u8 {
        self.0[3]
    }
}

impl From<Hsl> for Rgba {
    fn from(c: Hsl) -> Self {
        c.to_rgba()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn map_hue_interpolates() {
        assert_relative_eq!(map_hue(-5.0, -5.0, 5.0, 220.0, 0.0), 220.0);
        assert_relative_eq!(map_hue(5.0, -5.0, 5.0, 220.0, 0.0), 0.0);
        assert_relative_eq!(map_hue(2.5, -5.0, 5.0, 220.0, 0.0), 55.0);
        assert_relative_eq!(map_hue(5.0, 0.0, 10.0, 140.0, 190.0), 165.0);
    }

    #[test]
    fn map_hue_clamps() {
        for v in [-1e9, -5.01, -6.0] {
            assert_eq!(map_hue(v, -5.0, 5.0, 220.0, 0.0), 220.0);
        }
        for v in [5.01, 6.0, 1e9, f64::INFINITY] {
            assert_eq!(map_hue(v, -5.0, 5.0, 220.0, 0.0), 0.0);
        }
        assert_eq!(map_hue(f64::NEG_INFINITY, -5.0, 5.0, 220.0, 0.0), 220.0);
    }

    #[test]
    fn map_hue_reversed_and_degenerate() {
        // Reversed input range: lo is still the hue_lo end
        assert_eq!(map_hue(5.0, 5.0, -5.0, 220.0, 0.0), 220.0);
        assert_eq!(map_hue(-10.0, 5.0, -5.0, 220.0, 0.0), 0.0);
        assert_relative_eq!(map_hue(0.0, 5.0, -5.0, 220.0, 0.0), 110.0);

        assert_eq!(map_hue(3.0, 3.0, 3.0, 220.0, 0.0), 220.0);
        assert_eq!(map_hue(f64::NAN, -5.0, 5.0, 220.0, 0.0), 220.0);
    }

    #[test]
    fn hsl_to_rgba() {
        assert_eq!(Hsl::new(0.0, 100.0, 50.0).to_rgba(), Rgba::hex(0xff0000));
        assert_eq!(Hsl::new(120.0, 100.0, 50.0).to_rgba(), Rgba::hex(0x00ff00));
        assert_eq!(Hsl::new(240.0, 100.0, 50.0).to_rgba(), Rgba::hex(0x0000ff));
        assert_eq!(Hsl::new(0.0, 0.0, 100.0).to_rgba(), Rgba::hex(0xffffff));
        assert_eq!(Hsl::new(360.0, 100.0, 50.0).to_rgba(), Rgba::hex(0xff0000));
        assert_eq!(
            Hsl::new(0.0, 0.0, 100.0).with_alpha(8.0).to_rgba(),
            Rgba([255, 255, 255, 20])
        );
    }

    #[test]
    fn level_colors() {
        assert_eq!(Hsl::for_level(-5.0, -5.0, 5.0).h, HUE_LOW);
        assert_eq!(Hsl::for_level(5.0, -5.0, 5.0).h, HUE_HIGH);
        assert_eq!(Hsl::for_level(0.0, -5.0, 5.0).s, 70.0);
    }
}
