//! Brute-force level-set sampling
//!
//! The sampler scans a square grid centered on the origin and keeps every
//! grid position whose field value lies within `tolerance` of the target
//! level.  The output is a point cloud in scan order (`x` outer, `y` inner);
//! it is neither deduplicated nor ordered along the curve.
//!
//! Cost is quadratic in `grid_resolution`, and raising the resolution is the
//! only way to get a smoother-looking curve.
use crate::expr::ScalarField;
use nalgebra::{Point2, Point3};

/// Parameters for a single sampling pass
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SliceParams {
    /// Target value of the field
    pub level: f64,

    /// Number of grid steps between the origin and each edge
    ///
    /// Values below 1 are treated as 1.
    pub grid_resolution: u32,

    /// Half-width of the scanned square
    pub span: f64,

    /// Half-thickness of the accepted band around `level`
    pub tolerance: f64,
}

impl SliceParams {
    /// Distance between adjacent samples
    pub fn step(&self) -> f64 {
        self.span / self.steps() as f64
    }

    fn steps(&self) -> i64 {
        i64::from(self.grid_resolution.max(1))
    }

    /// Iterates over sample coordinates along a single axis
    ///
    /// Coordinates are computed from an integer index rather than by repeated
    /// addition, so there are exactly `2 * grid_resolution + 1` of them, the
    /// grid is symmetric about zero, and both `-span` and `+span` are hit
    /// exactly.
    pub fn axis(&self) -> impl Iterator<Item = f64> + use<> {
        let n = self.steps();
        let span = self.span;
        (-n..=n).map(move |i| span * i as f64 / n as f64)
    }

    /// Returns the number of samples in a full pass
    pub fn sample_count(&self) -> usize {
        let n = 2 * self.steps() as usize + 1;
        n * n
    }

    /// Checks whether a field value counts as "on the slice"
    ///
    /// Non-finite values never match.
    #[inline]
    pub fn accepts(&self, value: f64) -> bool {
        value.is_finite() && (value - self.level).abs() < self.tolerance
    }
}

/// Samples the level set, returning matching `(x, y)` positions
///
/// Points are in model units, in scan order (`x` outer, `y` inner).
pub fn sample<F: ScalarField + ?Sized>(
    field: &F,
    params: &SliceParams,
) -> Vec<Point2<f64>> {
    let mut out = vec![];
    for x in params.axis() {
        for y in params.axis() {
            if params.accepts(field.eval(x, y)) {
                out.push(Point2::new(x, y));
            }
        }
    }
    out
}

/// Samples the level set, returning `(x, y, level)` positions
///
/// This is the same pass as [`sample`], lifted onto the slice plane.
pub fn sample_3d<F: ScalarField + ?Sized>(
    field: &F,
    params: &SliceParams,
) -> Vec<Point3<f64>> {
    sample(field, params)
        .into_iter()
        .map(|p| Point3::new(p.x, p.y, params.level))
        .collect()
}
