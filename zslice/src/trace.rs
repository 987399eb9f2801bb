//! Frozen slices, kept in both 3D and 2D form
use crate::{
    animate::Bounds,
    color::Hsl,
    expr::ScalarField,
    render::SCALE,
    sample::{SliceParams, sample},
};
use log::debug;
use nalgebra::{Point2, Point3};

/// Point diameter of frozen traces in the 3D scene, in pixels
pub const STROKE_3D: f32 = 5.0;

/// Point diameter of frozen traces in the 2D preview, in preview units
pub const STROKE_2D: f32 = 2.0;

/// Immutable snapshot of a single slice
#[derive(Clone, Debug)]
pub struct Trace<P> {
    points: Vec<P>,
    color: Hsl,
    stroke_width: f32,
}

impl<P> Trace<P> {
    /// Returns the sampled points, in scan order
    pub fn points(&self) -> &[P] {
        &self.points
    }
    /// Returns the color shared by every point of this trace
    pub fn color(&self) -> Hsl {
        self.color
    }
    /// Returns the point diameter
    pub fn stroke_width(&self) -> f32 {
        self.stroke_width
    }
}

/// Trace in 3D world coordinates (scene pixels)
pub type Trace3 = Trace<Point3<f32>>;

/// Trace in 2D preview coordinates (before pan and zoom)
pub type Trace2 = Trace<Point2<f32>>;

/// Lifts a model-space slice into 3D world coordinates
pub fn to_world_3d(points: &[Point2<f64>], level: f64) -> Vec<Point3<f32>> {
    let z = (level * SCALE as f64) as f32;
    points
        .iter()
        .map(|p| {
            Point3::new(
                (p.x * SCALE as f64) as f32,
                (p.y * SCALE as f64) as f32,
                z,
            )
        })
        .collect()
}

/// Scales a model-space slice into 2D preview coordinates
pub fn to_world_2d(points: &[Point2<f64>]) -> Vec<Point2<f32>> {
    points
        .iter()
        .map(|p| {
            let s = SCALE as f64;
            Point2::new((p.x * s) as f32, (p.y * s) as f32)
        })
        .collect()
}

/// Append-only list of frozen slices
///
/// Every slice is stored twice, once per view.  The two lists are only ever
/// mutated together, so they always have the same length and the `i`'th 3D
/// trace has the same color as the `i`'th 2D trace.
#[derive(Clone, Debug, Default)]
pub struct TraceStore {
    traces_3d: Vec<Trace3>,
    traces_2d: Vec<Trace2>,
}

impl TraceStore {
    /// Builds an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Samples the field at `params.level` and freezes the result
    ///
    /// The trace color is derived once from the level (relative to `bounds`)
    /// and shared by both representations.  Returns the number of points in
    /// the new trace.
    pub fn add_trace<F: ScalarField + ?Sized>(
        &mut self,
        field: &F,
        params: &SliceParams,
        bounds: Bounds,
    ) -> usize {
        let points = sample(field, params);
        let color = Hsl::for_level(params.level, bounds.min, bounds.max);
        self.traces_3d.push(Trace {
            points: to_world_3d(&points, params.level),
            color,
            stroke_width: STROKE_3D,
        });
        self.traces_2d.push(Trace {
            points: to_world_2d(&points),
            color,
            stroke_width: STROKE_2D,
        });
        debug!(
            "froze slice at z = {:.3} ({} points, {} traces)",
            params.level,
            points.len(),
            self.len()
        );
        points.len()
    }

    /// Removes every trace from both lists
    pub fn clear(&mut self) {
        self.traces_3d.clear();
        self.traces_2d.clear();
    }

    /// Returns the number of frozen slices
    pub fn len(&self) -> usize {
        debug_assert_eq!(self.traces_3d.len(), self.traces_2d.len());
        self.traces_3d.len()
    }

    /// Checks whether the store is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the 3D traces, oldest first
    pub fn traces_3d(&self) -> &[Trace3] {
        &self.traces_3d
    }

    /// Returns the 2D traces, oldest first
    pub fn traces_2d(&self) -> &[Trace2] {
        &self.traces_2d
    }

    /// Iterates over matched `(3D, 2D)` trace pairs
    pub fn iter(&self) -> impl Iterator<Item = (&Trace3, &Trace2)> {
        self.traces_3d.iter().zip(&self.traces_2d)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn params(level: f64) -> SliceParams {
        SliceParams {
            level,
            grid_resolution: 20,
            span: 10.0,
            tolerance: 0.02,
        }
    }

    #[test]
    fn add_and_clear() {
        let f = |x: f64, y: f64| x * x + y * y;
        let bounds = Bounds::new(-5.0, 5.0);
        let mut store = TraceStore::new();
        assert!(store.is_empty());

        let n = store.add_trace(&f, &params(4.0), bounds);
        assert_eq!(n, 4);
        store.add_trace(&f, &params(-1.0), bounds);
        assert_eq!(store.len(), 2);
        assert_eq!(store.traces_3d().len(), store.traces_2d().len());

        let (t3, t2) = store.iter().next().unwrap();
        assert_eq!(t3.color(), t2.color());
        assert_eq!(t3.points().len(), t2.points().len());
        assert_eq!(t3.points()[0], Point3::new(-80.0, 0.0, 160.0));
        assert_eq!(t2.points()[0], Point2::new(-80.0, 0.0));
        assert_eq!(t3.stroke_width(), STROKE_3D);
        assert_eq!(t2.stroke_width(), STROKE_2D);

        // Empty slice is still a trace
        let (t3, _t2) = store.iter().nth(1).unwrap();
        assert!(t3.points().is_empty());

        store.clear();
        assert!(store.is_empty());
        assert!(store.traces_3d().is_empty());
        assert!(store.traces_2d().is_empty());
    }

    #[test]
    fn colors_follow_level() {
        let f = |x: f64, _y: f64| x;
        let bounds = Bounds::new(-5.0, 5.0);
        let mut store = TraceStore::new();
        store.add_trace(&f, &params(-5.0), bounds);
        store.add_trace(&f, &params(5.0), bounds);
        store.add_trace(&f, &params(50.0), bounds);
        let hues: Vec<f64> =
            store.traces_2d().iter().map(|t| t.color().h).collect();
        assert_eq!(hues, vec![220.0, 0.0, 0.0]);
    }
}
