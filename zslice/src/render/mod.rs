//! Backend-independent drawing of the 3D scene and the 2D preview
//!
//! Renderers don't talk to a graphics API.  Each produces a [`DrawList`]: an
//! ordered list of screen-space [`Primitive`]s, painted back-to-front.  The
//! viewer hands these to `egui`'s painter; the CLI rasterizes them into an
//! image.
//!
//! Both renderers read the same [`Snapshot`], so the live slice is sampled
//! once per frame and every frozen trace has the same color in both views.
use crate::{
    animate::Bounds,
    color::{Hsl, Rgba},
    trace::TraceStore,
    view::ScreenSize,
};
use nalgebra::Point2;

mod preview2;
mod scene3;

pub use preview2::Preview2;
pub use scene3::Scene3;

/// Scene pixels per model unit
pub const SCALE: f32 = 40.0;

/// Half-width of the reference grid, in model units
pub const GRID_SPAN: i32 = 10;

/// Half-width of the reference grid, in scene pixels
pub const GRID_EXTENT: f32 = GRID_SPAN as f32 * SCALE;

/// Length of each axis arrow, in scene pixels
pub const AXIS_LENGTH: f32 = GRID_EXTENT * 1.2;

/// Opacity of the slice plane, in percent
pub const PLANE_ALPHA: f64 = 8.0;

/// Background of the 3D scene
pub const BACKGROUND_3D: Rgba = Rgba::hex(0x120016);

/// Background of the 2D preview
pub const BACKGROUND_2D: Rgba = Rgba::hex(0x111111);

/// Colors of the X, Y, and Z axes
pub const AXIS_COLORS: [Hsl; 3] = [
    Hsl::new(0.0, 100.0, 50.0),
    Hsl::new(120.0, 100.0, 50.0),
    Hsl::new(220.0, 100.0, 50.0),
];

/// Fill color of billboard labels
pub const LABEL_COLOR: Rgba = Rgba::hex(0xffb700);

/// Outline color of billboard labels
pub const LABEL_OUTLINE: Rgba = Rgba::hex(0x570075);

////////////////////////////////////////////////////////////////////////////////

/// Text alignment relative to its anchor position
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Anchor {
    /// Centered horizontally and vertically
    Center,
    /// Centered horizontally, top edge at the anchor
    CenterTop,
    /// Left edge at the anchor, centered vertically
    LeftCenter,
}

/// Colors for a batch of points
#[derive(Clone, Debug, PartialEq)]
pub enum PointColors {
    /// Every point has the same color
    Uniform(Rgba),
    /// One color per point
    PerPoint(Vec<Rgba>),
}

impl PointColors {
    /// Returns the color of the `i`'th point
    pub fn get(&self, i: usize) -> Rgba {
        match self {
            PointColors::Uniform(c) => *c,
            PointColors::PerPoint(cs) => cs[i],
        }
    }
}

/// A single screen-space drawing operation
#[derive(Clone, Debug, PartialEq)]
pub enum Primitive {
    /// Fills the whole surface
    Fill(Rgba),
    /// Straight line segment
    Line {
        /// Start position
        start: Point2<f32>,
        /// End position
        end: Point2<f32>,
        /// Line width, in pixels
        width: f32,
        /// Stroke color
        color: Rgba,
    },
    /// Round dots of equal size
    Points {
        /// Dot centers
        points: Vec<Point2<f32>>,
        /// Dot diameter, in pixels
        diameter: f32,
        /// Dot colors
        colors: PointColors,
    },
    /// Filled convex polygon
    Polygon {
        /// Vertices, in order
        points: Vec<Point2<f32>>,
        /// Fill color
        color: Rgba,
    },
    /// Single line of text
    Text {
        /// Anchor position
        pos: Point2<f32>,
        /// Text to draw
        text: String,
        /// Font size, in pixels
        size: f32,
        /// Fill color
        color: Rgba,
        /// Alignment relative to `pos`
        anchor: Anchor,
        /// Optional one-pixel outline color
        outline: Option<Rgba>,
    },
}

/// Ordered list of primitives for a single surface
#[derive(Clone, Debug, PartialEq)]
pub struct DrawList {
    size: ScreenSize,
    primitives: Vec<Primitive>,
}

impl DrawList {
    /// Builds an empty draw list
    pub fn new(size: ScreenSize) -> Self {
        Self {
            size,
            primitives: vec![],
        }
    }

    /// Returns the size of the target surface
    pub fn size(&self) -> ScreenSize {
        self.size
    }

    /// Returns the primitives, back to front
    pub fn primitives(&self) -> &[Primitive] {
        &self.primitives
    }

    /// Returns the number of primitives
    pub fn len(&self) -> usize {
        self.primitives.len()
    }

    /// Checks whether the list is empty
    pub fn is_empty(&self) -> bool {
        self.primitives.is_empty()
    }

    /// Appends a primitive
    pub fn push(&mut self, p: Primitive) {
        self.primitives.push(p);
    }

    pub(crate) fn fill(&mut self, color: Rgba) {
        self.push(Primitive::Fill(color));
    }

    pub(crate) fn line(
        &mut self,
        start: Point2<f32>,
        end: Point2<f32>,
        width: f32,
        color: Rgba,
    ) {
        self.push(Primitive::Line {
            start,
            end,
            width,
            color,
        });
    }

    /// Pushes a batch of points, skipping it if it's empty
    pub(crate) fn points(
        &mut self,
        points: Vec<Point2<f32>>,
        diameter: f32,
        colors: PointColors,
    ) {
        if !points.is_empty() {
            self.push(Primitive::Points {
                points,
                diameter,
                colors,
            });
        }
    }

    pub(crate) fn text(
        &mut self,
        pos: Point2<f32>,
        text: impl Into<String>,
        size: f32,
        color: Rgba,
        anchor: Anchor,
    ) {
        self.push(Primitive::Text {
            pos,
            text: text.into(),
            size,
            color,
            anchor,
            outline: None,
        });
    }

    /// Pushes centered text with the billboard label styling
    pub(crate) fn label(
        &mut self,
        pos: Point2<f32>,
        text: impl Into<String>,
        size: f32,
    ) {
        self.push(Primitive::Text {
            pos,
            text: text.into(),
            size,
            color: LABEL_COLOR,
            anchor: Anchor::Center,
            outline: Some(LABEL_OUTLINE),
        });
    }

    /// Iterates over every text primitive's string
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.primitives.iter().filter_map(|p| match p {
            Primitive::Text { text, .. } => Some(text.as_str()),
            _ => None,
        })
    }
}

////////////////////////////////////////////////////////////////////////////////

/// Read-only state shared by both renderers for a single frame
///
/// Built once per frame, after the level has been updated, so that both
/// views see the same level, bounds, and live slice.
#[derive(Copy, Clone, Debug)]
pub struct Snapshot<'a> {
    /// Current slice level
    pub level: f64,
    /// Current level bounds
    pub bounds: Bounds,
    /// Half-width of the sampled square, in model units
    pub span: f64,
    /// Live slice at `level`, in model units
    pub live: &'a [Point2<f64>],
    /// Frozen traces
    pub traces: &'a TraceStore,
    /// Equation text, already prettified
    pub equation: &'a str,
}

impl Snapshot<'_> {
    /// Color of a slice at the current level
    pub fn level_color(&self) -> Hsl {
        Hsl::for_level(self.level, self.bounds.min, self.bounds.max)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn draw_list_helpers() {
        let mut d = DrawList::new(ScreenSize::from(10));
        assert!(d.is_empty());
        d.fill(BACKGROUND_2D);
        d.points(vec![], 2.0, PointColors::Uniform(LABEL_COLOR));
        assert_eq!(d.len(), 1);
        d.label(Point2::new(1.0, 2.0), "X", 17.0);
        d.text(Point2::origin(), "1", 7.0, LABEL_COLOR, Anchor::CenterTop);
        assert_eq!(d.texts().collect::<Vec<_>>(), vec!["X", "1"]);
        assert_eq!(d.size(), ScreenSize::new(10.0, 10.0));
    }

    #[test]
    fn point_colors() {
        let c = PointColors::Uniform(BACKGROUND_3D);
        assert_eq!(c.get(100), BACKGROUND_3D);
        let c = PointColors::PerPoint(vec![BACKGROUND_2D, BACKGROUND_3D]);
        assert_eq!(c.get(1), BACKGROUND_3D);
    }
}
