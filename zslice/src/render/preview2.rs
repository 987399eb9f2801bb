use super::{
    AXIS_COLORS, Anchor, BACKGROUND_2D, DrawList, GRID_EXTENT, GRID_SPAN,
    PointColors, SCALE, Snapshot,
};
use crate::{
    color::{Hsl, Rgba},
    trace::{STROKE_2D, to_world_2d},
    view::{PreviewView, ScreenSize},
};
use nalgebra::{Matrix3, Point2, Vector2};

const GRID_COLOR: Hsl = Hsl::new(200.0, 0.0, 70.0).with_alpha(35.0);
const TICK_COLOR: Hsl = Hsl::new(180.0, 0.0, 80.0).with_alpha(60.0);
const TICK_LABEL_COLOR: Hsl = Hsl::new(180.0, 0.0, 90.0).with_alpha(60.0);
const READOUT_COLOR: Rgba = Rgba::hex(0xdcdcdc);

// Widths and lengths below are in screen pixels, so they stay constant as
// the preview zooms.
const GRID_WIDTH: f32 = 0.4;
const AXIS_WIDTH: f32 = 1.5;
const TICK_WIDTH: f32 = 0.8;
const TICK_LENGTH: f32 = 3.0;
const TICK_LABEL_SIZE: f32 = 7.0;
const TICK_LABEL_GAP: f32 = 4.0;

/// Top-down renderer for the 2D preview
///
/// Draws, back to front: background, grid, axes with integer tick labels,
/// frozen traces, the live slice, then a readout of the equation and level.
/// Lines and labels have a fixed on-screen size; traces scale with zoom.
#[derive(Copy, Clone, Debug, Default)]
pub struct Preview2 {
    view: PreviewView,
}

impl Preview2 {
    /// Builds a renderer with the given pan and zoom
    pub fn new(view: PreviewView) -> Self {
        Self { view }
    }

    /// Borrows the pan/zoom state
    pub fn view(&self) -> &PreviewView {
        &self.view
    }

    /// Mutably borrows the pan/zoom state
    pub fn view_mut(&mut self) -> &mut PreviewView {
        &mut self.view
    }

    /// Returns the on-screen diameter of trace points
    pub fn point_diameter(&self) -> f32 {
        (STROKE_2D * self.view.zoom()).max(1.0)
    }

    /// Draws a single frame
    pub fn draw(&self, snap: &Snapshot, size: ScreenSize) -> DrawList {
        let mat = self.view.world_to_screen(size);
        let mut out = DrawList::new(size);
        out.fill(BACKGROUND_2D);

        self.draw_grid(&mat, &mut out);

        let diameter = self.point_diameter();
        for t in snap.traces.traces_2d() {
            out.points(
                t.points().iter().map(|p| mat.transform_point(p)).collect(),
                diameter,
                PointColors::Uniform(t.color().to_rgba()),
            );
        }
        out.points(
            to_world_2d(snap.live)
                .iter()
                .map(|p| mat.transform_point(p))
                .collect(),
            diameter,
            PointColors::Uniform(snap.level_color().to_rgba()),
        );

        out.text(
            Point2::new(size.width / 2.0, 6.0),
            format!("{}  =  {:.2}", snap.equation, snap.level),
            14.0,
            READOUT_COLOR,
            Anchor::CenterTop,
        );
        out
    }

    fn draw_grid(&self, mat: &Matrix3<f32>, out: &mut DrawList) {
        let to_screen =
            |x: f32, y: f32| mat.transform_point(&Point2::new(x, y));
        let e = GRID_EXTENT;

        let color = GRID_COLOR.to_rgba();
        for i in -GRID_SPAN..=GRID_SPAN {
            let v = i as f32 * SCALE;
            out.line(to_screen(v, -e), to_screen(v, e), GRID_WIDTH, color);
            out.line(to_screen(-e, v), to_screen(e, v), GRID_WIDTH, color);
        }

        let [x_color, y_color, _] = AXIS_COLORS;
        out.line(
            to_screen(-e, 0.0),
            to_screen(e, 0.0),
            AXIS_WIDTH,
            x_color.to_rgba(),
        );
        out.line(
            to_screen(0.0, -e),
            to_screen(0.0, e),
            AXIS_WIDTH,
            y_color.to_rgba(),
        );

        let tick = TICK_COLOR.to_rgba();
        let label = TICK_LABEL_COLOR.to_rgba();
        let dx = Vector2::new(TICK_LENGTH, 0.0);
        let dy = Vector2::new(0.0, TICK_LENGTH);
        for i in -GRID_SPAN..=GRID_SPAN {
            let v = i as f32 * SCALE;

            let p = to_screen(v, 0.0);
            out.line(p - dy, p + dy, TICK_WIDTH, tick);
            let q = to_screen(0.0, v);
            out.line(q - dx, q + dx, TICK_WIDTH, tick);

            if i != 0 {
                out.text(
                    p + Vector2::new(0.0, TICK_LABEL_GAP),
                    i.to_string(),
                    TICK_LABEL_SIZE,
                    label,
                    Anchor::CenterTop,
                );
                out.text(
                    q + Vector2::new(TICK_LABEL_GAP, 0.0),
                    i.to_string(),
                    TICK_LABEL_SIZE,
                    label,
                    Anchor::LeftCenter,
                );
            }
        }
    }
}
