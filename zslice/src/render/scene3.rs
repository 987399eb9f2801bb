use super::{
    AXIS_COLORS, AXIS_LENGTH, BACKGROUND_3D, DrawList, GRID_EXTENT, GRID_SPAN,
    PLANE_ALPHA, PointColors, Primitive, SCALE, Snapshot,
};
use crate::{
    color::{Hsl, map_hue},
    trace::to_world_3d,
    view::{OrbitCamera, Projector, ScreenSize},
};
use nalgebra::{Point2, Point3, Vector2, Vector3};

/// Hue of live-slice points at the origin
const LIVE_HUE_NEAR: f64 = 140.0;

/// Hue of live-slice points at the edge of the sampled square
const LIVE_HUE_FAR: f64 = 190.0;

/// Point diameter of the live slice, in pixels
pub const STROKE_LIVE: f32 = 4.0;

const GRID_COLOR: Hsl = Hsl::new(0.0, 0.0, 40.0).with_alpha(40.0);
const AXIS_WIDTH: f32 = 2.0;
const ARROW_RADIUS: f32 = 6.0;
const ARROW_HEIGHT: f32 = 12.0;

/// Distance that plane labels are pulled toward the camera
const LABEL_LIFT: f32 = 20.0;

/// Color of a live-slice point, based on its distance from the origin
pub fn live_color(p: &Point2<f64>, span: f64) -> Hsl {
    let hue = map_hue(p.x.hypot(p.y), 0.0, span, LIVE_HUE_NEAR, LIVE_HUE_FAR);
    Hsl::new(hue, 60.0, 70.0)
}

/// Perspective renderer for the 3D scene
///
/// Draws, back to front: background, reference grid, axes, frozen traces, the
/// live slice, then the translucent slice plane and its labels.  The plane is
/// drawn last and over everything, so its labels are never hidden.
#[derive(Copy, Clone, Debug, Default)]
pub struct Scene3 {
    camera: OrbitCamera,
}

impl Scene3 {
    /// Builds a renderer with the given camera
    pub fn new(camera: OrbitCamera) -> Self {
        Self { camera }
    }

    /// Borrows the camera
    pub fn camera(&self) -> &OrbitCamera {
        &self.camera
    }

    /// Mutably borrows the camera
    pub fn camera_mut(&mut self) -> &mut OrbitCamera {
        &mut self.camera
    }

    /// Draws a single frame
    pub fn draw(&self, snap: &Snapshot, size: ScreenSize) -> DrawList {
        let proj = self.camera.projector(size);
        let mut out = DrawList::new(size);
        out.fill(BACKGROUND_3D);

        self.draw_grid(&proj, &mut out);
        self.draw_axes(&proj, &mut out);

        for t in snap.traces.traces_3d() {
            let pts = t.points().iter().filter_map(|p| proj.project(p));
            out.points(
                pts.map(|p| p.pos).collect(),
                t.stroke_width(),
                PointColors::Uniform(t.color().to_rgba()),
            );
        }

        let world = to_world_3d(snap.live, snap.level);
        let (pts, colors): (Vec<_>, Vec<_>) = world
            .iter()
            .zip(snap.live)
            .filter_map(|(w, m)| {
                proj.project(w)
                    .map(|p| (p.pos, live_color(m, snap.span).to_rgba()))
            })
            .unzip();
        out.points(pts, STROKE_LIVE, PointColors::PerPoint(colors));

        self.draw_plane(snap, &proj, &mut out);
        out
    }

    fn draw_grid(&self, proj: &Projector, out: &mut DrawList) {
        let color = GRID_COLOR.to_rgba();
        for i in -GRID_SPAN..=GRID_SPAN {
            let v = i as f32 * SCALE;
            let e = GRID_EXTENT;
            for (a, b) in [
                (Point3::new(v, -e, 0.0), Point3::new(v, e, 0.0)),
                (Point3::new(-e, v, 0.0), Point3::new(e, v, 0.0)),
            ] {
                if let Some((a, b)) = proj.project_segment(&a, &b) {
                    out.line(a, b, 1.0, color);
                }
            }
        }
    }

    fn draw_axes(&self, proj: &Projector, out: &mut DrawList) {
        let axes = [
            (Vector3::<f32>::x(), "X", Vector2::new(12.0, 0.0)),
            (Vector3::y(), "Y", Vector2::new(0.0, 12.0)),
            (Vector3::z(), "Z", Vector2::new(0.0, 12.0)),
        ];
        for ((dir, name, offset), color) in axes.into_iter().zip(AXIS_COLORS) {
            let color = color.to_rgba();
            let tip = Point3::from(dir * AXIS_LENGTH);
            if let Some((a, b)) = proj.project_segment(&Point3::origin(), &tip)
            {
                out.line(a, b, AXIS_WIDTH, color);
            }

            // Cone arrowhead, drawn as its camera-facing silhouette
            let apex = Point3::from(dir * (AXIS_LENGTH + ARROW_HEIGHT / 2.0));
            let base = Point3::from(dir * (AXIS_LENGTH - ARROW_HEIGHT / 2.0));
            let side = dir
                .cross(&(self.camera.eye() - base))
                .try_normalize(f32::EPSILON)
                .map(|s| s * ARROW_RADIUS);
            if let Some(side) = side {
                let head: Option<Vec<_>> = [apex, base + side, base - side]
                    .iter()
                    .map(|p| proj.project(p).map(|p| p.pos))
                    .collect();
                if let Some(points) = head {
                    out.push(Primitive::Polygon { points, color });
                }
            }

            if let Some(p) = proj.project(&tip) {
                out.label(p.pos + offset, name, 17.0);
            }
        }
    }

    fn draw_plane(
        &self,
        snap: &Snapshot,
        proj: &Projector,
        out: &mut DrawList,
    ) {
        let z = snap.level as f32 * SCALE;
        let e = GRID_EXTENT;
        let quad = [
            Point3::new(-e, -e, z),
            Point3::new(e, -e, z),
            Point3::new(e, e, z),
            Point3::new(-e, e, z),
        ];
        let points = proj.project_polygon(&quad);
        if points.len() >= 3 {
            let color = Hsl::new(0.0, 0.0, 100.0).with_alpha(PLANE_ALPHA);
            out.push(Primitive::Polygon {
                points,
                color: color.to_rgba(),
            });
        }

        let anchor = self
            .camera
            .toward_eye(&Point3::new(0.0, 0.0, z), LABEL_LIFT);
        if let Some(p) = proj.project(&anchor) {
            let level = format!("{:.2}", snap.level);
            out.label(
                p.pos + Vector2::new(0.0, -18.0),
                format!("z = {level}"),
                14.0,
            );
            out.label(
                p.pos + Vector2::new(0.0, 4.0),
                format!("{} = {level}", snap.equation),
                14.0,
            );
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        animate::Bounds,
        render::BACKGROUND_3D,
        sample::SliceParams,
        trace::TraceStore,
    };

    fn snapshot<'a>(
        live: &'a [Point2<f64>],
        traces: &'a TraceStore,
    ) -> Snapshot<'a> {
        Snapshot {
            level: 4.0,
            bounds: Bounds::default(),
            span: 10.0,
            live,
            traces,
            equation: "x² + y²",
        }
    }

    #[test]
    fn live_color_by_distance() {
        assert_eq!(live_color(&Point2::origin(), 10.0).h, 140.0);
        assert_eq!(live_color(&Point2::new(6.0, 8.0), 10.0).h, 190.0);
        assert_eq!(live_color(&Point2::new(30.0, 0.0), 10.0).h, 190.0);
        assert_eq!(live_color(&Point2::new(0.0, 5.0), 10.0).h, 165.0);
    }

    #[test]
    fn draw_order() {
        let f = |x: f64, y: f64| x * x + y * y;
        let mut traces = TraceStore::new();
        let params = SliceParams {
            level: 4.0,
            grid_resolution: 20,
            span: 10.0,
            tolerance: 0.02,
        };
        traces.add_trace(&f, &params, Bounds::default());
        let live = crate::sample::sample(&f, &params);
        let snap = snapshot(&live, &traces);

        let scene = Scene3::default();
        let d = scene.draw(&snap, ScreenSize::new(800.0, 600.0));
        let prims = d.primitives();
        assert_eq!(prims[0], Primitive::Fill(BACKGROUND_3D));

        // Frozen trace, then live slice, then plane
        let points: Vec<usize> = prims
            .iter()
            .enumerate()
            .filter(|(_, p)| matches!(p, Primitive::Points { .. }))
            .map(|(i, _)| i)
            .collect();
        assert_eq!(points.len(), 2);
        let Primitive::Points {
            points: frozen,
            colors,
            diameter,
        } = &prims[points[0]]
        else {
            unreachable!()
        };
        assert_eq!(frozen.len(), 4);
        assert_eq!(*diameter, 5.0);
        assert_eq!(
            *colors,
            PointColors::Uniform(traces.traces_3d()[0].color().to_rgba())
        );
        let Primitive::Points { colors, .. } = &prims[points[1]] else {
            unreachable!()
        };
        assert!(matches!(colors, PointColors::PerPoint(c) if c.len() == 4));

        let plane = prims
            .iter()
            .rposition(|p| matches!(p, Primitive::Polygon { .. }))
            .unwrap();
        assert!(plane > points[1]);

        let texts: Vec<_> = d.texts().collect();
        assert!(texts.contains(&"X"));
        assert!(texts.contains(&"Y"));
        assert!(texts.contains(&"Z"));
        assert!(texts.contains(&"z = 4.00"));
        assert!(texts.contains(&"x² + y² = 4.00"));
    }

    #[test]
    fn empty_scene() {
        let traces = TraceStore::new();
        let snap = snapshot(&[], &traces);
        let d = Scene3::default().draw(&snap, ScreenSize::from(200));
        assert!(
            !d.primitives()
                .iter()
                .any(|p| matches!(p, Primitive::Points { .. }))
        );
    }
}
