//! Rasterizes draw lists with `tiny-skia`
//!
//! Text is not rasterized.
use anyhow::{Result, anyhow};
use image::RgbaImage;
use log::debug;
use nalgebra::Point2;
use tiny_skia::{
    FillRule, LineCap, Paint, PathBuilder, Pixmap, Stroke, Transform,
};
use zslice::{
    color::Rgba,
    render::{DrawList, PointColors, Primitive},
};

/// Draws every non-text primitive into a new image
pub(crate) fn rasterize(list: &DrawList) -> Result<RgbaImage> {
    let size = list.size();
    let (w, h) = (size.width.max(1.0) as u32, size.height.max(1.0) as u32);
    let mut pixmap = Pixmap::new(w, h)
        .ok_or_else(|| anyhow!("could not allocate a {w}×{h} image"))?;

    let mut skipped = 0;
    for prim in list.primitives() {
        match prim {
            Primitive::Fill(c) => {
                let c = *c;
                pixmap.fill(tiny_skia::Color::from_rgba8(
                    c.r(),
                    c.g(),
                    c.b(),
                    c.a(),
                ));
            }
            Primitive::Line {
                start,
                end,
                width,
                color,
            } => {
                let mut pb = PathBuilder::new();
                pb.move_to(start.x, start.y);
                pb.line_to(end.x, end.y);
                if let Some(path) = pb.finish() {
                    let stroke = Stroke {
                        width: *width,
                        line_cap: LineCap::Butt,
                        ..Stroke::default()
                    };
                    pixmap.stroke_path(
                        &path,
                        &paint(*color),
                        &stroke,
                        Transform::identity(),
                        None,
                    );
                }
            }
            Primitive::Points {
                points,
                diameter,
                colors,
            } => {
                let r = diameter / 2.0;
                match colors {
                    // One path for the whole batch
                    PointColors::Uniform(c) => {
                        dots(&mut pixmap, points.iter(), r, *c)
                    }
                    PointColors::PerPoint(..) => {
                        for (i, p) in points.iter().enumerate() {
                            dots(&mut pixmap, [p], r, colors.get(i));
                        }
                    }
                }
            }
            Primitive::Polygon { points, color } => {
                let mut pb = PathBuilder::new();
                let mut iter = points.iter();
                if let Some(p) = iter.next() {
                    pb.move_to(p.x, p.y);
                }
                for p in iter {
                    pb.line_to(p.x, p.y);
                }
                pb.close();
                if let Some(path) = pb.finish() {
                    pixmap.fill_path(
                        &path,
                        &paint(*color),
                        FillRule::Winding,
                        Transform::identity(),
                        None,
                    );
                }
            }
            Primitive::Text { .. } => skipped += 1,
        }
    }
    if skipped > 0 {
        debug!("skipped {skipped} text primitives");
    }

    // tiny-skia stores premultiplied colors, while `image` does not
    let data = pixmap
        .pixels()
        .iter()
        .flat_map(|p| {
            let c = p.demultiply();
            [c.red(), c.green(), c.blue(), c.alpha()]
        })
        .collect();
    RgbaImage::from_raw(w, h, data)
        .ok_or_else(|| anyhow!("image buffer has the wrong size"))
}

fn paint(c: Rgba) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color_rgba8(c.r(), c.g(), c.b(), c.a());
    paint.anti_alias = true;
    paint
}

/// Fills a circle of radius `r` around each point, all in one color
fn dots<'a, I>(pixmap: &mut Pixmap, points: I, r: f32, color: Rgba)
where
    I: IntoIterator<Item = &'a Point2<f32>>,
{
    let mut pb = PathBuilder::new();
    for p in points {
        pb.push_circle(p.x, p.y, r.max(0.5));
    }
    if let Some(path) = pb.finish() {
        pixmap.fill_path(
            &path,
            &paint(color),
            FillRule::Winding,
            Transform::identity(),
            None,
        );
    }
}
