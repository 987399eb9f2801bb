use eframe::egui;
use nalgebra::Point2;
use zslice::{
    color::Rgba,
    render::{Anchor, DrawList, Primitive},
};

fn color(c: Rgba) -> egui::Color32 {
    egui::Color32::from_rgba_unmultiplied(c.r(), c.g(), c.b(), c.a())
}

/// Paints a draw list into the given rectangle
pub(crate) fn paint(
    painter: &egui::Painter,
    rect: egui::Rect,
    list: &DrawList,
) {
    let at = |p: &Point2<f32>| rect.min + egui::vec2(p.x, p.y);
    for prim in list.primitives() {
        match prim {
            Primitive::Fill(c) => {
                painter.rect_filled(rect, 0.0, color(*c));
            }
            Primitive::Line {
                start,
                end,
                width,
                color: c,
            } => {
                painter.line_segment(
                    [at(start), at(end)],
                    egui::Stroke::new(*width, color(*c)),
                );
            }
            Primitive::Points {
                points,
                diameter,
                colors,
            } => {
                for (i, p) in points.iter().enumerate() {
                    painter.circle_filled(
                        at(p),
                        diameter / 2.0,
                        color(colors.get(i)),
                    );
                }
            }
            Primitive::Polygon { points, color: c } => {
                painter.add(egui::Shape::convex_polygon(
                    points.iter().map(at).collect(),
                    color(*c),
                    egui::Stroke::NONE,
                ));
            }
            Primitive::Text {
                pos,
                text,
                size,
                color: c,
                anchor,
                outline,
            } => {
                let align = match anchor {
                    Anchor::Center => egui::Align2::CENTER_CENTER,
                    Anchor::CenterTop => egui::Align2::CENTER_TOP,
                    Anchor::LeftCenter => egui::Align2::LEFT_CENTER,
                };
                let font = egui::FontId::proportional(*size);
                let pos = at(pos);
                if let Some(o) = outline {
                    // One-pixel outline from the eight neighbors
                    for dx in -1..=1 {
                        for dy in -1..=1 {
                            if dx != 0 || dy != 0 {
                                let d = egui::vec2(dx as f32, dy as f32);
                                painter.text(
                                    pos + d,
                                    align,
                                    text,
                                    font.clone(),
                                    color(*o),
                                );
                            }
                        }
                    }
                }
                painter.text(pos, align, text, font, color(*c));
            }
        }
    }
}
