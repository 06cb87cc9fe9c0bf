//! Tie and slur drawing (double-bezier filled shape).

use kurbo::{Point, Vec2};

use crate::geometry::TieGeometry;

use super::constants::*;
use super::svg_builder::SvgBuilder;

/// SVG path of a curve whose endpoints are given relative to `origin`.
///
/// The outer edge follows the curve's control points; the inner edge is
/// offset back toward the notes so the shape is thin at the ends and
/// thicker in the middle.
pub(super) fn curve_path(curve: &TieGeometry, origin: Vec2) -> String {
    let s = curve.start_location() + origin;
    let e = curve.stop_location() + origin;
    let (c1, c2) = curve.control_points();
    let (c1, c2) = (c1 + origin, c2 + origin);

    let dir = curve.direction();
    let ep = Vec2::new(0.0, -CURVE_ENDPOINT_THICKNESS * dir);
    let cp = Vec2::new(0.0, -CURVE_MID_THICKNESS * dir);

    let fmt = |p: Point| format!("{:.1},{:.1}", p.x, p.y);
    format!(
        "M{} C{} {} {} L{} C{} {} {} Z",
        fmt(s),
        fmt(c1),
        fmt(c2),
        fmt(e),
        fmt(e + ep),
        fmt(c2 + cp),
        fmt(c1 + cp),
        fmt(s + ep),
    )
}

pub(super) fn draw_curve(svg: &mut SvgBuilder, curve: &TieGeometry, origin: Vec2) {
    svg.path(&curve_path(curve, origin), NOTE_COLOR, "none", 0.0);
}
