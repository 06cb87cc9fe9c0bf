//! Draws a laid-out score as SVG.
//!
//! Layout happens in [`crate::layout`]; this module only walks the finished
//! geometry tree and turns every geometry into SVG elements at its root
//! frame, so whatever the collision resolver moved is drawn where it ended up.

mod constants;
mod curves;
mod svg_builder;
mod symbols;

use kurbo::{Rect, Vec2};

use crate::geometry::metrics::PartMetrics;
use crate::geometry::{GeometryData, GeometryId, GeometryKind, GeometryTree, GeometryVisitor};
use crate::layout::{layout_score, ScoreLayout};
use crate::model::*;
use crate::options::LayoutOptions;

use constants::*;
use svg_builder::{empty_svg, SvgBuilder};
use symbols::*;

// ═══════════════════════════════════════════════════════════════════════
// Public API
// ═══════════════════════════════════════════════════════════════════════

/// Lay out a parsed Score and render it into a complete SVG string.
///
/// `options.page_width` sets the SVG width in user units; the drawing is
/// scaled to fit. With `None` the SVG keeps the layout's natural width.
pub fn render_score_to_svg(score: &Score, options: &LayoutOptions) -> String {
    if score.parts.is_empty() {
        return empty_svg("No parts in score");
    }
    let layout = layout_score(score, options);
    render_layout(score, &layout, options)
}

/// Render an existing layout of `score`.
pub fn render_layout(score: &Score, layout: &ScoreLayout, options: &LayoutOptions) -> String {
    let tree = &layout.tree;
    let bounds = tree.root_frame(tree.root());
    let origin = Vec2::new(
        PAGE_MARGIN_LEFT - bounds.x0.min(0.0),
        PAGE_MARGIN_TOP + HEADER_HEIGHT - bounds.y0.min(0.0),
    );
    let width = origin.x + bounds.x1.max(0.0) + PAGE_MARGIN_RIGHT;
    let height = origin.y + bounds.y1.max(0.0) + PAGE_MARGIN_BOTTOM;

    let mut svg = SvgBuilder::new(width, height, options.page_width);
    svg.rect(0.0, 0.0, width, height, "white");
    render_header(&mut svg, score, width);

    for part in &layout.parts {
        render_staves(&mut svg, tree, part.part, origin);
    }

    let mut painter = Painter { svg, origin };
    tree.walk(tree.root(), &mut painter);
    painter.svg.build()
}

// ═══════════════════════════════════════════════════════════════════════
// Page furniture
// ═══════════════════════════════════════════════════════════════════════

fn render_header(svg: &mut SvgBuilder, score: &Score, width: f64) {
    if let Some(ref title) = score.title {
        svg.text(width / 2.0, PAGE_MARGIN_TOP + 22.0, title, 22.0, "bold", HEADER_COLOR, "middle");
    }
    if let Some(ref composer) = score.composer {
        svg.text(
            width - PAGE_MARGIN_RIGHT,
            PAGE_MARGIN_TOP + 55.0,
            composer,
            11.0,
            "normal",
            HEADER_COLOR,
            "end",
        );
    }
}

/// Staff lines of every staff of a part, plus the opening barline.
fn render_staves(svg: &mut SvgBuilder, tree: &GeometryTree, part: GeometryId, origin: Vec2) {
    let staves = match tree.node(part).data() {
        GeometryData::Part { staves, .. } => *staves,
        _ => return,
    };
    let metrics = PartMetrics::new(staves);
    let frame = tree.root_frame(part) + origin;
    for staff in 1..=metrics.staves {
        draw_staff_lines(svg, frame.min_x(), frame.max_x(), frame.min_y() + metrics.staff_origin(staff));
    }
    let top = frame.min_y() + metrics.staff_origin(1);
    let bottom = frame.min_y() + metrics.staff_origin(metrics.staves) + crate::geometry::metrics::STAFF_HEIGHT;
    svg.line(frame.min_x(), top, frame.min_x(), bottom, BARLINE_COLOR, BARLINE_WIDTH);
}

// ═══════════════════════════════════════════════════════════════════════
// Geometry walk
// ═══════════════════════════════════════════════════════════════════════

struct Painter {
    svg: SvgBuilder,
    /// Page position of the root's origin.
    origin: Vec2,
}

impl Painter {
    fn page_frame(&self, tree: &GeometryTree, id: GeometryId) -> Rect {
        tree.root_frame(id) + self.origin
    }

    /// Page y of the top line of the staff a chord is written on.
    fn staff_y(&self, tree: &GeometryTree, chord: GeometryId) -> Option<f64> {
        let staff = tree.node(chord).chord()?.staff;
        let part = tree.ancestor_of_kind(chord, GeometryKind::Part)?;
        let GeometryData::Part { staves, .. } = tree.node(part).data() else {
            return None;
        };
        let offset = tree.root_offset(part).y + self.origin.y;
        Some(offset + PartMetrics::new(*staves).staff_origin(staff))
    }
}

impl GeometryVisitor for Painter {
    fn visit_note(&mut self, tree: &GeometryTree, note: GeometryId) {
        let node = tree.node(note);
        let Some(data) = node.note() else {
            return;
        };
        let Some(parent) = node.parent() else {
            return;
        };
        let center = tree.convert_to_root(parent, node.location()) + self.origin;
        if let Some(staff_y) = self.staff_y(tree, parent) {
            draw_ledger_lines(&mut self.svg, center.x, center.y, staff_y);
        }
        self.svg.notehead(center.x, center.y, is_filled(data.note.note_type.as_deref()));
    }

    fn visit_leaf(&mut self, tree: &GeometryTree, leaf: GeometryId) {
        let frame = self.page_frame(tree, leaf);
        let svg = &mut self.svg;
        match (tree.kind(leaf), tree.node(leaf).data()) {
            (_, GeometryData::Stem { direction, flags }) => draw_stem(svg, frame, *direction, *flags),
            (_, GeometryData::Beam { start, stop, levels }) => {
                let local = tree.frame(leaf);
                let up = local.max_y() > start.y.max(stop.y) + 0.01;
                let offset = tree.parent(leaf).map_or(Vec2::ZERO, |p| tree.root_offset(p)) + self.origin;
                draw_beam(svg, *start + offset, *stop + offset, *levels, up);
            }
            (_, GeometryData::Rest(note)) => draw_rest(svg, frame, note),
            (_, GeometryData::Accidental(text)) => draw_accidental(svg, frame, text),
            (_, GeometryData::Dot) => draw_dot(svg, frame),
            (_, GeometryData::Tie(curve)) => {
                let offset = tree.parent(leaf).map_or(Vec2::ZERO, |p| tree.root_offset(p)) + self.origin;
                curves::draw_curve(svg, curve, offset);
            }
            (_, GeometryData::Clef(clef)) => draw_clef(svg, frame, clef),
            (_, GeometryData::Key(key)) => draw_key(svg, frame, key),
            (_, GeometryData::TimeSignature(time)) => draw_time(svg, frame, time),
            (_, GeometryData::Articulation(articulation)) => draw_articulation(svg, frame, *articulation),
            (_, GeometryData::Fermata { inverted }) => draw_fermata(svg, frame, *inverted),
            (_, GeometryData::Ornament(ornament)) => draw_ornament(svg, frame, *ornament),
            (GeometryKind::Words, GeometryData::Text(text)) => draw_text(svg, frame, text, true),
            (_, GeometryData::Text(text)) => draw_text(svg, frame, text, false),
            (GeometryKind::Segno, _) => draw_sign(svg, frame, "\u{1D10B}"),
            (GeometryKind::Coda, _) => draw_sign(svg, frame, "\u{1D10C}"),
            (_, GeometryData::Wedge { wedge_type, .. }) => draw_wedge(svg, frame, *wedge_type),
            (_, GeometryData::Pedal(pedal)) => draw_pedal(svg, frame, *pedal),
            (_, GeometryData::OctaveShift { shift_type, size }) => draw_octave_shift(svg, frame, *shift_type, *size),
            (_, GeometryData::Ending(number)) => draw_ending(svg, frame, number),
            (_, GeometryData::Barline(style)) => draw_barline(svg, frame, style.as_deref()),
            _ => {}
        }
    }
}
