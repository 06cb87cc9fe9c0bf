//! Drawing of individual leaf geometries.
//!
//! Every function receives the geometry's frame already converted to page
//! coordinates.

use kurbo::{Point, Rect};

use crate::geometry::metrics::{STAFF_HEIGHT, STAFF_LINE_SPACING};
use crate::model::*;

use super::constants::*;
use super::svg_builder::SvgBuilder;

pub(super) fn draw_staff_lines(svg: &mut SvgBuilder, x1: f64, x2: f64, staff_y: f64) {
    for i in 0..5 {
        let y = staff_y + i as f64 * STAFF_LINE_SPACING;
        svg.line(x1, y, x2, y, STAFF_COLOR, STAFF_LINE_WIDTH);
    }
}

pub(super) fn draw_ledger_lines(svg: &mut SvgBuilder, x: f64, note_y: f64, staff_y: f64) {
    let top = staff_y;
    let bottom = staff_y + STAFF_HEIGHT;
    let (x1, x2) = (x - NOTEHEAD_RX - LEDGER_LINE_EXTEND, x + NOTEHEAD_RX + LEDGER_LINE_EXTEND);

    let mut y = top - STAFF_LINE_SPACING;
    while y >= note_y - 1.0 {
        svg.line(x1, y, x2, y, STAFF_COLOR, LEDGER_LINE_WIDTH);
        y -= STAFF_LINE_SPACING;
    }
    let mut y = bottom + STAFF_LINE_SPACING;
    while y <= note_y + 1.0 {
        svg.line(x1, y, x2, y, STAFF_COLOR, LEDGER_LINE_WIDTH);
        y += STAFF_LINE_SPACING;
    }
}

pub(super) fn is_filled(note_type: Option<&str>) -> bool {
    !matches!(note_type, Some("whole") | Some("half") | Some("breve"))
}

pub(super) fn draw_stem(svg: &mut SvgBuilder, frame: Rect, direction: Stem, flags: usize) {
    let up = direction == Stem::Up;
    let x = frame.min_x() + 0.5;
    svg.line(x, frame.min_y(), x, frame.max_y(), NOTE_COLOR, STEM_STROKE);

    for i in 0..flags {
        let step = i as f64 * 7.0;
        let (y0, y1) = if up {
            (frame.min_y() + step, frame.min_y() + step + 14.0)
        } else {
            (frame.max_y() - step, frame.max_y() - step - 14.0)
        };
        let d = format!(
            "M{:.1},{:.1} Q{:.1},{:.1} {:.1},{:.1}",
            x,
            y0,
            x + 9.0,
            (y0 + y1) / 2.0,
            x + 6.0,
            y1
        );
        svg.path(&d, "none", NOTE_COLOR, 1.6);
    }
}

pub(super) fn draw_beam(svg: &mut SvgBuilder, start: Point, stop: Point, levels: usize, up: bool) {
    let thickness = crate::geometry::metrics::BEAM_THICKNESS;
    for level in 0..levels {
        let offset = level as f64 * (thickness + 3.0) * if up { 1.0 } else { -1.0 };
        let half = thickness / 2.0 * if up { 1.0 } else { -1.0 };
        svg.beam_line(start.x, start.y + offset + half, stop.x, stop.y + offset + half, thickness);
    }
}

pub(super) fn draw_rest(svg: &mut SvgBuilder, frame: Rect, note: &Note) {
    let x = frame.center().x;
    let y = frame.center().y;
    match note.note_type.as_deref() {
        _ if note.measure_rest => svg.rect(x - 7.0, frame.min_y() + 4.0, 14.0, 5.0, REST_COLOR),
        Some("whole") | None => svg.rect(x - 7.0, frame.min_y() + 4.0, 14.0, 5.0, REST_COLOR),
        Some("half") => svg.rect(x - 7.0, y - 1.0, 14.0, 5.0, REST_COLOR),
        Some("quarter") => {
            let d = format!(
                "M{:.1},{:.1} l5,7 l-5,6 l5,7 q-6,-2 -3,6",
                x - 2.5,
                frame.min_y() + 1.0
            );
            svg.path(&d, "none", REST_COLOR, 2.0);
        }
        Some(_) => {
            // Eighth and shorter: one hook per beam level on a slanted stem.
            let hooks = note.flag_count().max(1);
            svg.line(x + 3.0, frame.min_y() + 4.0, x - 2.0, frame.max_y() - 2.0, REST_COLOR, 1.4);
            for i in 0..hooks {
                let hy = frame.min_y() + 5.0 + i as f64 * 7.0;
                svg.circle(x - 3.0, hy, 2.2, REST_COLOR);
            }
        }
    }
}

pub(super) fn draw_accidental(svg: &mut SvgBuilder, frame: Rect, accidental: &str) {
    let glyph = match accidental {
        "sharp" => "\u{266F}",
        "flat" => "\u{266D}",
        "natural" => "\u{266E}",
        "double-sharp" => "\u{1D12A}",
        "flat-flat" => "\u{1D12B}",
        _ => return,
    };
    let c = frame.center();
    svg.text(c.x, c.y + 5.0, glyph, 16.0, "normal", NOTE_COLOR, "middle");
}

pub(super) fn draw_clef(svg: &mut SvgBuilder, frame: Rect, clef: &Clef) {
    let staff_y = frame.min_y() + STAFF_LINE_SPACING;
    let x = frame.center().x;
    match clef.sign {
        ClefSign::G => {
            svg.text(x, staff_y + 32.0, "\u{1D11E}", 44.0, "normal", NOTE_COLOR, "middle");
            if clef.octave_change == Some(-1) {
                svg.text(x, staff_y + STAFF_HEIGHT + 16.0, "8", 9.0, "normal", STAFF_COLOR, "middle");
            }
        }
        ClefSign::F => svg.text(x, staff_y + 24.0, "\u{1D122}", 40.0, "normal", NOTE_COLOR, "middle"),
        ClefSign::C => {
            let line_y = staff_y + (5 - clef.line) as f64 * STAFF_LINE_SPACING;
            svg.text(x, line_y + 14.0, "\u{1D121}", 40.0, "normal", NOTE_COLOR, "middle");
        }
        ClefSign::Percussion => {
            svg.rect(x - 4.0, staff_y + 10.0, 3.0, 20.0, NOTE_COLOR);
            svg.rect(x + 2.0, staff_y + 10.0, 3.0, 20.0, NOTE_COLOR);
        }
        ClefSign::Tab => svg.text(x, staff_y + 26.0, "TAB", 11.0, "bold", NOTE_COLOR, "middle"),
        ClefSign::None | ClefSign::Jianpu => {}
    }
}

pub(super) fn draw_key(svg: &mut SvgBuilder, frame: Rect, key: &Key) {
    let glyph = if key.fifths > 0 { "\u{266F}" } else { "\u{266D}" };
    // Staff steps below the top line for each accidental (treble positions).
    const SHARPS: [f64; 7] = [0.0, 3.0, -1.0, 2.0, 5.0, 1.0, 4.0];
    const FLATS: [f64; 7] = [4.0, 1.0, 5.0, 2.0, 6.0, 3.0, 7.0];
    let positions = if key.fifths > 0 { &SHARPS } else { &FLATS };
    let count = key.fifths.unsigned_abs().min(7) as usize;
    let step = frame.width() / count.max(1) as f64;
    for (i, &pos) in positions.iter().take(count).enumerate() {
        let x = frame.min_x() + step * (i as f64 + 0.5);
        let y = frame.min_y() + pos * STAFF_LINE_SPACING / 2.0;
        svg.text(x, y + 5.0, glyph, 16.0, "normal", NOTE_COLOR, "middle");
    }
}

pub(super) fn draw_time(svg: &mut SvgBuilder, frame: Rect, time: &TimeSignature) {
    let x = frame.center().x;
    let top = frame.min_y();
    svg.text(x, top + 2.0 * STAFF_LINE_SPACING - 1.0, &time.beats.to_string(), 22.0, "bold", NOTE_COLOR, "middle");
    svg.text(x, top + 4.0 * STAFF_LINE_SPACING - 1.0, &time.beat_type.to_string(), 22.0, "bold", NOTE_COLOR, "middle");
}

pub(super) fn draw_dot(svg: &mut SvgBuilder, frame: Rect) {
    let c = frame.center();
    svg.circle(c.x, c.y, 1.8, NOTE_COLOR);
}

pub(super) fn draw_articulation(svg: &mut SvgBuilder, frame: Rect, articulation: ArticulationType) {
    let c = frame.center();
    match articulation {
        ArticulationType::Staccato => svg.circle(c.x, c.y, 1.5, NOTE_COLOR),
        ArticulationType::Staccatissimo | ArticulationType::Spiccato => {
            let d = format!("M{:.1},{:.1} L{:.1},{:.1} L{:.1},{:.1} Z", c.x - 2.0, frame.min_y(), c.x + 2.0, frame.min_y(), c.x, frame.max_y());
            svg.path(&d, NOTE_COLOR, "none", 0.0);
        }
        ArticulationType::Tenuto => svg.line(frame.min_x(), c.y, frame.max_x(), c.y, NOTE_COLOR, 1.4),
        ArticulationType::DetachedLegato => {
            svg.line(frame.min_x(), frame.min_y() + 2.0, frame.max_x(), frame.min_y() + 2.0, NOTE_COLOR, 1.4);
            svg.circle(c.x, frame.max_y() - 1.5, 1.5, NOTE_COLOR);
        }
        ArticulationType::Accent => {
            let d = format!(
                "M{:.1},{:.1} L{:.1},{:.1} L{:.1},{:.1}",
                frame.min_x(),
                frame.min_y(),
                frame.max_x(),
                c.y,
                frame.min_x(),
                frame.max_y()
            );
            svg.path(&d, "none", NOTE_COLOR, 1.2);
        }
        ArticulationType::StrongAccent => {
            let d = format!(
                "M{:.1},{:.1} L{:.1},{:.1} L{:.1},{:.1}",
                frame.min_x(),
                frame.max_y(),
                c.x,
                frame.min_y(),
                frame.max_x(),
                frame.max_y()
            );
            svg.path(&d, "none", NOTE_COLOR, 1.4);
        }
        ArticulationType::BreathMark => svg.text(c.x, frame.max_y(), ",", 14.0, "bold", NOTE_COLOR, "middle"),
        ArticulationType::Caesura => svg.text(c.x, frame.max_y(), "//", 12.0, "bold", NOTE_COLOR, "middle"),
        _ => svg.circle(c.x, c.y, 1.0, NOTE_COLOR),
    }
}

pub(super) fn draw_fermata(svg: &mut SvgBuilder, frame: Rect, inverted: bool) {
    let c = frame.center();
    let (base, peak) = if inverted {
        (frame.min_y(), frame.max_y() + 4.0)
    } else {
        (frame.max_y(), frame.min_y() - 4.0)
    };
    let d = format!(
        "M{:.1},{:.1} Q{:.1},{:.1} {:.1},{:.1}",
        frame.min_x(),
        base,
        c.x,
        peak,
        frame.max_x(),
        base
    );
    svg.path(&d, "none", NOTE_COLOR, 1.6);
    svg.circle(c.x, (base + c.y) / 2.0, 1.6, NOTE_COLOR);
}

pub(super) fn draw_ornament(svg: &mut SvgBuilder, frame: Rect, ornament: OrnamentType) {
    let c = frame.center();
    let glyph = match ornament {
        OrnamentType::TrillMark => "tr",
        OrnamentType::Mordent => "\u{1D194}",
        OrnamentType::InvertedMordent => "\u{1D193}",
        OrnamentType::Turn => "\u{1D197}",
        OrnamentType::InvertedTurn => "\u{1D198}",
    };
    svg.text(c.x, frame.max_y(), glyph, 12.0, "bold", NOTE_COLOR, "middle");
}

pub(super) fn draw_text(svg: &mut SvgBuilder, frame: Rect, text: &str, italic: bool) {
    if italic {
        svg.italic_text(frame.min_x(), frame.max_y() - 2.0, text, 12.0, DIRECTION_COLOR);
    } else {
        svg.text(frame.center().x, frame.max_y() - 2.0, text, 12.0, "normal", NOTE_COLOR, "middle");
    }
}

pub(super) fn draw_sign(svg: &mut SvgBuilder, frame: Rect, glyph: &str) {
    let c = frame.center();
    svg.text(c.x, frame.max_y() - 2.0, glyph, 22.0, "normal", NOTE_COLOR, "middle");
}

pub(super) fn draw_pedal(svg: &mut SvgBuilder, frame: Rect, pedal: PedalType) {
    let text = match pedal {
        PedalType::Start => "Ped.",
        PedalType::Change => "*Ped.",
        PedalType::Stop => "*",
        PedalType::Continue => return,
    };
    svg.italic_text(frame.min_x(), frame.max_y() - 2.0, text, 13.0, DIRECTION_COLOR);
}

pub(super) fn draw_octave_shift(svg: &mut SvgBuilder, frame: Rect, shift: OctaveShiftType, size: i32) {
    let label = match (size, shift) {
        (15, OctaveShiftType::Down) => "15ma",
        (15, _) => "15mb",
        (_, OctaveShiftType::Down) => "8va",
        _ => "8vb",
    };
    svg.italic_text(frame.min_x(), frame.max_y() - 2.0, label, 12.0, DIRECTION_COLOR);
    let y = if shift == OctaveShiftType::Down { frame.min_y() + 2.0 } else { frame.max_y() - 2.0 };
    svg.dashed_line(frame.min_x() + 24.0, y, frame.max_x(), y, DIRECTION_COLOR, 0.8);
    let hook = if shift == OctaveShiftType::Down { 6.0 } else { -6.0 };
    svg.line(frame.max_x(), y, frame.max_x(), y + hook, DIRECTION_COLOR, 0.8);
}

pub(super) fn draw_wedge(svg: &mut SvgBuilder, frame: Rect, wedge: WedgeType) {
    let c = frame.center();
    let (x_point, x_open) = match wedge {
        WedgeType::Diminuendo => (frame.max_x(), frame.min_x()),
        _ => (frame.min_x(), frame.max_x()),
    };
    svg.line(x_point, c.y, x_open, frame.min_y(), DIRECTION_COLOR, 1.0);
    svg.line(x_point, c.y, x_open, frame.max_y(), DIRECTION_COLOR, 1.0);
}

pub(super) fn draw_ending(svg: &mut SvgBuilder, frame: Rect, number: &str) {
    svg.line(frame.min_x(), frame.max_y(), frame.min_x(), frame.min_y(), BARLINE_COLOR, BARLINE_WIDTH);
    svg.line(frame.min_x(), frame.min_y(), frame.max_x(), frame.min_y(), BARLINE_COLOR, BARLINE_WIDTH);
    svg.text(frame.min_x() + 5.0, frame.min_y() + 11.0, &format!("{number}."), 10.0, "normal", BARLINE_COLOR, "start");
}

pub(super) fn draw_barline(svg: &mut SvgBuilder, frame: Rect, style: Option<&str>) {
    let (top, bottom) = (frame.min_y(), frame.max_y());
    let bx = frame.max_x();
    match style {
        Some("light-heavy") => {
            svg.line(bx - 5.0, top, bx - 5.0, bottom, BARLINE_COLOR, BARLINE_WIDTH);
            svg.line(bx - 1.5, top, bx - 1.5, bottom, BARLINE_COLOR, 3.0);
        }
        Some("light-light") => {
            svg.line(bx - 4.0, top, bx - 4.0, bottom, BARLINE_COLOR, BARLINE_WIDTH);
            svg.line(bx, top, bx, bottom, BARLINE_COLOR, BARLINE_WIDTH);
        }
        Some("heavy-light") => {
            svg.line(bx - 1.5, top, bx - 1.5, bottom, BARLINE_COLOR, 3.0);
            svg.line(bx + 3.0, top, bx + 3.0, bottom, BARLINE_COLOR, BARLINE_WIDTH);
        }
        Some("none") => {}
        _ => svg.line(bx, top, bx, bottom, BARLINE_COLOR, BARLINE_WIDTH),
    }
}
