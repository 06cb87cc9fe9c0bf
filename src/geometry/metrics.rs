//! Layout metrics (all in layout units, y growing downwards).

use crate::model::{Clef, ClefSign, Pitch, MAX_STAVES};

// ── Staff dimensions ────────────────────────────────────────────────
pub const STAFF_LINE_SPACING: f64 = 10.0; // distance between staff lines
pub const STAFF_HEIGHT: f64 = 40.0; // 5 lines, 4 spaces
pub const STAFF_DISTANCE: f64 = 60.0; // gap between staves of one part
pub const PART_MARGIN_TOP: f64 = 80.0; // room above the first staff
pub const PART_MARGIN_BOTTOM: f64 = 80.0; // room below the last staff

// ── Measure packing ─────────────────────────────────────────────────
pub const MEASURE_PADDING: f64 = 12.0;
pub const MIN_EVENT_WIDTH: f64 = 24.0;
pub const QUARTER_WIDTH: f64 = 40.0;
pub const EMPTY_MEASURE_WIDTH: f64 = 60.0;

// ── Prefix widths ───────────────────────────────────────────────────
pub const CLEF_WIDTH: f64 = 26.0;
pub const CLEF_SPACE: f64 = 32.0;
pub const KEY_ACCIDENTAL_SPACE: f64 = 10.0;
pub const TIME_SIG_WIDTH: f64 = 18.0;
pub const TIME_SIG_SPACE: f64 = 24.0;

// ── Note dimensions ─────────────────────────────────────────────────
pub const NOTE_WIDTH: f64 = 11.0;
pub const NOTE_HEIGHT: f64 = 10.0;
pub const STEM_LENGTH: f64 = 30.0;
pub const STEM_WIDTH: f64 = 1.2;
/// Horizontal extent of a stem carrying flags.
pub const STEM_FLAG_WIDTH: f64 = 8.0;
/// Horizontal extent of a stem without flags.
pub const STEM_NO_FLAG_WIDTH: f64 = 1.0;
pub const BEAM_THICKNESS: f64 = 4.0;
pub const ACCIDENTAL_WIDTH: f64 = 8.0;
pub const ACCIDENTAL_HEIGHT: f64 = 20.0;
pub const ACCIDENTAL_GAP: f64 = 2.0;
pub const DOT_SIZE: f64 = 4.0;
pub const DOT_GAP: f64 = 3.0;
pub const REST_WIDTH: f64 = 10.0;
pub const REST_HEIGHT: f64 = 28.0;

// ── Marks and directions ────────────────────────────────────────────
pub const ARTICULATION_SIZE: f64 = 8.0;
pub const FERMATA_WIDTH: f64 = 18.0;
pub const FERMATA_HEIGHT: f64 = 10.0;
pub const ORNAMENT_WIDTH: f64 = 16.0;
pub const ORNAMENT_HEIGHT: f64 = 10.0;
pub const MARK_GAP: f64 = 4.0;
pub const TEXT_CHAR_WIDTH: f64 = 7.0;
pub const TEXT_HEIGHT: f64 = 14.0;
pub const LYRIC_LINE_HEIGHT: f64 = 16.0;
pub const SIGN_WIDTH: f64 = 20.0; // segno / coda
pub const SIGN_HEIGHT: f64 = 24.0;
pub const PEDAL_WIDTH: f64 = 28.0;
pub const PEDAL_HEIGHT: f64 = 16.0;
pub const OCTAVE_SHIFT_HEIGHT: f64 = 14.0;
pub const WEDGE_LINE_WIDTH: f64 = 1.0;
pub const ENDING_HEIGHT: f64 = 16.0;
pub const DIRECTION_GAP: f64 = 10.0;

/// Per-part vertical metrics.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PartMetrics {
    pub staves: i32,
}

impl PartMetrics {
    pub fn new(staves: i32) -> Self {
        Self {
            staves: staves.clamp(1, MAX_STAVES),
        }
    }

    /// y-offset of the top line of `staff` (1-based) within the part.
    pub fn staff_origin(&self, staff: i32) -> f64 {
        let staff = staff.clamp(1, self.staves);
        PART_MARGIN_TOP + (staff - 1) as f64 * (STAFF_HEIGHT + STAFF_DISTANCE)
    }

    /// Height of the block spanning every staff of the part.
    pub fn staves_height(&self) -> f64 {
        self.staves as f64 * STAFF_HEIGHT + (self.staves - 1) as f64 * STAFF_DISTANCE
    }

    pub fn height(&self) -> f64 {
        PART_MARGIN_TOP + self.staves_height() + PART_MARGIN_BOTTOM
    }

    /// Symbols whose top edge is at or above this y are considered outside the staves.
    pub fn top_boundary(&self) -> f64 {
        self.staff_origin(1) - self.staves_height() / 2.0
    }

    /// Symbols whose bottom edge is at or below this y are considered outside the staves.
    pub fn bottom_boundary(&self) -> f64 {
        self.staff_origin(self.staves) + STAFF_HEIGHT + self.staves_height() / 2.0
    }
}

/// Vertical position of a pitch relative to the top line of its staff.
pub fn pitch_to_staff_y(pitch: &Pitch, clef: Option<&Clef>) -> f64 {
    let octave_change = f64::from(clef.and_then(|c| c.octave_change).unwrap_or(0));
    let note_position = f64::from(pitch.diatonic()) - octave_change * 7.0;

    let (ref_position, default_line) = match clef.map(|c| c.sign) {
        Some(ClefSign::F) => (3.0 * 7.0 + 3.0, 4), // F3
        Some(ClefSign::C) => (4.0 * 7.0, 3),       // C4
        _ => (4.0 * 7.0 + 4.0, 2),                 // G4
    };
    let line = f64::from(clef.map_or(default_line, |c| c.line));
    let ref_y = (5.0 - line) * STAFF_LINE_SPACING;

    let staff_steps = note_position - ref_position;
    ref_y - staff_steps * (STAFF_LINE_SPACING / 2.0)
}

/// Approximate width of a text run.
pub fn text_width(text: &str) -> f64 {
    text.chars().count() as f64 * TEXT_CHAR_WIDTH
}
